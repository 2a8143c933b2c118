use snafu::{Backtrace, ResultExt, Snafu};
use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Could not open file {}: {}", filename.display(), source))]
    Open {
        filename: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not read file {}: {}", filename.display(), source))]
    Read {
        filename: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not write file {}: {}", filename.display(), source))]
    Write {
        filename: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Reads a text file as a list of lines without their terminators.
pub(crate) fn read_lines(filename: impl AsRef<Path>) -> Result<Vec<String>> {
    let filename = filename.as_ref();
    let file = File::open(filename).with_context(|| Open {
        filename: filename.to_path_buf(),
    })?;

    BufReader::new(&file)
        .lines()
        .map(|line| {
            line.with_context(|| Read {
                filename: filename.to_path_buf(),
            })
        })
        .collect()
}

/// Reads the raw bytes of `filename`; decoding is left to the caller.
pub(crate) fn read_bytes(filename: impl AsRef<Path>) -> Result<Vec<u8>> {
    let filename = filename.as_ref();
    fs::read(filename).with_context(|| Read {
        filename: filename.to_path_buf(),
    })
}

/// Replaces the content of `filename` with `bytes` in a single write.
pub(crate) fn write_bytes(filename: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let filename = filename.as_ref();
    fs::write(filename, bytes).with_context(|| Write {
        filename: filename.to_path_buf(),
    })
}
