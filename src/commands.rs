//! The user-facing actions, each with its availability predicate.

use crate::{
    boilerplate,
    convert::{self, ConversionResult, PlistFormat},
    output_panel::{self, OutputPanel},
    snippet,
    syntax::{self, JSON_TMLANGUAGE},
    text_buffer::TextBuffer,
};
use log::{debug, info};
use snafu::{Backtrace, ResultExt, Snafu};
use std::{
    env, io,
    path::{Path, PathBuf},
};

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Could not resolve {}: {}", filename.display(), source))]
    Resolve {
        filename: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("{}", source))]
    ConvertError { source: convert::Error },
    #[snafu(display("{}", source))]
    OutputPanelError { source: output_panel::Error },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

fn boilerplate_text(raw: bool) -> String {
    let text = boilerplate::generate_boilerplate();
    if raw {
        text
    } else {
        snippet::expand(&text)
    }
}

fn prepare(buffer: &mut TextBuffer, default_dir: Option<PathBuf>) {
    buffer.set_default_dir(default_dir);
    buffer.set_syntax(&JSON_TMLANGUAGE);
}

/// Creates a new buffer holding the boilerplate of a syntax definition.
///
/// With `raw`, tab stops are left in place for a snippet engine to expand.
pub(crate) fn new_syntax_def(default_dir: Option<PathBuf>, raw: bool) -> TextBuffer {
    let mut buffer = TextBuffer::new();
    prepare(&mut buffer, default_dir);

    let mut edit = buffer.edit();
    edit.insert_str(0, &boilerplate_text(raw));
    edit.commit();

    buffer
}

pub(crate) fn new_syntax_def_from_buffer_enabled(buffer: &TextBuffer) -> bool {
    // Don't mess up a non-empty buffer.
    buffer.is_empty()
}

/// Fills an empty buffer with the boilerplate of a syntax definition.
///
/// Returns `false` without touching the buffer if it is not empty.
pub(crate) fn new_syntax_def_from_buffer(
    buffer: &mut TextBuffer,
    default_dir: Option<PathBuf>,
    raw: bool,
) -> bool {
    if !new_syntax_def_from_buffer_enabled(buffer) {
        info!("buffer is not empty; not inserting boilerplate");
        return false;
    }

    prepare(buffer, default_dir);
    let mut edit = buffer.edit();
    edit.insert_str(0, &boilerplate_text(raw));
    edit.commit();
    true
}

pub(crate) fn build_enabled(filename: impl AsRef<Path>) -> bool {
    JSON_TMLANGUAGE.matches(filename)
}

/// Builds the definition at `filename` and reports the outcome to `panel`.
///
/// Returns `None` if the file is not a buildable definition; the panel says so. The panel is
/// shown on every path, including when the conversion itself fails.
pub(crate) fn build(
    filename: impl AsRef<Path>,
    panel: &mut OutputPanel,
    format: PlistFormat,
) -> Result<Option<ConversionResult>> {
    let filename = absolute(filename.as_ref())?;
    let filename = filename.as_path();
    panel.clear();
    panel.set_base_dir(filename.parent().map(Path::to_path_buf));

    let res = if filename.exists() && build_enabled(filename) {
        match convert::convert(filename, format) {
            Ok(res) => {
                panel.append(res.to_string());
                Ok(Some(res))
            }
            Err(e) => {
                panel.append(format!("Error: '{}' {}", filename.display(), e));
                Err(e).context(ConvertError)
            }
        }
    } else {
        panel.append(format!(
            "Not a valid {} file. ({})",
            syntax::JSON_TMLANGUAGE.filetype,
            filename.display()
        ));
        Ok(None)
    };

    debug!("panel {}: {}", panel.name(), panel.content());
    panel.show().context(OutputPanelError)?;
    res
}

fn absolute(filename: &Path) -> Result<PathBuf> {
    if filename.is_absolute() {
        return Ok(filename.to_path_buf());
    }
    let cwd = env::current_dir().context(Resolve { filename })?;
    Ok(cwd.join(filename))
}
