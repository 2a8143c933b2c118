use derivative::Derivative;
use regex::Regex;
use snafu::{Backtrace, ResultExt, Snafu};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Invalid result file pattern {:?}: {}", pattern, source))]
    Pattern {
        pattern: String,
        source: regex::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not show output panel {}: {}", name, source))]
    Show {
        name: String,
        source: io::Error,
        backtrace: Backtrace,
    },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Matches the `Error: '<file>' <message> line <L> column <C>` lines written by a failed build.
pub(crate) const RESULT_FILE_REGEX: &str = r"Error:\s+'(.*?)'\s+.*?\s+line\s+(\d+)\s+column\s+(\d+)";

/// A location referenced by a line of the panel.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct ResultLocation {
    pub(crate) file: PathBuf,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

/// The named surface build results are reported to.
///
/// Create one per session and pass it to every build; its content is replaced by each build
/// and written out by [`OutputPanel::show`].
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct OutputPanel {
    name: String,
    base_dir: Option<PathBuf>,
    result_file_regex: Regex,
    lines: Vec<String>,
    #[derivative(Debug = "ignore")]
    writer: Box<dyn Write>,
}

impl OutputPanel {
    pub(crate) fn new(name: impl Into<String>, writer: Box<dyn Write>) -> Result<Self> {
        Self::with_result_file_regex(name, writer, RESULT_FILE_REGEX)
    }

    pub(crate) fn with_result_file_regex(
        name: impl Into<String>,
        writer: Box<dyn Write>,
        pattern: &str,
    ) -> Result<Self> {
        let result_file_regex = Regex::new(pattern).context(Pattern { pattern })?;
        Ok(Self {
            name: name.into(),
            base_dir: None,
            result_file_regex,
            lines: vec![],
            writer,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Directory relative result file names are resolved against.
    pub(crate) fn set_base_dir(&mut self, dir: Option<PathBuf>) {
        self.base_dir = dir;
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    pub(crate) fn append(&mut self, message: impl Into<String>) {
        self.lines.push(message.into());
    }

    pub(crate) fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn results(&self) -> Vec<ResultLocation> {
        self.lines
            .iter()
            .filter_map(|line| self.result_file_regex.captures(line))
            .filter_map(|caps| {
                let file = Path::new(caps.get(1)?.as_str());
                let file = match &self.base_dir {
                    Some(base) if file.is_relative() => base.join(file),
                    _ => file.to_path_buf(),
                };
                Some(ResultLocation {
                    file,
                    line: caps.get(2)?.as_str().parse().ok()?,
                    column: caps.get(3)?.as_str().parse().ok()?,
                })
            })
            .collect()
    }

    /// Writes the current content to the panel's writer.
    pub(crate) fn show(&mut self) -> Result<()> {
        let name = &self.name;
        for line in &self.lines {
            writeln!(self.writer, "{}", line).with_context(|| Show { name })?;
        }
        self.writer.flush().with_context(|| Show { name })?;
        Ok(())
    }
}
