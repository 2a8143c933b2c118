use crate::{
    file,
    syntax::{self, Syntax},
};
use log::debug;
use snafu::{ResultExt, Snafu};
use std::{
    mem,
    path::{Path, PathBuf},
};

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Buffer has no file name"))]
    NoFilename,
    #[snafu(display("{}", source))]
    FileError { source: file::Error },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub(crate) struct TextBuffer {
    filename: Option<PathBuf>,
    default_dir: Option<PathBuf>,
    syntax: &'static Syntax<'static>,
    rows: Vec<String>,
    is_dirty: bool,
}

impl TextBuffer {
    pub(crate) fn new() -> Self {
        let filename = None;
        let syntax = syntax::select(filename.as_ref());
        Self {
            filename,
            default_dir: None,
            syntax,
            rows: vec![],
            is_dirty: false,
        }
    }

    pub(crate) fn from_file(filename: impl Into<PathBuf>) -> file::Result<Self> {
        let filename = filename.into();
        let rows = file::read_lines(&filename)?;
        let mut buf = Self::new();
        buf.set_filename(Some(filename));
        buf.rows = rows;
        Ok(buf)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Returns `true` if the buffer holds no text at all; blank lines count as text.
    pub(crate) fn is_empty(&self) -> bool {
        match self.rows.as_slice() {
            [] => true,
            [row] => row.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn status(&self) -> Status {
        Status {
            filename: self.filename.as_ref().map(|p| p.as_ref()),
            lines: self.rows.len(),
            syntax: self.syntax,
        }
    }

    pub(crate) fn contents(&self) -> String {
        self.rows.join("\n")
    }

    pub(crate) fn save(&mut self) -> Result<usize> {
        let filename = self.filename.as_ref().ok_or(Error::NoFilename)?;
        let mut text = self.contents();
        if !self.rows.is_empty() {
            text.push('\n');
        }
        file::write_bytes(filename, text.as_bytes()).context(FileError)?;
        self.is_dirty = false;
        Ok(text.len())
    }

    pub(crate) fn filename(&self) -> Option<&Path> {
        self.filename.as_ref().map(|p| p.as_ref())
    }

    pub(crate) fn set_filename(&mut self, filename: Option<PathBuf>) {
        self.filename = filename;
        self.syntax = syntax::select(self.filename.as_ref());
    }

    pub(crate) fn syntax(&self) -> &'static Syntax<'static> {
        self.syntax
    }

    pub(crate) fn set_syntax(&mut self, syntax: &'static Syntax<'static>) {
        self.syntax = syntax;
    }

    /// Directory a save prompt starts in when the buffer has no file name yet.
    pub(crate) fn default_dir(&self) -> Option<&Path> {
        self.default_dir.as_ref().map(|p| p.as_ref())
    }

    pub(crate) fn set_default_dir(&mut self, dir: Option<PathBuf>) {
        self.default_dir = dir;
    }

    /// Starts a group of modifications that is kept only if [`Edit::commit`] is called.
    pub(crate) fn edit(&mut self) -> Edit<'_> {
        Edit {
            saved_rows: Some(self.rows.clone()),
            saved_dirty: self.is_dirty,
            buffer: self,
        }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct Status<'a> {
    pub(crate) filename: Option<&'a Path>,
    pub(crate) lines: usize,
    pub(crate) syntax: &'a Syntax<'a>,
}

/// A pending modification of a [`TextBuffer`].
///
/// Dropping an `Edit` without committing it restores the buffer as it was when the edit began.
#[derive(Debug)]
pub(crate) struct Edit<'a> {
    buffer: &'a mut TextBuffer,
    saved_rows: Option<Vec<String>>,
    saved_dirty: bool,
}

impl Edit<'_> {
    /// Inserts `s` at the start of row `y`, splitting it into rows at every `'\n'`.
    pub(crate) fn insert_str(&mut self, y: usize, s: &str) {
        let rows = &mut self.buffer.rows;
        if y >= rows.len() {
            rows.resize(y + 1, String::new());
        }

        let tail = mem::take(&mut rows[y]);
        let mut lines = s.split('\n').map(String::from).collect::<Vec<_>>();
        if let Some(last) = lines.last_mut() {
            last.push_str(&tail);
        }
        rows.splice(y..=y, lines);
        self.buffer.is_dirty = true;
    }

    pub(crate) fn commit(mut self) {
        self.saved_rows = None;
    }
}

impl Drop for Edit<'_> {
    fn drop(&mut self) {
        if let Some(rows) = self.saved_rows.take() {
            debug!("discarding uncommitted edit");
            self.buffer.rows = rows;
            self.buffer.is_dirty = self.saved_dirty;
        }
    }
}
