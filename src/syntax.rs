use std::path::Path;

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Syntax<'a> {
    pub(crate) filetype: &'a str,
    pub(crate) filematch: &'a [&'a str],
    /// Extension of the file a definition in this format is built into.
    pub(crate) target_ext: Option<&'a str>,
}

pub(crate) const DEFAULT: Syntax = Syntax {
    filetype: "plain text",
    filematch: &[],
    target_ext: None,
};

pub(crate) const JSON_TMLANGUAGE: Syntax = Syntax {
    filetype: "JSON-tmLanguage",
    filematch: &[".JSON-tmLanguage"],
    target_ext: Some("tmLanguage"),
};

pub(crate) const TMLANGUAGE: Syntax = Syntax {
    filetype: "tmLanguage",
    filematch: &[".tmLanguage"],
    target_ext: None,
};

const HLDB: &[Syntax] = &[JSON_TMLANGUAGE, TMLANGUAGE];

impl<'a> Syntax<'a> {
    pub(crate) fn matches(&self, filename: impl AsRef<Path>) -> bool {
        let filename = filename.as_ref();
        self.filematch
            .iter()
            .copied()
            .any(|suffix| has_file_ext(filename, suffix))
    }
}

pub(crate) fn select(filename: Option<impl AsRef<Path>>) -> &'static Syntax<'static> {
    select_from_hldb(filename).unwrap_or(&DEFAULT)
}

fn select_from_hldb(filename: Option<impl AsRef<Path>>) -> Option<&'static Syntax<'static>> {
    let filename = filename?;
    HLDB.iter().find(|syntax| syntax.matches(&filename))
}

/// Returns `true` if the file name of `filename` ends with `suffix` (e.g. `".JSON-tmLanguage"`).
///
/// Matching is case-sensitive and the suffix must include its leading dot. A file whose
/// whole name is the suffix (no stem) does not match.
pub(crate) fn has_file_ext(filename: impl AsRef<Path>, suffix: &str) -> bool {
    debug_assert!(suffix.starts_with('.'));
    let name = match filename.as_ref().file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return false,
    };
    name.len() > suffix.len() && name.ends_with(suffix)
}
