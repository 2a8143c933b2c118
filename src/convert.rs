use crate::{file, syntax};
use log::{debug, info};
use plist::{Dictionary, Value as Plist};
use serde_json::Value as Json;
use snafu::{Backtrace, ResultExt, Snafu};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("File not found: {}", filename.display()))]
    NotFound {
        filename: PathBuf,
        backtrace: Backtrace,
    },
    #[snafu(display("Refusing to overwrite source file {}", filename.display()))]
    OutputIsInput {
        filename: PathBuf,
        backtrace: Backtrace,
    },
    #[snafu(display("{}", source))]
    FileError { source: file::Error },
    #[snafu(display("Cannot represent null in a property list (at {:?} in {})", pointer, filename.display()))]
    Unrepresentable {
        filename: PathBuf,
        pointer: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not encode property list for {}: {}", filename.display(), source))]
    Serialize {
        filename: PathBuf,
        source: plist::Error,
        backtrace: Backtrace,
    },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

const DEFAULT_TARGET_EXT: &str = "tmLanguage";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum PlistFormat {
    Xml,
    Binary,
}

impl Default for PlistFormat {
    fn default() -> Self {
        Self::Xml
    }
}

impl FromStr for PlistFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Self::Xml),
            "binary" => Ok(Self::Binary),
            _ => Err(format!("unknown plist format `{}` (expected xml or binary)", s)),
        }
    }
}

/// Position of a syntax error in the source text, both 1-based.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Location {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum ConversionResult {
    Success {
        output: PathBuf,
    },
    Failure {
        input: PathBuf,
        message: String,
        location: Option<Location>,
    },
}

impl ConversionResult {
    pub(crate) fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { output } => write!(f, "Writing tmLanguage... ({})", output.display()),
            Self::Failure {
                input,
                message,
                location,
            } => {
                write!(f, "Error: '{}' {}", input.display(), message)?;
                if let Some(loc) = location {
                    write!(f, " line {} column {}", loc.line, loc.column)?;
                }
                Ok(())
            }
        }
    }
}

/// Returns the sibling path a definition at `input` is built into.
///
/// The final extension is replaced with the target extension of the definition's format, or
/// with `tmLanguage` if the format is unknown.
pub(crate) fn output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();
    let target_ext = syntax::select(Some(input))
        .target_ext
        .unwrap_or(DEFAULT_TARGET_EXT);
    input.with_extension(target_ext)
}

/// Converts the JSON syntax definition at `input` into a property list next to it.
///
/// Malformed JSON is reported as a [`ConversionResult::Failure`]; no output file is written
/// in that case. Any existing output file is overwritten.
pub(crate) fn convert(input: impl AsRef<Path>, format: PlistFormat) -> Result<ConversionResult> {
    let input = input.as_ref();
    if !input.is_file() {
        return NotFound { filename: input }.fail();
    }

    let output = output_path(input);
    if output == input {
        return OutputIsInput { filename: input }.fail();
    }
    debug!("converting {} into {}", input.display(), output.display());

    let text = file::read_bytes(input).context(FileError)?;
    // Undecodable input is a syntax error at its position, not a read failure.
    let json = match serde_json::from_slice::<Json>(&text) {
        Ok(json) => json,
        Err(e) => {
            info!("malformed JSON in {}: {}", input.display(), e);
            return Ok(failure(input, &e));
        }
    };

    let plist = match to_plist(&json, &mut String::new()) {
        Ok(plist) => plist,
        Err(pointer) => {
            return Unrepresentable {
                filename: input,
                pointer,
            }
            .fail()
        }
    };

    let mut bytes = vec![];
    match format {
        PlistFormat::Xml => plist.to_writer_xml(&mut bytes),
        PlistFormat::Binary => plist.to_writer_binary(&mut bytes),
    }
    .context(Serialize { filename: &output })?;

    file::write_bytes(&output, &bytes).context(FileError)?;
    info!("wrote {} bytes to {}", bytes.len(), output.display());

    Ok(ConversionResult::Success { output })
}

fn failure(input: &Path, e: &serde_json::Error) -> ConversionResult {
    // Location-less errors (I/O) report line 0.
    let location = if e.line() > 0 {
        Some(Location {
            line: e.line(),
            column: e.column(),
        })
    } else {
        None
    };

    // serde_json appends " at line L column C" to the message; keep the bare message.
    let mut message = e.to_string();
    if let Some(loc) = location {
        let suffix = format!(" at line {} column {}", loc.line, loc.column);
        if message.ends_with(&suffix) {
            message.truncate(message.len() - suffix.len());
        }
    }

    ConversionResult::Failure {
        input: input.to_path_buf(),
        message,
        location,
    }
}

/// Maps a JSON value onto a property list value. On failure, returns the JSON pointer of the
/// first `null` found.
fn to_plist(json: &Json, pointer: &mut String) -> std::result::Result<Plist, String> {
    let plist = match json {
        Json::Null => return Err(pointer.clone()),
        Json::Bool(b) => Plist::Boolean(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Plist::Integer(i.into())
            } else if let Some(u) = n.as_u64() {
                Plist::Integer(u.into())
            } else {
                Plist::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Plist::String(s.clone()),
        Json::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push_str(&format!("/{}", idx));
                array.push(to_plist(item, pointer)?);
                pointer.truncate(len);
            }
            Plist::Array(array)
        }
        Json::Object(map) => {
            let mut dict = Dictionary::new();
            for (key, item) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                dict.insert(key.clone(), to_plist(item, pointer)?);
                pointer.truncate(len);
            }
            Plist::Dictionary(dict)
        }
    };
    Ok(plist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;
    use std::fs;

    const FIXED_UUID: &str = "3b0c0b7e-8d6f-4b5e-9f0a-2a3d1c4e5f60";

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn test_grammar() -> String {
        format!(
            r#"{{ "name": "Test",
  "scopeName": "source.test",
  "fileTypes": ["test"],
  "patterns": [],
  "uuid": "{}"
}}"#,
            FIXED_UUID
        )
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            output_path("a/b/Test.JSON-tmLanguage"),
            Path::new("a/b/Test.tmLanguage")
        );
        assert_eq!(output_path("Foo.bar.JSON-tmLanguage"), Path::new("Foo.bar.tmLanguage"));
        assert_eq!(output_path("Test.json"), Path::new("Test.tmLanguage"));
        assert_eq!(output_path("Test"), Path::new("Test.tmLanguage"));
    }

    #[test]
    fn converts_well_formed_definition() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Test.JSON-tmLanguage", &test_grammar());

        let res = convert(&input, PlistFormat::Xml).unwrap();
        let output = dir.path().join("Test.tmLanguage");
        assert_eq!(
            res,
            ConversionResult::Success {
                output: output.clone()
            }
        );
        assert_eq!(
            res.to_string(),
            format!("Writing tmLanguage... ({})", output.display())
        );

        let plist = Plist::from_file(&output).unwrap();
        let dict = plist.as_dictionary().unwrap();
        assert_eq!(dict.len(), 5);
        assert_eq!(dict.get("name").and_then(Plist::as_string), Some("Test"));
        assert_eq!(
            dict.get("scopeName").and_then(Plist::as_string),
            Some("source.test")
        );
        assert_eq!(
            dict.get("fileTypes").and_then(Plist::as_array),
            Some(&vec![Plist::String("test".into())])
        );
        assert_eq!(
            dict.get("patterns").and_then(Plist::as_array).map(Vec::len),
            Some(0)
        );
        assert_eq!(dict.get("uuid").and_then(Plist::as_string), Some(FIXED_UUID));

        // the source is left untouched
        assert_eq!(fs::read_to_string(&input).unwrap(), test_grammar());
    }

    #[test]
    fn scalar_types() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "Types.JSON-tmLanguage",
            r#"{"b": true, "i": -3, "u": 18446744073709551615, "f": 1.5, "nested": [{"x": "y"}]}"#,
        );

        convert(&input, PlistFormat::Binary).unwrap();
        let plist = Plist::from_file(dir.path().join("Types.tmLanguage")).unwrap();
        let dict = plist.as_dictionary().unwrap();
        assert_eq!(dict.get("b").and_then(Plist::as_boolean), Some(true));
        assert_eq!(dict.get("i").and_then(Plist::as_signed_integer), Some(-3));
        assert_eq!(
            dict.get("u").and_then(Plist::as_unsigned_integer),
            Some(u64::max_value())
        );
        assert_eq!(dict.get("f").and_then(Plist::as_real), Some(1.5));
        let nested = dict.get("nested").and_then(Plist::as_array).unwrap();
        assert_eq!(
            nested[0]
                .as_dictionary()
                .and_then(|d| d.get("x"))
                .and_then(Plist::as_string),
            Some("y")
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Order.JSON-tmLanguage", r#"{"z": 1, "a": 2, "m": 3}"#);

        convert(&input, PlistFormat::Xml).unwrap();
        let plist = Plist::from_file(dir.path().join("Order.tmLanguage")).unwrap();
        let keys = plist.as_dictionary().unwrap().keys().cloned().collect::<Vec<_>>();
        itertools::assert_equal(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn malformed_json_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Bad.JSON-tmLanguage", "{\n  \"a\": ,\n}");

        let res = convert(&input, PlistFormat::Xml).unwrap();
        assert!(!res.is_success());
        match &res {
            ConversionResult::Failure {
                input: path,
                message,
                location,
            } => {
                assert_eq!(path, &input);
                assert!(!message.is_empty());
                assert!(!message.contains("line"));
                assert_matches!(location, Some(Location { line: 2, .. }));
            }
            ConversionResult::Success { .. } => unreachable!(),
        }
        assert!(res.to_string().starts_with(&format!("Error: '{}' ", input.display())));
        assert!(res.to_string().contains(" line 2 column "));
        assert!(!dir.path().join("Bad.tmLanguage").exists());
    }

    #[test]
    fn malformed_json_on_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Bad.JSON-tmLanguage", r#"{"name": }"#);

        let res = convert(&input, PlistFormat::Xml).unwrap();
        assert_matches!(
            res,
            ConversionResult::Failure {
                location: Some(Location { line: 1, .. }),
                ..
            }
        );
        assert!(!dir.path().join("Bad.tmLanguage").exists());
    }

    #[test]
    fn invalid_utf8_is_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Latin1.JSON-tmLanguage");
        fs::write(&input, b"{\"name\": \"\xff\"}").unwrap();

        let res = convert(&input, PlistFormat::Xml).unwrap();
        assert_matches!(
            res,
            ConversionResult::Failure {
                location: Some(Location { line: 1, .. }),
                ..
            }
        );
        assert!(!dir.path().join("Latin1.tmLanguage").exists());
    }

    #[test]
    fn malformed_json_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Test.JSON-tmLanguage", &test_grammar());
        convert(&input, PlistFormat::Xml).unwrap();
        let output = dir.path().join("Test.tmLanguage");
        let before = fs::read(&output).unwrap();

        fs::write(&input, "{").unwrap();
        assert!(!convert(&input, PlistFormat::Xml).unwrap().is_success());
        assert_eq!(fs::read(&output).unwrap(), before);
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Missing.JSON-tmLanguage");

        assert_matches!(convert(&input, PlistFormat::Xml), Err(Error::NotFound { .. }));
        assert!(!dir.path().join("Missing.tmLanguage").exists());
    }

    #[test]
    fn refuses_to_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "Test.tmLanguage", "{}");

        assert_matches!(
            convert(&input, PlistFormat::Xml),
            Err(Error::OutputIsInput { .. })
        );
        assert_eq!(fs::read_to_string(&input).unwrap(), "{}");
    }

    #[test]
    fn null_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "Null.JSON-tmLanguage",
            r#"{"patterns": [{"a/b": null}]}"#,
        );

        match convert(&input, PlistFormat::Xml) {
            Err(Error::Unrepresentable { pointer, .. }) => assert_eq!(pointer, "/patterns/0/a~1b"),
            res => panic!("unexpected result: {:?}", res),
        }
        assert!(!dir.path().join("Null.tmLanguage").exists());
    }

    #[test]
    fn conversion_is_deterministic() {
        for &format in &[PlistFormat::Xml, PlistFormat::Binary] {
            let dir = tempfile::tempdir().unwrap();
            let input = write(dir.path(), "Test.JSON-tmLanguage", &test_grammar());
            let output = dir.path().join("Test.tmLanguage");

            convert(&input, format).unwrap();
            let first = fs::read(&output).unwrap();
            convert(&input, format).unwrap();
            let second = fs::read(&output).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn plist_format_from_str() {
        assert_eq!("xml".parse::<PlistFormat>(), Ok(PlistFormat::Xml));
        assert_eq!("binary".parse::<PlistFormat>(), Ok(PlistFormat::Binary));
        assert!("XML".parse::<PlistFormat>().is_err());
        assert_eq!(PlistFormat::default(), PlistFormat::Xml);
    }
}
