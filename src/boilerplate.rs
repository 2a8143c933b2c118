use uuid::Uuid;

const UUID_MARKER: &str = "%UUID%";

const TEMPLATE: &str = r#"{ "name": "${1:Syntax Name}",
  "scopeName": "source.${2:syntax_name}",
  "fileTypes": ["$3"],
  "patterns": [$0
  ],
  "uuid": "%UUID%"
}"#;

/// Returns the skeleton of a new JSON syntax definition.
///
/// The name, scope name, file types and patterns are left as tab stops; the `uuid` field
/// receives a freshly generated version 4 UUID on every call.
pub(crate) fn generate_boilerplate() -> String {
    TEMPLATE.replace(UUID_MARKER, &Uuid::new_v4().to_string())
}
