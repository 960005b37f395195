//! JSON schema documents.
//!
//! A document declares the same things the builder API does, with transforms
//! and value mappers picked from a fixed set of built-ins:
//!
//! ```json
//! {
//!   "banner": "Usage: deploy (options)",
//!   "options": {
//!     "level": { "short": "-l LEVEL", "in": ["debug", "info"], "default": "info" },
//!     "tag": { "long": "--tag TAG", "transform": "append" }
//!   },
//!   "deprecated-options": {
//!     "verbose": { "short": "-v", "boolean": true, "replacement": "level",
//!                  "value-mapper": { "map": { "true": "debug" } }, "keep": false }
//!   }
//! }
//! ```

use crate::deprecation::DeprecatedOption;
use crate::error::{Error, Result};
use crate::formatter::display_value;
use crate::schema::{validate_name, Schema};
use crate::spec::{OptionSpec, Placement, Transform, ValueMapper};
use crate::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,

    /// Program name for the default banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub separate_defaults: bool,

    /// Kept loose so a non-object can be reported as a bad argument rather
    /// than a parse error.
    #[serde(default = "empty_object")]
    pub options: Value,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub deprecated_options: IndexMap<String, DeprecatedDocument>,
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self {
            banner: None,
            program: None,
            separate_defaults: false,
            options: empty_object(),
            deprecated_options: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub boolean: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub show_options: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<BuiltinTransform>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeprecatedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub boolean: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_mapper: Option<MapperDocument>,

    #[serde(default = "default_keep")]
    pub keep: bool,
}

/// Named transforms usable from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinTransform {
    Identity,
    /// Parse a decimal integer; unparsable input is stored as given.
    Integer,
    Float,
    Downcase,
    Upcase,
    /// Split on commas into a list of strings.
    Split,
    /// Flip a boolean.
    Negate,
    /// Reducer: collect every occurrence into a list.
    Append,
    /// Reducer: count occurrences.
    Count,
}

impl BuiltinTransform {
    pub fn is_reducer(self) -> bool {
        matches!(self, Self::Append | Self::Count)
    }

    pub fn into_transform(self) -> Transform {
        match self {
            Self::Append => Transform::reducer(|value, current| {
                let mut list = match current {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                list.push(value);
                Value::Array(list)
            }),
            Self::Count => Transform::reducer(|_, current| {
                let seen = current.and_then(Value::as_u64).unwrap_or(0);
                Value::from(seen + 1)
            }),
            other => Transform::value(move |value| other.apply_value(value)),
        }
    }

    fn apply_value(self, value: Value) -> Value {
        match (self, &value) {
            (Self::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(value),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(value),
            (Self::Downcase, Value::String(s)) => Value::String(s.to_lowercase()),
            (Self::Upcase, Value::String(s)) => Value::String(s.to_uppercase()),
            (Self::Split, Value::String(s)) => {
                Value::Array(s.split(',').map(Value::from).collect())
            }
            (Self::Negate, Value::Bool(b)) => Value::Bool(!b),
            _ => value,
        }
    }
}

/// A value mapper: a built-in value transform, or a lookup table keyed by the
/// displayed form of the old value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapperDocument {
    Builtin(BuiltinTransform),
    Table { map: IndexMap<String, Value> },
}

impl MapperDocument {
    pub fn into_mapper(self) -> Result<ValueMapper> {
        match self {
            Self::Builtin(builtin) if builtin.is_reducer() => Err(Error::InvalidArgument(format!(
                "{builtin:?} accumulates values and cannot be used as a value mapper"
            ))),
            Self::Builtin(builtin) => Ok(ValueMapper::new(move |v| builtin.apply_value(v))),
            Self::Table { map } => Ok(ValueMapper::new(move |v| {
                map.get(&display_value(&v)).cloned().unwrap_or(v)
            })),
        }
    }
}

impl SchemaDocument {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a schema. Regular options are declared first, in document order,
    /// then deprecated ones.
    pub fn into_schema(self) -> Result<Schema> {
        let entries = match self.options {
            Value::Object(entries) => entries,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "options must be an object, got {other}"
                )));
            }
        };

        let mut schema = Schema::new();
        if let Some(program) = self.program {
            schema.set_program_name(program);
        }
        if let Some(banner) = self.banner {
            schema.set_banner(banner);
        }
        schema.use_separate_default_options(self.separate_defaults);

        for (name, entry) in entries {
            validate_name(&name)?;
            let doc: OptionDocument = serde_json::from_value(entry)?;
            schema.option(&name, doc.into_spec()?)?;
        }
        for (name, doc) in self.deprecated_options {
            schema.deprecated_option(&name, doc.into_declaration()?)?;
        }

        debug!(options = schema.len(), "loaded schema document");
        Ok(schema)
    }
}

impl OptionDocument {
    pub fn into_spec(self) -> Result<OptionSpec> {
        let allowed = match self.allowed {
            None => None,
            Some(Value::Array(values)) => Some(values),
            Some(other) => {
                return Err(Error::InvalidArgument(format!(
                    "in must be an array, got {other}"
                )));
            }
        };
        let on = match self.on.as_deref() {
            Some(name) => name.parse::<Placement>()?,
            None => Placement::Normal,
        };

        Ok(OptionSpec {
            short: self.short,
            long: self.long,
            description: self.description,
            default: self.default,
            boolean: self.boolean,
            required: self.required,
            transform: self.transform.map(BuiltinTransform::into_transform),
            show_options: self.show_options,
            exit: self.exit,
            allowed,
            on,
            ..OptionSpec::default()
        })
    }
}

impl DeprecatedDocument {
    pub fn into_declaration(self) -> Result<DeprecatedOption> {
        let mut decl = DeprecatedOption::new()
            .boolean(self.boolean)
            .keep(self.keep);
        if let Some(replacement) = self.replacement {
            decl = decl.replacement(replacement);
        }
        if let Some(short) = self.short {
            decl = decl.short(short);
        }
        if let Some(long) = self.long {
            decl = decl.long(long);
        }
        if let Some(mapper) = self.value_mapper {
            decl = decl.with_mapper(mapper.into_mapper()?);
        }
        Ok(decl)
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_keep() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serde_json::json;

    fn load(doc: Value) -> Result<Schema> {
        SchemaDocument::from_json_str(&doc.to_string())?.into_schema()
    }

    #[test]
    fn loads_options_in_document_order() {
        let schema = load(json!({
            "banner": "Usage: deploy (options)",
            "options": {
                "zone": { "short": "-z ZONE", "required": true },
                "level": { "long": "--level LEVEL", "in": ["debug", "info"], "on": "head" }
            }
        }))
        .unwrap();

        assert_eq!(schema.banner(), "Usage: deploy (options)");
        assert_eq!(schema.options().keys().collect::<Vec<_>>(), vec!["zone", "level"]);
        let level = &schema.options()["level"];
        assert_eq!(level.on, Placement::Head);
        assert_eq!(level.allowed, Some(vec![json!("debug"), json!("info")]));
        assert!(schema.options()["zone"].required);
    }

    #[test]
    fn program_name_feeds_the_default_banner() {
        let schema = load(json!({ "program": "deploy" })).unwrap();
        assert_eq!(schema.banner(), "Usage: deploy (options)");
        assert!(schema.is_empty());
    }

    #[test]
    fn options_must_be_an_object() {
        let err = load(json!({ "options": ["not", "a", "map"] })).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn construction_errors_are_reported() {
        let err = load(json!({ "options": { "x": { "in": "abc" } } })).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("in must be an array")));

        let err = load(json!({ "options": { "x": { "on": "middle" } } })).unwrap_err();
        assert!(matches!(err, Error::InvalidPlacement(ref p) if p == "middle"));

        let err = load(json!({ "options": { "bad-name": {} } })).unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));

        let err = SchemaDocument::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn builtin_value_transforms() {
        let cases = [
            (BuiltinTransform::Integer, json!("42"), json!(42)),
            (BuiltinTransform::Integer, json!("forty"), json!("forty")),
            (BuiltinTransform::Float, json!("1.5"), json!(1.5)),
            (BuiltinTransform::Downcase, json!("LOUD"), json!("loud")),
            (BuiltinTransform::Upcase, json!("quiet"), json!("QUIET")),
            (BuiltinTransform::Split, json!("a,b,c"), json!(["a", "b", "c"])),
            (BuiltinTransform::Negate, json!(true), json!(false)),
            (BuiltinTransform::Identity, json!("same"), json!("same")),
        ];
        for (builtin, input, expected) in cases {
            assert_eq!(
                builtin.into_transform().apply(input, None),
                expected,
                "{builtin:?}"
            );
        }
    }

    #[test]
    fn builtin_reducers_fold_repeated_flags() {
        let schema = load(json!({
            "options": {
                "tag": { "short": "-t TAG", "transform": "append" },
                "verbosity": { "short": "-v", "boolean": true, "transform": "count" }
            }
        }))
        .unwrap();
        let mut cli = Cli::new(&schema).with_output(std::io::sink(), std::io::sink());

        let args: Vec<String> = ["-t", "a", "-vv", "-t", "b", "-v"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(cli.parse_options(&args, false).unwrap().is_success());
        assert_eq!(cli.config()["tag"], json!(["a", "b"]));
        assert_eq!(cli.config()["verbosity"], json!(3));
    }

    #[test]
    fn deprecated_options_use_document_mappers() {
        let schema = load(json!({
            "options": { "level": { "short": "-l LEVEL", "long": "--level LEVEL" } },
            "deprecated-options": {
                "verbose": {
                    "short": "-v",
                    "boolean": true,
                    "replacement": "level",
                    "value-mapper": { "map": { "true": "debug" } },
                    "keep": false
                },
                "shout": { "long": "--shout WORD", "replacement": "level", "value-mapper": "upcase" }
            }
        }))
        .unwrap();

        let verbose = &schema.options()["verbose"];
        assert!(verbose.deprecated);
        assert!(!verbose.keep);
        assert_eq!(
            verbose.description.as_deref(),
            Some("This flag is deprecated. Use -l/--level instead.")
        );
        assert!(schema.options()["shout"].keep);

        let mut cli = Cli::new(&schema).with_output(std::io::sink(), std::io::sink());
        cli.parse_options(&["-v".to_string()], false).unwrap();
        assert_eq!(cli.config()["level"], json!("debug"));
        assert!(!cli.config().contains_key("verbose"));
    }

    #[test]
    fn reducers_are_not_value_mappers() {
        let err = MapperDocument::Builtin(BuiltinTransform::Append)
            .into_mapper()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn documents_serialize_in_kebab_case() {
        let mut doc = SchemaDocument {
            separate_defaults: true,
            ..SchemaDocument::default()
        };
        doc.deprecated_options.insert(
            "old".to_string(),
            DeprecatedDocument {
                replacement: Some("new".to_string()),
                short: None,
                long: Some("--old".to_string()),
                boolean: true,
                value_mapper: Some(MapperDocument::Builtin(BuiltinTransform::Negate)),
                keep: true,
            },
        );

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["separate-defaults"], json!(true));
        assert_eq!(value["deprecated-options"]["old"]["value-mapper"], json!("negate"));
        assert!(value.get("banner").is_none());
    }
}
