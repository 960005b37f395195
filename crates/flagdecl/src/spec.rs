//! One declared option and the pieces it is built from.

use crate::error::{Error, Result};
use crate::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub type ValueFn = dyn Fn(Value) -> Value + Send + Sync;
pub type ReducerFn = dyn Fn(Value, Option<&Value>) -> Value + Send + Sync;

/// How a matched value is turned into the stored config value.
#[derive(Clone)]
pub enum Transform {
    /// Receives only the raw captured value.
    Value(Arc<ValueFn>),
    /// Receives the raw value and whatever is stored for the key so far.
    /// Repeated occurrences of the flag fold through it in encounter order.
    Reducer(Arc<ReducerFn>),
}

impl Transform {
    pub fn value(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::Value(Arc::new(f))
    }

    pub fn reducer(f: impl Fn(Value, Option<&Value>) -> Value + Send + Sync + 'static) -> Self {
        Self::Reducer(Arc::new(f))
    }

    pub fn apply(&self, raw: Value, current: Option<&Value>) -> Value {
        match self {
            Self::Value(f) => f(raw),
            Self::Reducer(f) => f(raw, current),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Transform::Value(..)"),
            Self::Reducer(_) => f.write_str("Transform::Reducer(..)"),
        }
    }
}

/// Maps a deprecated option's value onto its replacement's slot.
#[derive(Clone)]
pub struct ValueMapper(Arc<ValueFn>);

impl ValueMapper {
    pub fn new(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn identity() -> Self {
        Self::new(|v| v)
    }

    pub fn map(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl Default for ValueMapper {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for ValueMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueMapper(..)")
    }
}

/// Where a switch lands in the compiled parser's option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Normal,
    Head,
    Tail,
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" | "on" => Ok(Self::Normal),
            "head" => Ok(Self::Head),
            "tail" => Ok(Self::Tail),
            other => Err(Error::InvalidPlacement(other.to_string())),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Head => "head",
            Self::Tail => "tail",
        })
    }
}

/// A declared option. Every field carries an explicit value; `None` means "not set".
///
/// Build one with the chained setters:
///
/// ```rust,ignore
/// let spec = OptionSpec::new()
///     .short("-c CONFIG")
///     .long("--config CONFIG")
///     .description("The configuration file to use")
///     .default_value("config.rb");
/// ```
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub short: Option<String>,
    pub long: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub boolean: bool,
    pub required: bool,
    pub transform: Option<Transform>,
    pub show_options: bool,
    pub exit: Option<i32>,
    /// Allowed values (`in`).
    pub allowed: Option<Vec<Value>>,
    pub on: Placement,
    pub deprecated: bool,
    pub replacement: Option<String>,
    pub value_mapper: Option<ValueMapper>,
    /// Whether a deprecated key keeps its own value after migration.
    pub keep: bool,
}

impl Default for OptionSpec {
    fn default() -> Self {
        Self {
            short: None,
            long: None,
            description: None,
            default: None,
            boolean: false,
            required: false,
            transform: None,
            show_options: false,
            exit: None,
            allowed: None,
            on: Placement::Normal,
            deprecated: false,
            replacement: None,
            value_mapper: None,
            keep: true,
        }
    }
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn short(mut self, pattern: impl Into<String>) -> Self {
        self.short = Some(pattern.into());
        self
    }

    pub fn long(mut self, pattern: impl Into<String>) -> Self {
        self.long = Some(pattern.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn boolean(mut self, boolean: bool) -> Self {
        self.boolean = boolean;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Store `f(raw)` instead of the raw value.
    pub fn transform(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform = Some(Transform::value(f));
        self
    }

    /// Store `f(raw, current)`, folding repeated occurrences.
    pub fn reducer(
        mut self,
        f: impl Fn(Value, Option<&Value>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Transform::reducer(f));
        self
    }

    pub fn show_options(mut self, show: bool) -> Self {
        self.show_options = show;
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.exit = Some(code);
        self
    }

    pub fn allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn on(mut self, placement: Placement) -> Self {
        self.on = placement;
        self
    }

    /// The pattern used to name this option in messages: short first, then long,
    /// then `name` for options with no flags at all.
    pub fn flag_display(&self, name: &str) -> String {
        self.short
            .as_deref()
            .or(self.long.as_deref())
            .map(|s| s.to_string())
            .unwrap_or_else(|| name.to_string())
    }
}
