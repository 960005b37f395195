//! Deprecated options: declaration-time compilation and resolve-time migration.

use crate::formatter::combined_display_name;
use crate::spec::{OptionSpec, Placement, ValueMapper};
use crate::{Config, Registry, Value};
use indexmap::IndexMap;
use tracing::debug;

pub const GENERIC_NOTICE: &str = "This flag is deprecated and will be removed in a future release.";

/// Declaration of a deprecated flag, optionally feeding a replacement option.
#[derive(Debug, Clone)]
pub struct DeprecatedOption {
    replacement: Option<String>,
    short: Option<String>,
    long: Option<String>,
    boolean: bool,
    value_mapper: Option<ValueMapper>,
    keep: bool,
}

impl Default for DeprecatedOption {
    fn default() -> Self {
        Self {
            replacement: None,
            short: None,
            long: None,
            boolean: false,
            value_mapper: None,
            keep: true,
        }
    }
}

impl DeprecatedOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replacement(mut self, name: impl Into<String>) -> Self {
        self.replacement = Some(name.into());
        self
    }

    pub fn short(mut self, pattern: impl Into<String>) -> Self {
        self.short = Some(pattern.into());
        self
    }

    pub fn long(mut self, pattern: impl Into<String>) -> Self {
        self.long = Some(pattern.into());
        self
    }

    pub fn boolean(mut self, boolean: bool) -> Self {
        self.boolean = boolean;
        self
    }

    pub fn value_mapper(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.value_mapper = Some(ValueMapper::new(f));
        self
    }

    pub(crate) fn with_mapper(mut self, mapper: ValueMapper) -> Self {
        self.value_mapper = Some(mapper);
        self
    }

    /// Whether the deprecated key keeps its own value after migration.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Expand into a full spec. `registry` is consulted for the replacement's
    /// flags so the notice can name them.
    pub fn compile(self, registry: &Registry) -> OptionSpec {
        let description = deprecation_notice(self.replacement.as_deref(), registry);
        OptionSpec {
            short: self.short,
            long: self.long,
            description: Some(description),
            boolean: self.boolean,
            on: Placement::Tail,
            deprecated: true,
            replacement: self.replacement,
            value_mapper: Some(self.value_mapper.unwrap_or_default()),
            keep: self.keep,
            ..OptionSpec::default()
        }
    }
}

pub fn deprecation_notice(replacement: Option<&str>, registry: &Registry) -> String {
    let Some(key) = replacement else {
        return GENERIC_NOTICE.to_string();
    };
    let display = registry
        .get(key)
        .map(|spec| combined_display_name(spec.short.as_deref(), spec.long.as_deref()))
        .filter(|display| !display.is_empty())
        .unwrap_or_else(|| key.to_string());
    format!("This flag is deprecated. Use {display} instead.")
}

/// Move values of deprecated keys onto their replacements.
///
/// Replacement values are computed from the pre-migration config and merged
/// in once, after every deprecated key has been visited. Returns the notice
/// of every deprecated key found, in config order.
pub(crate) fn migrate(config: &mut Config, options: &Registry) -> Vec<String> {
    let mut staged: IndexMap<String, Value> = IndexMap::new();
    let mut notices = Vec::new();

    let present: Vec<String> = config.keys().cloned().collect();
    for key in present {
        let Some(spec) = options.get(&key).filter(|spec| spec.deprecated) else {
            continue;
        };

        if let Some(replacement) = &spec.replacement {
            let value = config.get(&key).cloned().unwrap_or(Value::Null);
            let mapped = match &spec.value_mapper {
                Some(mapper) => mapper.map(value),
                None => value,
            };
            debug!(from = %key, to = %replacement, "migrating deprecated option");
            staged.insert(replacement.clone(), mapped);
            if !spec.keep {
                config.shift_remove(&key);
            }
        }

        notices.push(
            spec.description
                .clone()
                .unwrap_or_else(|| GENERIC_NOTICE.to_string()),
        );
    }

    config.extend(staged);
    notices
}
