//! The declaration-time side: a registry of options plus banner and default handling.

use crate::deprecation::DeprecatedOption;
use crate::error::{Error, Result};
use crate::spec::OptionSpec;
use crate::Registry;
use std::sync::OnceLock;
use tracing::debug;

/// A declared set of options.
///
/// Derived schemas are explicit: [`Schema::derive`] hands back an independent
/// copy of the registry that can be extended without touching the parent.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    options: Registry,
    banner: OnceLock<String>,
    program_name: Option<String>,
    separate_defaults: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) an option. The last declaration of a name wins.
    pub fn option(&mut self, name: &str, spec: OptionSpec) -> Result<&OptionSpec> {
        validate_name(name)?;
        debug!(option = name, "declaring option");
        let (index, _) = self.options.insert_full(name.to_string(), spec);
        Ok(&self.options[index])
    }

    /// Declare a deprecated option, compiled into a tail-placed spec that
    /// carries its migration metadata.
    pub fn deprecated_option(&mut self, name: &str, decl: DeprecatedOption) -> Result<&OptionSpec> {
        validate_name(name)?;
        let spec = decl.compile(&self.options);
        self.option(name, spec)
    }

    pub fn options(&self) -> &Registry {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Registry {
        &mut self.options
    }

    /// Replace the whole registry. Every key must be a valid option name.
    pub fn set_options(&mut self, options: Registry) -> Result<()> {
        for name in options.keys() {
            validate_name(name)?;
        }
        self.options = options;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The usage header. Unless set explicitly it is computed on first access as
    /// `Usage: <program> (options)`.
    pub fn banner(&self) -> &str {
        self.banner
            .get_or_init(|| format!("Usage: {} (options)", self.program_name()))
    }

    pub fn set_banner(&mut self, banner: impl Into<String>) {
        self.banner = OnceLock::from(banner.into());
    }

    /// Override the program name used by the default banner.
    ///
    /// Has no effect once the default banner has been read.
    pub fn set_program_name(&mut self, name: impl Into<String>) {
        self.program_name = Some(name.into());
    }

    pub fn program_name(&self) -> String {
        self.program_name
            .clone()
            .or_else(|| std::env::args().next())
            .unwrap_or_default()
    }

    /// Keep declared defaults out of `config` and in `default_config` instead.
    pub fn use_separate_default_options(&mut self, separate: bool) {
        self.separate_defaults = separate;
    }

    pub fn uses_separate_defaults(&self) -> bool {
        self.separate_defaults
    }

    /// Start a child schema from a deep copy of this registry.
    ///
    /// Banner and default separation are per-schema settings and start fresh.
    /// Transform closures are shared, not copied.
    pub fn derive(&self) -> Self {
        debug!(options = self.options.len(), "deriving schema");
        Self {
            options: self.options.clone(),
            program_name: self.program_name.clone(),
            ..Self::default()
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_returns_the_declared_spec() {
        let mut schema = Schema::new();
        let spec = schema
            .option("config_file", OptionSpec::new().short("-c CONFIG"))
            .unwrap();
        assert_eq!(spec.short.as_deref(), Some("-c CONFIG"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn redeclaring_replaces_the_entry() {
        let mut schema = Schema::new();
        schema.option("alpha", OptionSpec::new().short("-a")).unwrap();
        schema.option("beta", OptionSpec::new().short("-b")).unwrap();
        schema.option("alpha", OptionSpec::new().short("-A")).unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.options()["alpha"].short.as_deref(), Some("-A"));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut schema = Schema::new();
        for bad in ["", "1st", "with-dash", "has space"] {
            assert!(matches!(
                schema.option(bad, OptionSpec::new()),
                Err(Error::InvalidName(_))
            ));
        }
        assert!(schema.is_empty());

        let mut registry = Registry::new();
        registry.insert("not valid".to_string(), OptionSpec::new());
        assert!(matches!(schema.set_options(registry), Err(Error::InvalidName(_))));
    }

    #[test]
    fn set_options_replaces_the_registry() {
        let mut schema = Schema::new();
        schema.option("old", OptionSpec::new()).unwrap();

        let mut registry = Registry::new();
        registry.insert("config_file".to_string(), OptionSpec::new().short("-c CONFIG"));
        schema.set_options(registry).unwrap();

        assert_eq!(schema.options().keys().collect::<Vec<_>>(), vec!["config_file"]);
    }

    #[test]
    fn banner_defaults_lazily_to_program_name() {
        let mut schema = Schema::new();
        schema.set_program_name("knife");
        assert_eq!(schema.banner(), "Usage: knife (options)");

        schema.set_program_name("chef");
        assert_eq!(schema.banner(), "Usage: knife (options)");

        schema.set_banner("Usage: foo");
        assert_eq!(schema.banner(), "Usage: foo");
    }

    #[test]
    fn derived_schema_keeps_parent_options() {
        let mut parent = Schema::new();
        parent.option("arg1", OptionSpec::new().boolean(true)).unwrap();

        let mut child = parent.derive();
        child.option("arg2", OptionSpec::new().boolean(true)).unwrap();

        assert!(child.options().contains_key("arg1"));
        assert!(child.options().contains_key("arg2"));
        assert!(!parent.options().contains_key("arg2"));
    }

    #[test]
    fn derived_schema_cannot_modify_parent() {
        let mut parent = Schema::new();
        parent
            .option(
                "arg1",
                OptionSpec::new()
                    .boolean(true)
                    .default_value(json!(["a"]))
                    .allowed_values(["a", "b"]),
            )
            .unwrap();

        let mut child = parent.derive();
        let copied = &mut child.options_mut()["arg1"];
        copied.boolean = false;
        copied.allowed.as_mut().unwrap().push(json!("c"));
        if let Some(serde_json::Value::Array(items)) = copied.default.as_mut() {
            items.push(json!("b"));
        }

        let original = &parent.options()["arg1"];
        assert!(original.boolean);
        assert_eq!(original.allowed.as_ref().unwrap().len(), 2);
        assert_eq!(original.default, Some(json!(["a"])));
        assert!(!child.options()["arg1"].boolean);
    }

    #[test]
    fn derivation_is_transitive_and_independent() {
        let mut base = Schema::new();
        base.option("arg1", OptionSpec::new().boolean(true)).unwrap();

        let mut middle = base.derive();
        middle.option("arg2", OptionSpec::new().boolean(true)).unwrap();

        let mut leaf = middle.derive();
        leaf.option("arg3", OptionSpec::new().boolean(true)).unwrap();
        leaf.options_mut()["arg2"].boolean = false;

        for name in ["arg1", "arg2", "arg3"] {
            assert!(leaf.options().contains_key(name));
        }
        assert!(middle.options()["arg2"].boolean);
        assert!(!middle.options().contains_key("arg3"));
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn derived_schema_gets_its_own_banner() {
        let mut parent = Schema::new();
        parent.set_program_name("tool");
        parent.set_banner("Usage: parent");
        parent.use_separate_default_options(true);

        let child = parent.derive();
        assert_eq!(child.banner(), "Usage: tool (options)");
        assert!(!child.uses_separate_defaults());
    }
}
