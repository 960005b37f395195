use anyhow::Result;
use flagdecl::formatter::{display_value, friendly_list};
use flagdecl::{Cli, Schema};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

use crate::schema_file::load_schema;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckReport {
    pub schema: String,
    pub banner: String,
    pub options: Vec<String>,
    pub deprecated_options: Vec<String>,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Load a schema file and look for declarations that load fine but cannot
/// work as intended.
pub fn check_schema(path: &Path) -> Result<CheckReport> {
    let schema = load_schema(path)?;

    let (deprecated, regular): (Vec<_>, Vec<_>) = schema
        .options()
        .iter()
        .partition(|(_, spec)| spec.deprecated);

    let mut problems = Vec::new();
    flag_collisions(&schema, &mut problems);
    dangling_replacements(&schema, &mut problems);
    defaults_outside_allowed(&schema, &mut problems);

    Ok(CheckReport {
        schema: path.display().to_string(),
        banner: schema.banner().to_string(),
        options: regular.into_iter().map(|(name, _)| name.clone()).collect(),
        deprecated_options: deprecated.into_iter().map(|(name, _)| name.clone()).collect(),
        problems,
    })
}

/// Two options answering to the same short or long flag; only the first one
/// listed would ever match.
fn flag_collisions(schema: &Schema, problems: &mut Vec<String>) {
    let mut cli = Cli::new(schema);
    let parser = match cli.compiled_parser() {
        Ok(parser) => parser,
        Err(err) => {
            problems.push(err.to_string());
            return;
        }
    };

    let mut shorts: IndexMap<char, &str> = IndexMap::new();
    let mut longs: IndexMap<&str, &str> = IndexMap::new();
    for switch in parser.switches() {
        let owner = switch.key().as_str();
        if let Some(c) = switch.short() {
            if let Some(first) = shorts.get(&c) {
                problems.push(format!("-{c} is declared by both {first} and {owner}"));
            } else {
                shorts.insert(c, owner);
            }
        }
        if let Some(long) = switch.long() {
            if let Some(first) = longs.get(long) {
                problems.push(format!("--{long} is declared by both {first} and {owner}"));
            } else {
                longs.insert(long, owner);
            }
        }
    }
}

fn dangling_replacements(schema: &Schema, problems: &mut Vec<String>) {
    for (name, spec) in schema.options() {
        let Some(replacement) = &spec.replacement else {
            continue;
        };
        if !schema.options().contains_key(replacement) {
            problems.push(format!(
                "{name}: replacement {replacement} is not a declared option"
            ));
        }
    }
}

fn defaults_outside_allowed(schema: &Schema, problems: &mut Vec<String>) {
    for (name, spec) in schema.options() {
        let (Some(default), Some(allowed)) = (&spec.default, &spec.allowed) else {
            continue;
        };
        if !allowed.contains(default) {
            let values: Vec<String> = allowed.iter().map(display_value).collect();
            problems.push(format!(
                "{name}: default {} is not one of the allowed values: {}",
                display_value(default),
                friendly_list(&values)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagdecl::{DeprecatedOption, OptionSpec};

    #[test]
    fn collisions_name_both_options() {
        let mut schema = Schema::new();
        schema.option("alpha", OptionSpec::new().short("-a").long("--all")).unwrap();
        schema.option("beta", OptionSpec::new().short("-a VALUE")).unwrap();
        schema.option("gamma", OptionSpec::new().long("--[no-]all")).unwrap();

        let mut problems = Vec::new();
        flag_collisions(&schema, &mut problems);
        assert_eq!(
            problems,
            vec![
                "-a is declared by both alpha and beta".to_string(),
                "--all is declared by both alpha and gamma".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_replacements_and_bad_defaults_are_reported() {
        let mut schema = Schema::new();
        schema
            .option(
                "level",
                OptionSpec::new()
                    .short("-l LEVEL")
                    .default_value("trace")
                    .allowed_values(["debug", "info"]),
            )
            .unwrap();
        schema
            .deprecated_option("old", DeprecatedOption::new().long("--old").replacement("gone"))
            .unwrap();

        let mut problems = Vec::new();
        dangling_replacements(&schema, &mut problems);
        defaults_outside_allowed(&schema, &mut problems);
        assert_eq!(
            problems,
            vec![
                "old: replacement gone is not a declared option".to_string(),
                "level: default trace is not one of the allowed values: 'debug' or 'info'"
                    .to_string(),
            ]
        );
    }
}
