use anyhow::{Context, Result, bail};
use flagdecl::{Schema, SchemaDocument};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA_NAME: &str = "options.json";

pub fn load_schema(path: &Path) -> Result<Schema> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    let document = SchemaDocument::from_json_str(&contents)
        .with_context(|| format!("failed to parse schema JSON: {}", path.display()))?;
    let schema = document
        .into_schema()
        .with_context(|| format!("invalid schema: {}", path.display()))?;

    tracing::debug!(path = %path.display(), options = schema.len(), "loaded schema");
    Ok(schema)
}

/// Write a starter `options.json` into `project_dir`. Never overwrites.
pub fn write_starter_schema(project_dir: &Path) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_SCHEMA_NAME);
    if dest.exists() {
        bail!("{} already exists in {}", DEFAULT_SCHEMA_NAME, project_dir.display());
    }

    let program = guess_program_name(project_dir).unwrap_or_else(|| "my-cli".to_string());
    let starter = json!({
        "program": program,
        "options": {
            "config_file": {
                "short": "-c CONFIG",
                "long": "--config CONFIG",
                "description": "The configuration file to use",
                "default": "config.json"
            },
            "log_level": {
                "short": "-l LEVEL",
                "long": "--log-level LEVEL",
                "description": "Set the log level",
                "in": ["debug", "info", "warn", "error"],
                "default": "info"
            },
            "help": {
                "short": "-h",
                "long": "--help",
                "description": "Show this message",
                "boolean": true,
                "show-options": true,
                "exit": 0,
                "on": "tail"
            }
        },
        "deprecated-options": {
            "verbose": {
                "short": "-v",
                "long": "--verbose",
                "boolean": true,
                "replacement": "log_level",
                "value-mapper": { "map": { "true": "debug" } },
                "keep": false
            }
        }
    });

    let mut out = serde_json::to_string_pretty(&starter).context("failed to serialize schema")?;
    out.push('\n');
    fs::write(&dest, out.as_bytes())
        .with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(dest)
}

fn guess_program_name(project_dir: &Path) -> Option<String> {
    let dir = fs::canonicalize(project_dir).ok()?;
    let name = dir.file_name()?.to_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(prefix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "flagdecl-schema-{prefix}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn starter_schema_loads_and_is_not_overwritten() {
        let dir = temp_dir("starter");
        let path = write_starter_schema(&dir).unwrap();

        let schema = load_schema(&path).unwrap();
        assert!(schema.options().contains_key("log_level"));
        assert!(schema.options()["verbose"].deprecated);
        assert!(schema.banner().starts_with("Usage: flagdecl-schema-starter-"));

        assert!(write_starter_schema(&dir).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_reports_the_path() {
        let dir = temp_dir("broken");
        let path = dir.join("broken.json");
        fs::write(&path, "{ \"options\": [] }").unwrap();

        let err = load_schema(&path).unwrap_err();
        assert!(format!("{err:#}").contains("options must be an object"));
        assert!(err.to_string().contains("broken.json"));
        let _ = fs::remove_dir_all(&dir);
    }
}
