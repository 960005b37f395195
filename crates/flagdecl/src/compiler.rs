//! Compile a registry into a configured [`OptionParser`].

use crate::error::{Error, Result};
use crate::formatter::{display_value, friendly_list};
use crate::spec::{OptionSpec, Placement};
use crate::Registry;
use flagdecl_optparse::parser::OptionParser;
use flagdecl_optparse::switch::Switch;
use tracing::debug;

/// Build a parser whose switches are keyed by option name.
///
/// Options are registered in name order, so help output is alphabetical apart
/// from `head`/`tail` placements. Descriptions get their `(required)` and
/// `(valid options: ...)` suffixes appended in place.
pub fn build_parser(options: &mut Registry, banner: &str) -> Result<OptionParser<String>> {
    let mut names: Vec<String> = options.keys().cloned().collect();
    names.sort();

    // Descriptions are written back only once every switch has built, so a
    // failed compile leaves the registry untouched.
    let mut parser = OptionParser::new(banner);
    let mut descriptions = Vec::with_capacity(names.len());
    for name in names {
        let Some(spec) = options.get(&name) else {
            continue;
        };
        let description = described(spec);

        let switch = Switch::new(
            name.clone(),
            spec.short.as_deref(),
            spec.long.as_deref(),
            description.as_deref(),
        )
        .map_err(|source| Error::Pattern {
            name: name.clone(),
            source,
        })?;

        match spec.on {
            Placement::Normal => {
                parser.on(switch);
            }
            Placement::Head => {
                parser.on_head(switch);
            }
            Placement::Tail => {
                parser.on_tail(switch);
            }
        }
        descriptions.push((name, description));
    }

    for (name, description) in descriptions {
        if let Some(spec) = options.get_mut(&name) {
            spec.description = description;
        }
    }

    debug!(options = parser.len(), "compiled option parser");
    Ok(parser)
}

fn described(spec: &OptionSpec) -> Option<String> {
    let mut description = spec.description.clone()?;
    if spec.required {
        description.push_str(" (required)");
    }
    if let Some(allowed) = &spec.allowed {
        let values: Vec<String> = allowed.iter().map(display_value).collect();
        description.push_str(&format!(" (valid options: {})", friendly_list(&values)));
    }
    Some(description)
}
