//! Display helpers shared by help text, deprecation notices and failure messages.

use crate::Value;

/// Join the flag names of a short and a long pattern, dropping argument placeholders.
///
/// `("-o CFG", "--option CFG")` becomes `-o/--option`.
pub fn combined_display_name(short: Option<&str>, long: Option<&str>) -> String {
    let flag = |pattern: &str| pattern.split_whitespace().next().unwrap_or("").to_string();
    match (short.map(flag), long.map(flag)) {
        (Some(s), Some(l)) => format!("{s}/{l}"),
        (Some(s), None) => s,
        (None, Some(l)) => l,
        (None, None) => String::new(),
    }
}

/// Quote every item and join them with a final "or" (Oxford comma for 3+ items).
pub fn friendly_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s.as_ref())).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} or {b}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

/// Render a config value for humans: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn combined_display_name_joins_available_flags() {
        assert_eq!(combined_display_name(Some("-o"), Some("--option")), "-o/--option");
        assert_eq!(combined_display_name(None, Some("--option")), "--option");
        assert_eq!(combined_display_name(Some("-o"), None), "-o");
        assert_eq!(combined_display_name(None, None), "");
    }

    #[test]
    fn combined_display_name_drops_placeholders() {
        assert_eq!(
            combined_display_name(Some("-o CFG"), Some("--option CFG")),
            "-o/--option"
        );
    }

    #[test]
    fn friendly_list_uses_or_and_oxford_comma() {
        assert_eq!(friendly_list(&["hello"]), "'hello'");
        assert_eq!(friendly_list(&["hello", "world"]), "'hello' or 'world'");
        assert_eq!(
            friendly_list(&["hello", "green", "world"]),
            "'hello', 'green', or 'world'"
        );
        assert_eq!(
            friendly_list(&["a", "b", "c", "d"]),
            "'a', 'b', 'c', or 'd'"
        );
        assert_eq!(friendly_list::<&str>(&[]), "");
    }

    #[test]
    fn display_value_leaves_strings_unquoted() {
        assert_eq!(display_value(&json!("three")), "three");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(true)), "true");
    }
}
