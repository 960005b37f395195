//! OptionParser-style switch tokenizer and help rendering.
//!
//! This crate is the low-level half of `flagdecl`:
//! - `switch` turns flag patterns like `-c CONFIG` or `--[no-]color` into matchable switches
//! - `parser` runs a permuting parse over argv and calls back once per matched switch
//!
//! It knows nothing about defaults, validation or config maps. Callers own that.

use thiserror::Error;

/// Errors raised while building switches or tokenizing argv.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("needless argument: {0}")]
    NeedlessArgument(String),

    #[error("ambiguous option: {0}")]
    AmbiguousOption(String),

    #[error("invalid switch pattern: {0:?}")]
    InvalidPattern(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

pub mod switch {
    use super::{ParseError, ParseResult};

    /// Whether a switch takes an argument, parsed from the placeholder in its pattern.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Arity {
        /// Plain flag (`-v`, `--[no-]color`).
        None,
        /// `-c CONFIG`, `--config=CONFIG`
        Required(String),
        /// `-c [CONFIG]`, `--config [CONFIG]`
        Optional(String),
    }

    impl Arity {
        pub fn takes_value(&self) -> bool {
            !matches!(self, Self::None)
        }

        fn from_placeholder(raw: &str) -> Self {
            let raw = raw.trim();
            if raw.is_empty() {
                return Self::None;
            }
            match raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                Some(inner) => {
                    let inner = inner.trim();
                    Self::Optional(inner.strip_prefix('=').unwrap_or(inner).trim().to_string())
                }
                None => Self::Required(raw.to_string()),
            }
        }

        fn display(&self) -> String {
            match self {
                Self::None => String::new(),
                Self::Required(p) => format!(" {p}"),
                Self::Optional(p) => format!(" [{p}]"),
            }
        }
    }

    /// What a matched switch captured from argv.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Captured {
        /// A flag: `true`, or `false` when matched through `--no-name`.
        Flag(bool),
        Value(String),
        /// An optional argument that was not supplied.
        Absent,
    }

    /// One registered switch, tagged with a caller-chosen key.
    #[derive(Debug, Clone)]
    pub struct Switch<K> {
        key: K,
        short: Option<char>,
        long: Option<String>,
        negatable: bool,
        arity: Arity,
        description: Option<String>,
    }

    impl<K> Switch<K> {
        /// Build a switch from OptionParser-style patterns.
        ///
        /// A switch with neither `short` nor `long` is allowed; it never matches
        /// and is omitted from help output.
        pub fn new(
            key: K,
            short: Option<&str>,
            long: Option<&str>,
            description: Option<&str>,
        ) -> ParseResult<Self> {
            let (short, short_arity) = match short {
                Some(raw) => {
                    let (c, arity) = parse_short(raw)?;
                    (Some(c), arity)
                }
                None => (None, Arity::None),
            };
            let (long, negatable, long_arity) = match long {
                Some(raw) => {
                    let (name, negatable, arity) = parse_long(raw)?;
                    (Some(name), negatable, arity)
                }
                None => (None, false, Arity::None),
            };
            let arity = if long_arity.takes_value() {
                long_arity
            } else {
                short_arity
            };

            Ok(Self {
                key,
                short,
                long,
                negatable,
                arity,
                description: description.map(|d| d.to_string()),
            })
        }

        pub fn key(&self) -> &K {
            &self.key
        }

        pub fn short(&self) -> Option<char> {
            self.short
        }

        /// Long name without dashes or the `[no-]` marker.
        pub fn long(&self) -> Option<&str> {
            self.long.as_deref()
        }

        pub fn is_negatable(&self) -> bool {
            self.negatable
        }

        pub fn arity(&self) -> &Arity {
            &self.arity
        }

        pub fn description(&self) -> Option<&str> {
            self.description.as_deref()
        }

        fn summary_left(&self) -> Option<String> {
            let arg = self.arity.display();
            let long = self.long.as_ref().map(|l| {
                if self.negatable {
                    format!("--[no-]{l}")
                } else {
                    format!("--{l}")
                }
            });
            match (self.short, long) {
                (None, None) => None,
                (Some(c), None) => Some(format!("-{c}{arg}")),
                (Some(c), Some(l)) => Some(format!("-{c}, {l}{arg}")),
                (None, Some(l)) => Some(format!("    {l}{arg}")),
            }
        }

        pub(crate) fn summarize(&self, width: usize, indent: &str, out: &mut String) {
            let Some(left) = self.summary_left() else {
                return;
            };
            let mut lines = self
                .description
                .as_deref()
                .map(|d| d.lines().collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter();

            match lines.next() {
                None => out.push_str(&format!("{indent}{left}\n")),
                Some(first) if left.len() > width => {
                    out.push_str(&format!("{indent}{left}\n"));
                    out.push_str(&format!("{indent}{:width$} {first}\n", ""));
                }
                Some(first) => out.push_str(&format!("{indent}{left:<width$} {first}\n")),
            }
            for line in lines {
                out.push_str(&format!("{indent}{:width$} {line}\n", ""));
            }
        }
    }

    fn parse_short(raw: &str) -> ParseResult<(char, Arity)> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('-').unwrap_or(trimmed);
        let mut chars = body.chars();
        let Some(c) = chars.next() else {
            return Err(ParseError::InvalidPattern(raw.to_string()));
        };
        if c == '-' || c.is_whitespace() {
            return Err(ParseError::InvalidPattern(raw.to_string()));
        }
        Ok((c, Arity::from_placeholder(chars.as_str())))
    }

    fn parse_long(raw: &str) -> ParseResult<(String, bool, Arity)> {
        let body = raw.trim().trim_start_matches('-');
        let (negatable, body) = match body.strip_prefix("[no-]") {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let end = body
            .find(|c: char| c == '=' || c == '[' || c.is_whitespace())
            .unwrap_or(body.len());
        let (name, rest) = body.split_at(end);
        if name.is_empty() {
            return Err(ParseError::InvalidPattern(raw.to_string()));
        }
        let rest = rest.strip_prefix('=').unwrap_or(rest);
        Ok((name.to_string(), negatable, Arity::from_placeholder(rest)))
    }
}

pub mod parser {
    use super::switch::{Arity, Captured, Switch};
    use super::{ParseError, ParseResult};
    use std::fmt;
    use std::ops::ControlFlow;

    /// Width of the flag column in help output.
    pub const SUMMARY_WIDTH: usize = 32;
    pub const SUMMARY_INDENT: &str = "    ";

    /// A configured parser: a banner plus switches in head, normal and tail lists.
    #[derive(Debug, Clone)]
    pub struct OptionParser<K> {
        banner: String,
        head: Vec<Switch<K>>,
        normal: Vec<Switch<K>>,
        tail: Vec<Switch<K>>,
    }

    impl<K> OptionParser<K> {
        pub fn new(banner: impl Into<String>) -> Self {
            Self {
                banner: banner.into(),
                head: Vec::new(),
                normal: Vec::new(),
                tail: Vec::new(),
            }
        }

        pub fn banner(&self) -> &str {
            &self.banner
        }

        pub fn set_banner(&mut self, banner: impl Into<String>) {
            self.banner = banner.into();
        }

        /// Register a switch at the default position.
        pub fn on(&mut self, switch: Switch<K>) -> &mut Self {
            self.normal.push(switch);
            self
        }

        /// Register a switch in front of everything registered so far.
        pub fn on_head(&mut self, switch: Switch<K>) -> &mut Self {
            self.head.insert(0, switch);
            self
        }

        /// Register a switch after everything else.
        pub fn on_tail(&mut self, switch: Switch<K>) -> &mut Self {
            self.tail.push(switch);
            self
        }

        /// All switches in lookup and summary order.
        pub fn switches(&self) -> impl Iterator<Item = &Switch<K>> {
            self.head.iter().chain(&self.normal).chain(&self.tail)
        }

        pub fn len(&self) -> usize {
            self.head.len() + self.normal.len() + self.tail.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn find_short(&self, c: char) -> Option<&Switch<K>> {
            self.switches().find(|s| s.short() == Some(c))
        }

        /// Resolve a long name to a switch and the polarity it was matched with.
        ///
        /// Exact names win; otherwise a unique prefix is accepted.
        fn find_long(&self, name: &str) -> ParseResult<(&Switch<K>, bool)> {
            if name.is_empty() {
                return Err(ParseError::InvalidOption(format!("--{name}")));
            }
            let negated = name.strip_prefix("no-").filter(|base| !base.is_empty());

            for sw in self.switches() {
                if sw.long() == Some(name) {
                    return Ok((sw, true));
                }
                if sw.is_negatable() && negated.is_some() && sw.long() == negated {
                    return Ok((sw, false));
                }
            }

            let mut candidates: Vec<(&Switch<K>, bool)> = Vec::new();
            for sw in self.switches() {
                let Some(long) = sw.long() else {
                    continue;
                };
                if long.starts_with(name) {
                    candidates.push((sw, true));
                } else if sw.is_negatable() && negated.is_some_and(|base| long.starts_with(base)) {
                    candidates.push((sw, false));
                }
            }

            match candidates.as_slice() {
                [single] => Ok(*single),
                [] => Err(ParseError::InvalidOption(format!("--{name}"))),
                _ => Err(ParseError::AmbiguousOption(format!("--{name}"))),
            }
        }

        /// Parse `argv` in permute mode, calling `on_match` for every matched switch.
        ///
        /// Options may appear anywhere; `--` stops option processing. On success
        /// `argv` is replaced by the unconsumed tokens in their original order.
        /// If `on_match` breaks, parsing stops right there and the break value is
        /// returned; `argv` is then left untouched. A short-flag cluster such as
        /// `-vc` is checked in full first, so an error inside it fires no callback
        /// for any of its flags.
        pub fn parse_with<B, F>(&self, argv: &mut Vec<String>, mut on_match: F) -> ParseResult<Option<B>>
        where
            F: FnMut(&K, Captured) -> ControlFlow<B>,
        {
            let mut rest: Vec<String> = Vec::new();
            let mut i = 0usize;

            while i < argv.len() {
                let arg = argv[i].as_str();

                if arg == "--" {
                    rest.extend(argv[i + 1..].iter().cloned());
                    break;
                }

                if let Some(body) = arg.strip_prefix("--") {
                    let (name, inline) = match body.split_once('=') {
                        Some((n, v)) => (n, Some(v)),
                        None => (body, None),
                    };
                    let (sw, positive) = self.find_long(name)?;
                    let captured = if !positive {
                        if inline.is_some() {
                            return Err(ParseError::NeedlessArgument(arg.to_string()));
                        }
                        Captured::Flag(false)
                    } else {
                        match (sw.arity(), inline) {
                            (Arity::None, Some(_)) => {
                                return Err(ParseError::NeedlessArgument(arg.to_string()));
                            }
                            (Arity::None, None) => Captured::Flag(true),
                            (_, Some(v)) => Captured::Value(v.to_string()),
                            (Arity::Required(_), None) => {
                                let Some(value) = argv.get(i + 1) else {
                                    return Err(ParseError::MissingArgument(arg.to_string()));
                                };
                                i += 1;
                                Captured::Value(value.clone())
                            }
                            (Arity::Optional(_), None) => match argv.get(i + 1) {
                                Some(value) if !value.starts_with('-') => {
                                    i += 1;
                                    Captured::Value(value.clone())
                                }
                                _ => Captured::Absent,
                            },
                        }
                    };
                    i += 1;
                    if let ControlFlow::Break(b) = on_match(sw.key(), captured) {
                        return Ok(Some(b));
                    }
                    continue;
                }

                if arg.len() > 1 && arg.starts_with('-') {
                    // Short flags: -v, -c value, -abc, -cfile
                    let cluster = &arg[1..];
                    let mut consumed_next = false;
                    let mut matched: Vec<(&Switch<K>, Captured)> = Vec::new();
                    for (offset, c) in cluster.char_indices() {
                        let sw = self
                            .find_short(c)
                            .ok_or_else(|| ParseError::InvalidOption(format!("-{c}")))?;
                        let attached = &cluster[offset + c.len_utf8()..];
                        let (captured, done) = match sw.arity() {
                            Arity::None => (Captured::Flag(true), false),
                            Arity::Required(_) | Arity::Optional(_) if !attached.is_empty() => {
                                (Captured::Value(attached.to_string()), true)
                            }
                            Arity::Required(_) => {
                                let Some(value) = argv.get(i + 1) else {
                                    return Err(ParseError::MissingArgument(format!("-{c}")));
                                };
                                consumed_next = true;
                                (Captured::Value(value.clone()), true)
                            }
                            Arity::Optional(_) => match argv.get(i + 1) {
                                Some(value) if !value.starts_with('-') => {
                                    consumed_next = true;
                                    (Captured::Value(value.clone()), true)
                                }
                                _ => (Captured::Absent, true),
                            },
                        };
                        matched.push((sw, captured));
                        if done {
                            break;
                        }
                    }
                    // The whole cluster is resolved before any callback fires.
                    for (sw, captured) in matched {
                        if let ControlFlow::Break(b) = on_match(sw.key(), captured) {
                            return Ok(Some(b));
                        }
                    }
                    i += if consumed_next { 2 } else { 1 };
                    continue;
                }

                rest.push(arg.to_string());
                i += 1;
            }

            *argv = rest;
            Ok(None)
        }

        /// Render the banner followed by one summary per switch.
        pub fn help(&self) -> String {
            let mut out = String::new();
            out.push_str(&self.banner);
            out.push('\n');
            for sw in self.switches() {
                sw.summarize(SUMMARY_WIDTH, SUMMARY_INDENT, &mut out);
            }
            out
        }
    }

    impl<K> fmt::Display for OptionParser<K> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.help())
        }
    }
}
