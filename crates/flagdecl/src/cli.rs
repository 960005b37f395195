//! The runtime side: one `Cli` per resolution run.

use crate::compiler::build_parser;
use crate::deprecation;
use crate::error::{Error, Result};
use crate::formatter::{display_value, friendly_list};
use crate::outcome::{Failure, FailureKind, Outcome};
use crate::schema::Schema;
use crate::{Config, Registry, Value};
use flagdecl_optparse::parser::OptionParser;
use flagdecl_optparse::switch::Captured;
use std::io::{self, Write};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Parses an argument list against a snapshot of a [`Schema`].
///
/// After [`Cli::parse_options`], [`Cli::config`] holds `name => value` pairs.
/// With separate defaults disabled (the default) `config` starts out holding
/// every declared default and user-supplied values are merged over it. With
/// separate defaults enabled `config` only ever holds user-supplied values and
/// the declared defaults live in [`Cli::default_config`].
pub struct Cli {
    options: Registry,
    config: Config,
    default_config: Config,
    cli_arguments: Vec<String>,
    banner: String,
    parser: Option<OptionParser<String>>,
    deprecation_warnings: Vec<String>,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Cli {
    pub fn new(schema: &Schema) -> Self {
        let options = schema.options().clone();
        let mut config = Config::new();
        let mut default_config = Config::new();

        let defaults = if schema.uses_separate_defaults() {
            &mut default_config
        } else {
            &mut config
        };
        for (name, spec) in &options {
            if let Some(value) = &spec.default {
                defaults.insert(name.clone(), value.clone());
            }
        }

        Self {
            options,
            config,
            default_config,
            cli_arguments: Vec::new(),
            banner: schema.banner().to_string(),
            parser: None,
            deprecation_warnings: Vec::new(),
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
        }
    }

    /// Redirect help/failure text (`out`) and deprecation warnings (`err`).
    pub fn with_output(
        mut self,
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
    ) -> Self {
        self.out = Box::new(out);
        self.err = Box::new(err);
        self
    }

    pub fn options(&self) -> &Registry {
        &self.options
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn default_config(&self) -> &Config {
        &self.default_config
    }

    /// Arguments left over by the last successful parse.
    pub fn cli_arguments(&self) -> &[String] {
        &self.cli_arguments
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Change the banner. Only affects a parser that has not been compiled yet.
    pub fn set_banner(&mut self, banner: impl Into<String>) {
        self.banner = banner.into();
    }

    /// Notices of the deprecated options seen by the last parse.
    pub fn deprecation_warnings(&self) -> &[String] {
        &self.deprecation_warnings
    }

    /// The parser for this run, compiled on first use and reused afterwards.
    pub fn compiled_parser(&mut self) -> Result<&OptionParser<String>> {
        let parser = self.take_parser()?;
        Ok(self.parser.insert(parser))
    }

    fn take_parser(&mut self) -> Result<OptionParser<String>> {
        match self.parser.take() {
            Some(parser) => Ok(parser),
            None => build_parser(&mut self.options, &self.banner),
        }
    }

    /// Parse `argv` (never modified) and validate the result.
    ///
    /// Misconfiguration is an `Err`. Anything the end user got wrong comes
    /// back as `Ok(Outcome::Failure)` for the caller to report.
    pub fn parse_options(&mut self, argv: &[String], show_deprecations: bool) -> Result<Outcome> {
        let mut argv = argv.to_vec();
        let parser = self.take_parser()?;
        let outcome = self.resolve(&parser, &mut argv, show_deprecations);
        self.parser = Some(parser);
        outcome
    }

    /// Parse and handle the outcome the way a command-line tool does: print
    /// failures with the help text and exit with status 2, exit with the
    /// declared code for `exit` switches, otherwise return the leftovers.
    pub fn parse_or_exit(&mut self, argv: &[String]) -> Result<Vec<String>> {
        match self.parse_options(argv, true)? {
            Outcome::Success(leftovers) => Ok(leftovers),
            Outcome::Exit(code) => {
                let _ = self.out.flush();
                std::process::exit(code)
            }
            Outcome::Failure(failure) => {
                let _ = writeln!(self.out, "{}", failure.message);
                let _ = write!(self.out, "{}", failure.help);
                let _ = self.out.flush();
                std::process::exit(failure.exit_code())
            }
        }
    }

    /// [`Cli::parse_or_exit`] over the process arguments.
    pub fn parse_env(&mut self) -> Result<Vec<String>> {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        self.parse_or_exit(&argv)
    }

    fn resolve(
        &mut self,
        parser: &OptionParser<String>,
        argv: &mut Vec<String>,
        show_deprecations: bool,
    ) -> Result<Outcome> {
        debug!(args = argv.len(), "parsing options");
        let help = parser.help();

        let Self {
            options,
            config,
            out,
            ..
        } = self;
        let parsed = parser.parse_with(argv, |name, captured| {
            let Some(spec) = options.get(name) else {
                return ControlFlow::Continue(());
            };
            trace!(option = %name, ?captured, "matched switch");

            let raw = captured_value(captured);
            let value = match &spec.transform {
                Some(transform) => transform.apply(raw, config.get(name)),
                None => raw,
            };
            config.insert(name.clone(), value);

            if spec.show_options {
                let _ = out.write_all(help.as_bytes());
                let _ = out.flush();
            }
            match spec.exit {
                Some(code) => ControlFlow::Break(code),
                None => ControlFlow::Continue(()),
            }
        });

        match parsed {
            Ok(Some(code)) => {
                debug!(code, "exit switch matched");
                return Ok(Outcome::Exit(code));
            }
            Ok(None) => {}
            Err(err) => {
                return match Failure::from_parse_error(&err, &help) {
                    Some(failure) => Ok(Outcome::Failure(failure)),
                    None => Err(Error::Pattern {
                        name: String::new(),
                        source: err,
                    }),
                };
            }
        }

        let notices = deprecation::migrate(&mut self.config, &self.options);
        if show_deprecations {
            for notice in &notices {
                let _ = writeln!(self.err, "{notice}");
            }
        }
        self.deprecation_warnings = notices;

        if let Some(failure) = self.check_required(&help) {
            return Ok(Outcome::Failure(failure));
        }
        if let Some(failure) = self.check_allowed(&help) {
            return Ok(Outcome::Failure(failure));
        }

        debug!(leftovers = argv.len(), "options resolved");
        self.cli_arguments = argv.clone();
        Ok(Outcome::Success(argv.clone()))
    }

    /// The first required option missing from `config`, in declaration order.
    fn check_required(&self, help: &str) -> Option<Failure> {
        let (name, spec) = self
            .options
            .iter()
            .find(|(name, spec)| spec.required && !self.config.contains_key(name.as_str()))?;
        Some(Failure::new(
            FailureKind::MissingRequired,
            format!("You must supply {}!", spec.flag_display(name)),
            help,
        ))
    }

    fn check_allowed(&self, help: &str) -> Option<Failure> {
        for (name, spec) in &self.options {
            let Some(allowed) = &spec.allowed else {
                continue;
            };
            let Some(value) = self.config.get(name).filter(|v| !v.is_null()) else {
                continue;
            };
            if allowed.contains(value) {
                continue;
            }
            let values: Vec<String> = allowed.iter().map(display_value).collect();
            return Some(Failure::new(
                FailureKind::InvalidValue,
                format!(
                    "{}: {} is not one of the allowed values: {}",
                    spec.flag_display(name),
                    display_value(value),
                    friendly_list(&values)
                ),
                help,
            ));
        }
        None
    }
}

fn captured_value(captured: Captured) -> Value {
    match captured {
        Captured::Flag(flag) => Value::Bool(flag),
        Captured::Value(value) => Value::String(value),
        Captured::Absent => Value::Null,
    }
}
