//! Declarative command-line options.
//!
//! Options are declared once on a [`Schema`], with their flags, defaults,
//! validation rules and transforms. Each run of an application creates a
//! [`Cli`] from the schema, which compiles a parser, walks argv and leaves a
//! validated `name => value` map behind:
//!
//! ```rust,ignore
//! use flagdecl::{Cli, DeprecatedOption, OptionSpec, Outcome, Placement, Schema};
//!
//! let mut schema = Schema::new();
//! schema.option("config_file", OptionSpec::new()
//!     .short("-c CONFIG")
//!     .long("--config CONFIG")
//!     .default_value("config.rb")
//!     .description("The configuration file to use"))?;
//! schema.option("log_level", OptionSpec::new()
//!     .short("-l LEVEL")
//!     .allowed_values(["debug", "info", "warn"])
//!     .required(true))?;
//! schema.option("help", OptionSpec::new()
//!     .short("-h")
//!     .long("--help")
//!     .boolean(true)
//!     .show_options(true)
//!     .exit(0)
//!     .on(Placement::Tail))?;
//! schema.deprecated_option("verbose", DeprecatedOption::new()
//!     .short("-v")
//!     .boolean(true)
//!     .replacement("log_level")
//!     .value_mapper(|_| "debug".into()))?;
//!
//! let mut cli = Cli::new(&schema);
//! let leftovers = cli.parse_env()?;
//! println!("{:?} {leftovers:?}", cli.config());
//! ```
//!
//! Problems with what the end user typed never surface as `Err`: they come back
//! from [`Cli::parse_options`] as [`Outcome::Failure`], and
//! [`Cli::parse_or_exit`] turns them into printed help plus exit status 2.

pub mod cli;
pub mod compiler;
pub mod deprecation;
pub mod document;
pub mod error;
pub mod formatter;
pub mod outcome;
pub mod schema;
pub mod spec;

pub use cli::Cli;
pub use deprecation::DeprecatedOption;
pub use document::SchemaDocument;
pub use error::{Error, Result};
pub use flagdecl_optparse::parser::OptionParser;
pub use outcome::{Failure, FailureKind, Outcome, USAGE_EXIT_CODE};
pub use schema::Schema;
pub use spec::{OptionSpec, Placement, Transform, ValueMapper};

/// Values stored in a config map.
pub type Value = serde_json::Value;

/// Resolved options, in insertion order.
pub type Config = indexmap::IndexMap<String, Value>;

/// Declared options by name, in declaration order.
pub type Registry = indexmap::IndexMap<String, spec::OptionSpec>;
