// Strata CLI - inspect and edit layer elevation settings stored as XML

mod commands;
mod document;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use strata_config::Settings;
use strata_io::XmlError;

use commands::OverrideArgs;
use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Inspect and edit vector layer elevation settings")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config dir)
    #[arg(long, global = true, env = "STRATA_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a layer document with default elevation settings
    #[command(after_help = "\
Examples:
  strata init roads.xml --id roads --name Roads
  strata init dem_points.xml --has-z --color '#336699'")]
    Init {
        /// Output file
        file: PathBuf,

        /// Layer id
        #[arg(long, default_value = "layer")]
        id: String,

        /// Layer display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        /// Layer geometries carry Z values (absolute clamping, vertex binding)
        #[arg(long)]
        has_z: bool,

        /// Renderer color adopted by the profile symbols
        #[arg(long)]
        color: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the elevation settings of a layer document
    #[command(after_help = "\
Examples:
  strata show roads.xml
  strata show roads.xml --json | jq .overrides
  strata show roads.xml --html")]
    Show {
        file: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,

        /// Output the HTML summary
        #[arg(long)]
        html: bool,
    },

    /// Change one elevation setting
    #[command(after_help = "\
Examples:
  strata set roads.xml zoffset 0.5
  strata set roads.xml clamping relative
  strata set roads.xml extrusion-enabled true
  strata set roads.xml line-color '#ff4433'")]
    Set {
        file: PathBuf,

        /// Setting to change
        key: SetKey,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Define, toggle or remove a data-defined override
    #[command(after_help = "\
Examples:
  strata override roads.xml zOffset --expression '\"base\" * 2'
  strata override roads.xml extrusionHeight --field roof_height
  strata override roads.xml extrusionHeight --disable
  strata override roads.xml zOffset --clear")]
    Override {
        file: PathBuf,

        /// Property key (zOffset, extrusionHeight)
        property: String,

        /// Expression source
        #[arg(long, group = "source")]
        expression: Option<String>,

        /// Field source
        #[arg(long, group = "source")]
        field: Option<String>,

        /// Static numeric value
        #[arg(long, group = "source", allow_hyphen_values = true)]
        value: Option<f64>,

        /// Remove the override
        #[arg(long, group = "source")]
        clear: bool,

        /// Activate the override
        #[arg(long, conflicts_with_all = ["disable", "clear"])]
        enable: bool,

        /// Keep the override but deactivate it
        #[arg(long, conflicts_with = "clear")]
        disable: bool,
    },

    /// Evaluate effective elevation values for one feature
    #[command(after_help = "\
Examples:
  strata eval roads.xml --field roof_height=12
  strata eval roads.xml --field base=3 --z 100 --json")]
    Eval {
        file: PathBuf,

        /// Feature attribute, NAME=VALUE. Repeatable.
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Feature Z to transform
        #[arg(long, allow_hyphen_values = true)]
        z: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the settings file location
    ConfigPath,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SetKey {
    #[value(name = "zscale")]
    ZScale,
    #[value(name = "zoffset")]
    ZOffset,
    Clamping,
    Binding,
    Extrusion,
    ExtrusionEnabled,
    RespectSymbology,
    ProfileType,
    Symbology,
    ShowMarker,
    ShowByDefault,
    LineColor,
    FillColor,
    MarkerColor,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: strata <command> [options]");
            eprintln!("       strata --help for more information");
            Ok(())
        }
        Some(Commands::Init { file, id, name, has_z, color, force }) => {
            commands::cmd_init(&settings, file, id, name, has_z, color, force)
        }
        Some(Commands::Show { file, json, html }) => commands::cmd_show(&settings, file, json, html),
        Some(Commands::Set { file, key, value }) => commands::cmd_set(&settings, file, key, value),
        Some(Commands::Override {
            file,
            property,
            expression,
            field,
            value,
            clear,
            enable,
            disable,
        }) => commands::cmd_override(
            &settings,
            file,
            OverrideArgs { property, expression, field, value, clear, enable, disable },
        ),
        Some(Commands::Eval { file, fields, z, json }) => commands::cmd_eval(&settings, file, fields, z, json),
        Some(Commands::ConfigPath) => {
            println!("{}", Settings::config_path().display());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Classify library failures by their root cause.
impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        let code = match err.downcast_ref::<XmlError>() {
            Some(XmlError::Io(_)) => EXIT_IO,
            Some(_) => EXIT_PARSE,
            None if err.downcast_ref::<std::io::Error>().is_some() => EXIT_IO,
            None => EXIT_ERROR,
        };
        Self::new(code, format!("{:#}", err))
    }
}
