use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use dm_metadata::config::{Config, ValidationLimits};

mod fields;
mod label;
mod service;
mod store;

/// md-manage - attach annotations to dataset result files
#[derive(Parser)]
#[command(name = "md-manage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load validation limits from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a label annotation
    Label {
        /// Results file the annotation belongs to
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Label text (prefix with @ for scoped or # for hash labels)
        #[arg(value_name = "LABEL")]
        label: String,

        /// Label value
        #[arg(long)]
        value: Option<String>,

        /// Reference of an @ scoped label
        #[arg(long)]
        reference: Option<String>,

        /// Add the label as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Add a fields descriptor annotation
    Fields {
        /// Results file the annotation belongs to
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Producer of the fields
        #[arg(long)]
        origin: String,

        /// Description of the fields
        #[arg(long)]
        description: String,

        /// Field as name,type,description[,required[,active[,semantic_type]]]
        #[arg(short = 'f', long = "field", value_name = "FIELD")]
        fields: Vec<String>,

        /// Annotation name (defaults to a new UUID)
        #[arg(long)]
        name: Option<String>,
    },

    /// Add a service execution annotation
    Service {
        /// Results file the annotation belongs to
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Service name
        #[arg(long)]
        service: String,

        /// Service version
        #[arg(long)]
        service_version: String,

        /// User who ran the service
        #[arg(long)]
        service_user: String,

        /// What the service does
        #[arg(long)]
        service_description: String,

        /// Link to the service documentation
        #[arg(long)]
        service_ref: String,

        /// Service parameter as KEY=VALUE
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Producer of the fields
        #[arg(long)]
        origin: String,

        /// Description of the fields
        #[arg(long)]
        description: String,

        /// Field as name,type,description[,required[,active[,semantic_type]]]
        #[arg(short = 'f', long = "field", value_name = "FIELD")]
        fields: Vec<String>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn load_limits(config: Option<&Path>) -> Result<ValidationLimits> {
    match config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            Ok(config.limits)
        }
        None => Ok(ValidationLimits::default()),
    }
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let limits = load_limits(cli.config.as_deref())?;
    match cli.command {
        Commands::Label {
            file,
            label,
            value,
            reference,
            inactive,
        } => label::run(&file, label, value, reference, !inactive, &limits),
        Commands::Fields {
            file,
            origin,
            description,
            fields,
            name,
        } => fields::run(&file, origin, description, &fields, name, &limits),
        Commands::Service {
            file,
            service,
            service_version,
            service_user,
            service_description,
            service_ref,
            params,
            origin,
            description,
            fields,
        } => {
            let info = service::parse_service(
                service,
                service_version,
                service_user,
                service_description,
                service_ref,
                &params,
            )?;
            service::run(&file, info, origin, description, &fields, &limits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_label_command() {
        let cli = Cli::parse_from([
            "md-manage", "-vv", "label", "results.sdf", "label1", "--value", "value1",
        ]);
        assert_eq!(cli.verbosity(), 2);
        match cli.command {
            Commands::Label { label, value, inactive, .. } => {
                assert_eq!(label, "label1");
                assert_eq!(value.as_deref(), Some("value1"));
                assert!(!inactive);
            }
            _ => panic!("expected label command"),
        }
    }

    #[test]
    fn test_parse_fields_command() {
        let cli = Cli::parse_from([
            "md-manage",
            "fields",
            "results.sdf",
            "--origin",
            "Supplier 1",
            "--description",
            "A description",
            "-f",
            "smiles,smiles,Standardized smiles,true",
            "--field",
            "id,string,File identifier",
        ]);
        match cli.command {
            Commands::Fields { fields, .. } => assert_eq!(fields.len(), 2),
            _ => panic!("expected fields command"),
        }
    }

    #[test]
    fn test_load_limits() {
        assert_eq!(load_limits(None).unwrap(), ValidationLimits::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nlabel_max = 20").unwrap();
        let limits = load_limits(Some(file.path())).unwrap();
        assert_eq!(limits.label_max, 20);

        assert!(load_limits(Some(Path::new("/nonexistent/md-manage.toml"))).is_err());
    }
}
