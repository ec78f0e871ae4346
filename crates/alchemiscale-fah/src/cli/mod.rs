//! Command line interface for `alchemiscale-fah`

pub mod commands;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use alchemiscale_fah_client::{CompressionType, CoreId, JobActionKind, KeyAlgorithm};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::settings::SettingsOverrides;

#[derive(Debug, Parser)]
#[command(name = "alchemiscale-fah", version)]
#[command(about = "Folding@Home compute tooling for alchemiscale")]
pub struct Cli {
    /// YAML settings file
    #[arg(short = 'c', long = "config", env = "ALCHEMISCALE_FAH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that may be given on the command line
#[derive(Debug, Default, Args)]
pub struct OverrideArgs {
    /// Assignment server API URL
    #[arg(long = "as-url", global = true)]
    pub as_url: Option<String>,
    /// Work server API URL
    #[arg(long = "ws-url", global = true)]
    pub ws_url: Option<String>,
    /// Work server address as registered on the assignment server
    #[arg(long = "ws-ip", global = true)]
    pub ws_ip: Option<Ipv4Addr>,
    /// TLS certificate file
    #[arg(long = "cert", global = true)]
    pub cert: Option<PathBuf>,
    /// TLS private key file
    #[arg(long = "key", global = true)]
    pub key: Option<PathBuf>,
    /// Skip verification of the server certificate
    #[arg(long = "no-verify", global = true)]
    pub no_verify: bool,
}

impl From<&OverrideArgs> for SettingsOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            fah_as_url: args.as_url.clone(),
            fah_ws_url: args.ws_url.clone(),
            fah_ws_ip_addr: args.ws_ip,
            fah_certificate_file: args.cert.clone(),
            fah_key_file: args.key.clone(),
            no_verify: args.no_verify,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Private keys and certificate signing requests
    #[command(subcommand)]
    Key(KeyCommand),
    /// Inspect effective settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Assignment server operations
    #[command(subcommand)]
    As(AsCommand),
    /// Work server project operations
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Work server run operations
    #[command(subcommand)]
    Run(RunCommand),
    /// Work server clone operations
    #[command(subcommand, name = "clone")]
    Clones(CloneCommand),
    /// Work server gen operations
    #[command(subcommand)]
    Gen(GenCommand),
}

#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Create a new private key
    Generate {
        #[arg(long)]
        out: PathBuf,
        /// rsa4096 or ecdsa-p256
        #[arg(long, default_value = "rsa4096")]
        algorithm: KeyAlgorithm,
    },
    /// Create a certificate signing request to present to an assignment server
    Csr {
        /// Private key to sign the request with
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        common_name: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings
    Show,
}

#[derive(Debug, Subcommand)]
pub enum AsCommand {
    /// Get the work server attributes
    GetWs,
    /// Set the work server attributes
    SetWs {
        #[arg(long)]
        max_assign_rate: f64,
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value = "")]
        constraints: String,
    },
    /// Get a project's attributes
    GetProject { project: u64 },
    /// Set a project's attributes
    SetProject {
        project: u64,
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value = "")]
        constraints: String,
    },
    /// Reset a project's weight to 0 and drop its constraints
    ResetProject { project: u64 },
}

#[derive(Debug, Args)]
pub struct ProjectSpec {
    /// Core id, e.g. 0x23
    #[arg(long)]
    pub core_id: CoreId,
    /// Contact e-mail
    #[arg(long)]
    pub contact: String,
    #[arg(long)]
    pub atoms: u64,
    #[arg(long)]
    pub credit: u64,
    #[arg(long, default_value_t = 0)]
    pub runs: u64,
    #[arg(long, default_value_t = 0)]
    pub clones: u64,
    #[arg(long, default_value_t = 1)]
    pub gens: u64,
    /// Seconds before a WU can be reassigned
    #[arg(long, default_value_t = 86400.0)]
    pub timeout: f64,
    /// Seconds in which a WU can be returned for credit
    #[arg(long, default_value_t = 172800.0)]
    pub deadline: f64,
    #[arg(long, default_value = "ZLIB")]
    pub compression: CompressionType,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    List,
    Get { project: u64 },
    Create {
        project: u64,
        #[command(flatten)]
        spec: ProjectSpec,
    },
    Delete { project: u64 },
    /// List files in the project directory
    Files { project: u64 },
    /// Upload a local file into the project directory
    Upload {
        project: u64,
        src: PathBuf,
        dest: String,
    },
    /// Download a file from the project directory
    Download {
        project: u64,
        src: String,
        dest: PathBuf,
    },
    /// List active jobs
    Jobs {
        project: u64,
        /// Only jobs updated since this RFC 3339 time
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RunCommand {
    /// Create a run from its core, system, state and integrator files
    Create {
        project: u64,
        #[arg(long)]
        core: PathBuf,
        #[arg(long)]
        system: PathBuf,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        integrator: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct CloneRef {
    pub project: u64,
    pub run: u64,
    pub clone: u64,
}

#[derive(Debug, Subcommand)]
pub enum CloneCommand {
    Create(CloneRef),
    Get(CloneRef),
    Files(CloneRef),
    /// Apply a job action: create, fail, reset, stop or restart
    Action {
        #[command(flatten)]
        target: CloneRef,
        action: JobActionKind,
    },
}

#[derive(Debug, Subcommand)]
pub enum GenCommand {
    Files {
        #[command(flatten)]
        target: CloneRef,
        #[arg(value_name = "GEN")]
        generation: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_project_create() {
        let cli = Cli::try_parse_from([
            "alchemiscale-fah",
            "project",
            "create",
            "90001",
            "--core-id",
            "0x23",
            "--contact",
            "lol@no.int",
            "--atoms",
            "10000",
            "--credit",
            "5000",
            "--compression",
            "lz4",
        ])
        .unwrap();

        match cli.command {
            Command::Project(ProjectCommand::Create { project, spec }) => {
                assert_eq!(project, 90001);
                assert_eq!(spec.core_id, CoreId(0x23));
                assert_eq!(spec.gens, 1);
                assert_eq!(spec.compression, CompressionType::Lz4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "alchemiscale-fah",
            "clone",
            "action",
            "1",
            "2",
            "3",
            "restart",
            "--ws-ip",
            "10.0.0.7",
            "--no-verify",
        ])
        .unwrap();

        let overrides = SettingsOverrides::from(&cli.overrides);
        assert_eq!(overrides.fah_ws_ip_addr, Some(Ipv4Addr::new(10, 0, 0, 7)));
        assert!(overrides.no_verify);
        assert!(matches!(
            cli.command,
            Command::Clones(CloneCommand::Action {
                action: JobActionKind::Restart,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_key_csr() {
        let cli = Cli::try_parse_from([
            "alchemiscale-fah",
            "key",
            "csr",
            "--private-key",
            "api-private.pem",
            "--common-name",
            "joe@example.com",
            "--out",
            "api.csr",
        ])
        .unwrap();

        match cli.command {
            Command::Key(KeyCommand::Csr {
                private_key,
                common_name,
                ..
            }) => {
                assert_eq!(private_key, PathBuf::from("api-private.pem"));
                assert_eq!(common_name, "joe@example.com");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.overrides.key.is_none());
    }

    #[test]
    fn test_parse_jobs_since() {
        let cli = Cli::try_parse_from([
            "alchemiscale-fah",
            "project",
            "jobs",
            "90001",
            "--since",
            "2023-06-01T12:00:00Z",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Project(ProjectCommand::Jobs { since: Some(_), .. })
        ));
    }

    #[test]
    fn test_invalid_action_rejected() {
        let result = Cli::try_parse_from(["alchemiscale-fah", "clone", "action", "1", "2", "3", "explode"]);
        assert!(result.is_err());
    }
}
