use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certfix")]
#[command(author = "Certfix Contributors")]
#[command(version)]
#[command(about = "Command-line client for the Certfix management API", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default: ~/.certfix/config.toml)
    #[arg(long, global = true, env = "CERTFIX_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the resources described in a YAML document
    Apply(ApplyArgs),

    /// Set the API endpoint and request settings
    Configure(ConfigureArgs),

    /// Read or change individual settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Authenticate with a personal access token
    Login(LoginArgs),

    /// Remove the stored session token
    Logout,

    /// Manage events
    #[command(subcommand)]
    Events(EventsCommand),

    /// Manage rotation policies
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Manage service groups
    #[command(subcommand)]
    ServiceGroups(ServiceGroupsCommand),

    /// Manage services
    #[command(subcommand)]
    Services(ServicesCommand),

    /// Manage service API keys
    #[command(subcommand)]
    Keys(KeysCommand),

    /// Manage relations between services
    #[command(subcommand)]
    Matrix(MatrixCommand),

    /// Manage certificates
    #[command(subcommand)]
    Cert(CertCommand),

    /// Synchronize certificates with the certificate authority
    Sync,

    /// Back up the certificate authority
    Backup,

    /// Manage integration keys for external event ingestion
    #[command(visible_alias = "ik")]
    IntegrationKeys(IntegrationKeysArgs),

    /// Manage instances
    #[command(subcommand)]
    Instance(InstanceCommand),

    /// Inspect agent instances registered with a service key
    #[command(subcommand)]
    Instances(InstancesCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

// ============================================================================
// Apply / configuration / session
// ============================================================================

#[derive(Args)]
pub struct ApplyArgs {
    /// YAML document to apply
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Show what would be created without calling the API
    #[arg(long)]
    pub dry_run: bool,

    /// Skip services whose hash already exists instead of failing
    #[arg(long)]
    pub skip_existing: bool,
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// API endpoint URL (http:// or https://)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Extra attempts for failed idempotent requests
    #[arg(long)]
    pub retry_attempts: Option<u32>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// List all configuration values
    List,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long, env = "CERTFIX_EMAIL")]
    pub email: String,

    /// Personal access token
    #[arg(short, long, env = "CERTFIX_TOKEN", hide_env_values = true)]
    pub token: String,
}

// ============================================================================
// Resource commands
// ============================================================================

#[derive(Clone, Copy, ValueEnum)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ResetUnit {
    Minutes,
    Hours,
    Days,
}

impl ResetUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events
    List {
        /// Only enabled events
        #[arg(short, long, conflicts_with = "severity")]
        enabled: bool,
        /// Only events with this severity
        #[arg(short, long, value_enum)]
        severity: Option<Severity>,
    },
    /// Show one event
    Get { id: String },
    /// Create an event
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, value_enum)]
        severity: Severity,
        /// Create the event disabled
        #[arg(long)]
        disabled: bool,
        /// Reset unit for the event counter
        #[arg(long, value_enum)]
        reset_unit: Option<ResetUnit>,
        /// Reset the counter after this many units without events
        #[arg(long, requires = "reset_unit")]
        reset_value: Option<i64>,
    },
    /// Change an event; only the given fields are sent
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, value_enum)]
        severity: Option<Severity>,
        /// Enable (true) or disable (false) the event
        #[arg(short, long)]
        enabled: Option<bool>,
        #[arg(long, value_enum)]
        reset_unit: Option<ResetUnit>,
        #[arg(long)]
        reset_value: Option<i64>,
    },
    /// Delete an event
    Delete { id: String },
    /// Enable an event
    Enable { id: String },
    /// Disable an event
    Disable { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Strategy {
    /// Rotate when events fire
    Eventos,
    /// Rotate gradually
    Gradual,
    /// Rotate inside a maintenance window
    JanelaManutencao,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eventos => "eventos",
            Self::Gradual => "gradual",
            Self::JanelaManutencao => "janela_manutencao",
        }
    }
}

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// List policies
    List,
    /// Show one policy
    Get { id: String },
    /// Create a policy
    Create(PolicyCreateArgs),
    /// Delete a policy
    Delete { id: String },
    /// Enable a policy
    Enable { id: String },
    /// Disable a policy
    Disable { id: String },
}

#[derive(Args)]
pub struct PolicyCreateArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long, value_enum)]
    pub strategy: Strategy,
    /// Create the policy disabled
    #[arg(long)]
    pub disabled: bool,
    #[arg(long, default_value = "*")]
    pub cron_minute: String,
    #[arg(long, default_value = "*")]
    pub cron_hour: String,
    #[arg(long, default_value = "*")]
    pub cron_day: String,
    #[arg(long, default_value = "*")]
    pub cron_month: String,
    #[arg(long, default_value = "*")]
    pub cron_weekday: String,
    /// Event that triggers rotation (eventos strategy)
    #[arg(long)]
    pub event_id: Option<String>,
    /// Events needed before rotating (eventos strategy)
    #[arg(long, default_value_t = 1)]
    pub event_total: u32,
}

#[derive(Subcommand)]
pub enum ServiceGroupsCommand {
    /// List service groups
    List,
    /// Show one service group
    Get { id: String },
    /// Create a service group
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Create the group disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Delete a service group
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ServicesCommand {
    /// List services
    List {
        /// Only active services
        #[arg(short, long, conflicts_with = "group")]
        active: bool,
        /// Only services in this group ID
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Show one service
    Get { hash: String },
    /// Create a service
    Create {
        #[arg(short, long)]
        name: String,
        /// Custom service hash (must be unique)
        #[arg(long)]
        hash: Option<String>,
        #[arg(short, long)]
        webhook: Option<String>,
        /// Service group ID
        #[arg(short, long)]
        group: Option<String>,
        /// Policy ID
        #[arg(short, long)]
        policy: Option<String>,
        /// Create the service inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Change a service; only the given fields are sent
    Update(ServiceUpdateArgs),
    /// Delete a service
    Delete { hash: String },
    /// Activate a service
    Activate { hash: String },
    /// Deactivate a service
    Deactivate { hash: String },
    /// Rotate certificates for one or more services
    Rotate {
        /// Service hashes, comma-separated or repeated
        #[arg(required = true, value_delimiter = ',')]
        hashes: Vec<String>,
    },
    /// Ask the API for a new service hash
    GenerateHash { name: String },
}

#[derive(Args)]
pub struct ServiceUpdateArgs {
    pub hash: String,
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub webhook: Option<String>,
    /// Service group ID
    #[arg(short, long)]
    pub group: Option<String>,
    /// Policy ID
    #[arg(short, long)]
    pub policy: Option<String>,
    /// Activate (true) or deactivate (false) the service
    #[arg(long)]
    pub active: Option<bool>,
    /// Remove the webhook URL
    #[arg(long, conflicts_with = "webhook")]
    pub clear_webhook: bool,
    /// Remove the service from its group
    #[arg(long, conflicts_with = "group")]
    pub clear_group: bool,
    /// Detach the rotation policy
    #[arg(long, conflicts_with = "policy")]
    pub clear_policy: bool,
}

#[derive(Subcommand)]
pub enum KeysCommand {
    /// List a service's keys
    List { service_hash: String },
    /// Show a service with all of its keys
    Get { service_hash: String },
    /// Add a key to a service
    Add {
        service_hash: String,
        #[arg(short, long)]
        name: String,
        /// Expiration period in days
        #[arg(short, long, default_value_t = 365)]
        expiration: u32,
    },
    /// Enable or disable a key
    Toggle { service_hash: String, key_id: String },
    /// Enable a key (no change if already enabled)
    Enable { service_hash: String, key_id: String },
    /// Disable a key (no change if already disabled)
    Disable { service_hash: String, key_id: String },
    /// Delete a key
    Delete { service_hash: String, key_id: String },
}

#[derive(Subcommand)]
pub enum MatrixCommand {
    /// List a service's relations
    List { service_hash: String },
    /// Relate a service to another
    Add {
        source_hash: String,
        /// Hash of the related service
        #[arg(short, long)]
        target: String,
        /// Relation type, validated by the API
        #[arg(long = "type")]
        relation_type: Option<String>,
    },
    /// Enable or disable a relation
    Toggle {
        service_hash: String,
        relation_id: String,
    },
    /// Delete a relation
    Delete {
        service_hash: String,
        relation_id: String,
    },
}

#[derive(Subcommand)]
pub enum CertCommand {
    /// Request a certificate
    Create {
        #[arg(long)]
        common_name: String,
        /// Certificate type
        #[arg(long = "type", default_value = "server")]
        cert_type: String,
        #[arg(long)]
        description: Option<String>,
        /// Validity in days
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        key_size: Option<u32>,
        /// Subject alternative names, comma-separated
        #[arg(long)]
        san: Option<String>,
    },
    /// List certificates, optionally by status
    List {
        #[arg(value_enum)]
        status: Option<CertStatus>,
        /// Days ahead, for `expiring`
        #[arg(required_if_eq("status", "expiring"))]
        days: Option<u32>,
    },
    /// Revoke a certificate by unique ID, or every certificate with `all`
    Revoke {
        #[arg(value_name = "UNIQUE_ID|all")]
        target: String,
        /// Also revoke certificates issued under this one
        #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
        cascade: bool,
        #[arg(short, long, default_value = "superseded")]
        reason: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CertStatus {
    Valid,
    Revoked,
    Expiring,
}

#[derive(Args)]
pub struct IntegrationKeysArgs {
    #[command(subcommand)]
    pub command: IntegrationKeysCommand,
}

#[derive(Subcommand)]
pub enum IntegrationKeysCommand {
    /// List integration keys
    List,
    /// Create an integration key; the secret is shown once
    Create {
        name: String,
        /// Expiration in days (0 = never)
        #[arg(short, long = "expires-in", default_value_t = 0)]
        expires_in: u32,
    },
    /// Delete an integration key
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// Create an instance
    Create {
        name: String,
        #[arg(short = 't', long = "type", default_value = "standard")]
        instance_type: String,
        #[arg(short, long, default_value = "us-east-1")]
        region: String,
    },
    /// List instances
    List,
    /// Delete an instance
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum InstancesCommand {
    /// List agent instances registered with a service key
    List { key_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "certfix",
            "apply",
            "infra.yaml",
            "--dry-run",
            "--skip-existing",
        ])
        .unwrap();

        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.file, PathBuf::from("infra.yaml"));
                assert!(args.dry_run);
                assert!(args.skip_existing);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["certfix", "logout", "-vv", "--config", "/tmp/c.toml"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_rotate_accepts_comma_list() {
        let cli = Cli::try_parse_from(["certfix", "services", "rotate", "a,b", "c"]).unwrap();
        match cli.command {
            Command::Services(ServicesCommand::Rotate { hashes }) => {
                assert_eq!(hashes, vec!["a", "b", "c"]);
            }
            _ => panic!("expected services rotate"),
        }
    }

    #[test]
    fn test_cert_list_expiring_requires_days() {
        assert!(Cli::try_parse_from(["certfix", "cert", "list", "expiring"]).is_err());

        let cli = Cli::try_parse_from(["certfix", "cert", "list", "expiring", "30"]).unwrap();
        match cli.command {
            Command::Cert(CertCommand::List { status, days }) => {
                assert!(status == Some(CertStatus::Expiring));
                assert_eq!(days, Some(30));
            }
            _ => panic!("expected cert list"),
        }
    }

    #[test]
    fn test_cert_revoke_defaults() {
        let cli = Cli::try_parse_from(["certfix", "cert", "revoke", "all"]).unwrap();
        match cli.command {
            Command::Cert(CertCommand::Revoke {
                target,
                cascade,
                reason,
            }) => {
                assert_eq!(target, "all");
                assert!(cascade);
                assert_eq!(reason, "superseded");
            }
            _ => panic!("expected cert revoke"),
        }

        let cli =
            Cli::try_parse_from(["certfix", "cert", "revoke", "c-1", "--cascade", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cert(CertCommand::Revoke { cascade: false, .. })
        ));
    }

    #[test]
    fn test_integration_keys_alias() {
        let cli = Cli::try_parse_from(["certfix", "ik", "create", "ci", "-e", "90"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::IntegrationKeys(IntegrationKeysArgs {
                command: IntegrationKeysCommand::Create { expires_in: 90, .. }
            })
        ));
    }

    #[test]
    fn test_service_update_clear_conflicts_with_value() {
        assert!(
            Cli::try_parse_from([
                "certfix",
                "services",
                "update",
                "svc",
                "--webhook",
                "https://hook",
                "--clear-webhook",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_strategy_value_names() {
        let cli = Cli::try_parse_from([
            "certfix",
            "policy",
            "create",
            "-n",
            "nightly",
            "-s",
            "janela-manutencao",
        ])
        .unwrap();
        match cli.command {
            Command::Policy(PolicyCommand::Create(args)) => {
                assert_eq!(args.strategy.as_str(), "janela_manutencao");
                assert_eq!(args.cron_minute, "*");
            }
            _ => panic!("expected policy create"),
        }
    }
}
