mod auth;
mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit settings file from `--config`
    pub config_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
    };

    match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Configure(args) => commands::configure::run(&ctx, &args),
        Command::Config(cmd) => commands::configure::config(&ctx, cmd),
        Command::Login(args) => commands::login::login(&ctx, &args),
        Command::Logout => commands::login::logout(&ctx),
        Command::Events(cmd) => commands::events::run(&ctx, cmd),
        Command::Policy(cmd) => commands::policies::run(&ctx, cmd),
        Command::ServiceGroups(cmd) => commands::service_groups::run(&ctx, cmd),
        Command::Services(cmd) => commands::services::run(&ctx, cmd),
        Command::Keys(cmd) => commands::keys::run(&ctx, cmd),
        Command::Matrix(cmd) => commands::matrix::run(&ctx, cmd),
        Command::Cert(cmd) => commands::certs::run(&ctx, cmd),
        Command::Sync => commands::certs::sync(&ctx),
        Command::Backup => commands::certs::backup(&ctx),
        Command::IntegrationKeys(args) => commands::integration_keys::run(&ctx, args.command),
        Command::Instance(cmd) => commands::instances::instance(&ctx, cmd),
        Command::Instances(cmd) => commands::instances::by_key(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "certfix", &mut io::stdout());
            Ok(())
        }
        Command::Version => {
            println!("certfix {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
