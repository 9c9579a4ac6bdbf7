//! `certfix configure` and `certfix config`.

use crate::Context;
use crate::cli::{ConfigCommand, ConfigureArgs};
use crate::config::{Settings, validate_url};
use crate::{paths, ui};
use anyhow::{Result, bail};

pub fn run(ctx: &Context, args: &ConfigureArgs) -> Result<()> {
    let path = paths::config_file(ctx.config_path.as_deref())?;
    let mut settings = Settings::load(&path)?;

    if args.api_url.is_none() && args.timeout.is_none() && args.retry_attempts.is_none() {
        ui::header("Current Configuration");
        let mut rows = vec![("file", path.display().to_string())];
        rows.extend(settings.entries());
        ui::fields(&rows);
        println!();
        ui::dim("Pass --api-url, --timeout or --retry-attempts to change them");
        return Ok(());
    }

    if let Some(url) = &args.api_url {
        validate_url(url).map_err(|e| e.context("Invalid API URL"))?;
        settings.set("endpoint", url)?;
        super::done(ctx, &format!("API URL configured: {}", settings.endpoint));
    }

    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            bail!("timeout must be greater than 0");
        }
        settings.timeout = timeout;
        super::done(ctx, &format!("Timeout configured: {timeout} seconds"));
    }

    if let Some(retries) = args.retry_attempts {
        settings.retry_attempts = retries;
        super::done(ctx, &format!("Retry attempts configured: {retries}"));
    }

    settings.save(&path)?;
    log::info!("Configuration saved to {}", path.display());
    Ok(())
}

pub fn config(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    let path = paths::config_file(ctx.config_path.as_deref())?;

    match cmd {
        ConfigCommand::Set { key, value } => {
            let mut settings = Settings::load(&path)?;
            settings.set(&key, &value)?;
            settings.save(&path)?;
            super::done(ctx, &format!("Configuration updated: {key} = {value}"));
        }
        ConfigCommand::Get { key } => {
            let settings = super::settings(ctx)?;
            println!("{} = {}", key, settings.get(&key)?);
        }
        ConfigCommand::List => {
            let settings = super::settings(ctx)?;
            for (key, value) in settings.entries() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
