//! `certfix login` and `certfix logout`.

use crate::Context;
use crate::auth::{self, TokenData, TokenStore};
use crate::cli::LoginArgs;
use crate::ui;
use anyhow::{Result, bail};
use chrono::Utc;

pub fn login(ctx: &Context, args: &LoginArgs) -> Result<()> {
    let settings = super::settings(ctx)?;
    if settings.is_default_endpoint() {
        bail!("API endpoint not configured: run 'certfix configure --api-url <URL>' first");
    }

    log::info!("Authenticating {} at {}", args.email, settings.endpoint);
    let transport = settings.transport();
    let token = auth::login(&transport, &args.email, &args.token)?;

    let store = TokenStore::default_location()?;
    let data = TokenData::issued(token, Utc::now());
    store.save(&data)?;
    log::debug!("Token stored at {}", store.path().display());

    super::done(ctx, &format!("Logged in as {}", args.email));
    if !ctx.quiet {
        ui::dim(&format!(
            "Session valid until {}",
            data.expires_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    let store = TokenStore::default_location()?;
    if store.clear()? {
        log::debug!("Removed {}", store.path().display());
        super::done(ctx, "Logged out");
    } else if !ctx.quiet {
        ui::info("Already logged out");
    }
    Ok(())
}
