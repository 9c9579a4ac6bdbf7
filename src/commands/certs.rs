//! `certfix cert`

use super::{Session, done, show};
use crate::Context;
use crate::cli::{CertCommand, CertStatus};
use crate::ui;
use anyhow::{Context as _, Result};
use restkit::types::{CertificateFilter, CertificatePayload, Revocation};
use serde_json::{Map, Value};

/// Columns kept when listing certificates by status
const SUMMARY_FIELDS: &[&str] = &[
    "app_name",
    "unique_id",
    "client_id",
    "certificate_type",
    "expiration_date",
    "status",
    "revocation_date",
];

pub fn run(ctx: &Context, cmd: CertCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    let gateway = session.gateway();

    match cmd {
        CertCommand::Create {
            common_name,
            cert_type,
            description,
            days,
            key_size,
            san,
        } => {
            let payload = CertificatePayload {
                common_name,
                cert_type,
                description,
                days,
                key_size,
                san,
            };
            let body = gateway
                .create_certificate(&payload)
                .context("Failed to create certificate")?;
            done(
                ctx,
                &format!("Certificate for {} requested", payload.common_name),
            );
            show(&body);
        }
        CertCommand::List { status, days } => {
            let selection = filter(status, days);
            let body = gateway
                .list_certificates(selection)
                .context("Failed to list certificates")?;
            if selection == CertificateFilter::All {
                show(&body);
            } else {
                show(&summarize(&body));
            }
        }
        CertCommand::Revoke {
            target,
            cascade,
            reason,
        } => {
            if target == "all" {
                let body = gateway
                    .revoke_all_certificates(&reason)
                    .context("Failed to revoke certificates")?;
                done(ctx, "All certificates revoked");
                show(&body);
            } else {
                gateway
                    .revoke_certificate(&target, &Revocation { cascade, reason })
                    .with_context(|| format!("Failed to revoke certificate {target}"))?;
                done(ctx, &format!("Certificate {target} revoked"));
            }
        }
    }
    Ok(())
}

/// `certfix sync`
pub fn sync(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    log::info!("Synchronizing certificates");
    let body = session
        .gateway()
        .sync_certificates()
        .context("Failed to synchronize certificates")?;

    if body["success"].as_bool() == Some(true) {
        done(ctx, "Synchronization successful");
    } else {
        ui::error("Synchronization failed");
    }
    if let Some(synced) = body["synced"].as_u64() {
        ui::fields(&[("synced", format!("{synced} certificates"))]);
    }
    Ok(())
}

/// `certfix backup`
pub fn backup(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    log::info!("Creating CA backup");
    let body = session
        .gateway()
        .create_backup()
        .context("Failed to create backup")?;

    match body["status"].as_str() {
        Some(status) => done(ctx, &format!("Backup status: {status}")),
        None => done(ctx, "Backup completed"),
    }
    Ok(())
}

fn filter(status: Option<CertStatus>, days: Option<u32>) -> CertificateFilter {
    match status {
        None => CertificateFilter::All,
        Some(CertStatus::Valid) => CertificateFilter::Valid,
        Some(CertStatus::Revoked) => CertificateFilter::Revoked,
        Some(CertStatus::Expiring) => CertificateFilter::Expiring(days.unwrap_or(30)),
    }
}

/// Trim each listed certificate down to the summary columns
fn summarize(body: &Value) -> Value {
    let items = restkit::list_items(body, "certificates")
        .iter()
        .map(|cert| {
            let row: Map<String, Value> = SUMMARY_FIELDS
                .iter()
                .filter_map(|&field| cert.get(field).map(|v| (field.to_string(), v.clone())))
                .collect();
            Value::Object(row)
        })
        .collect();
    Value::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_from_status() {
        assert!(filter(None, None) == CertificateFilter::All);
        assert!(filter(Some(CertStatus::Revoked), None) == CertificateFilter::Revoked);
        assert!(filter(Some(CertStatus::Expiring), Some(7)) == CertificateFilter::Expiring(7));
    }

    #[test]
    fn test_summarize_keeps_summary_columns() {
        let body = json!([{
            "app_name": "billing",
            "unique_id": "c-1",
            "status": "valid",
            "certificate_pem": "-----BEGIN CERTIFICATE-----",
            "private_key": "secret"
        }]);
        assert_eq!(
            summarize(&body),
            json!([{"app_name": "billing", "unique_id": "c-1", "status": "valid"}])
        );
    }

    #[test]
    fn test_summarize_wrapped_list() {
        let body = json!({"certificates": [{"unique_id": "c-2", "client_id": 4}]});
        assert_eq!(summarize(&body), json!([{"unique_id": "c-2", "client_id": 4}]));
        assert_eq!(summarize(&json!({})), json!([]));
    }
}
