use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use sinag::auth::TokenIssuer;
use sinag::config::AppConfig;
use sinag::error::{AppError, PortalError};
use sinag::internship::documents::DocumentVault;
use sinag::{Portal, SqliteStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the database and upload vault named by the configuration and wires
/// every portal service over them.
pub(crate) fn open_portal(config: &AppConfig) -> Result<Portal<SqliteStore>, AppError> {
    let store = Arc::new(SqliteStore::open(&config.storage.database_path)?);
    let vault = DocumentVault::open(&config.storage.upload_dir).map_err(PortalError::from)?;
    let tokens = Arc::new(TokenIssuer::from_config(&config.auth));
    Ok(Portal::new(
        store,
        tokens,
        Arc::new(vault),
        &config.internship,
        config.storage.max_upload_bytes,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(
            parse_date(" 2025-06-02 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 2).expect("date"))
        );
        let err = parse_date("06/02/2025").expect_err("not iso");
        assert!(err.contains("YYYY-MM-DD"));
    }
}
