//! SINAG: internship placement, requirements, activity logs, evaluations
//! and reports for a university OJT office.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod ids;
pub mod internship;
pub mod reports;
pub mod storage;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{AppError, PortalError};
pub use http::portal_router;
pub use internship::{Portal, PortalState, Store};
pub use storage::SqliteStore;
