//! Daily activity logs (the intern's DTR) and hours tracking.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{ActivityLog, HoursSummary, LogDraft, LogRange, LogTotals};
pub use repository::LogbookRepository;
pub use router::logbook_routes;
pub use service::LogbookService;
