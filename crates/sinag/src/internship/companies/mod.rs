//! Host training establishments and their Memoranda of Agreement.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Company, CompanyDraft, CompanyView, Moa, MoaStatus, Occupancy, ValidCompany};
pub use repository::CompanyRepository;
pub use router::company_routes;
pub use service::{CompanyService, MoaUpdate};
