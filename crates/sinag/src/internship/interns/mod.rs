//! Student interns: enrollment, placement and the status lifecycle.

pub mod domain;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;


pub use domain::{
    Enrollment, Intern, InternDraft, InternFilter, InternStatus, InternView, PlacementRequest,
    ProfileUpdate,
};
pub use repository::{InternQuery, InternRepository, PlacementOutcome};
pub use roster::ImportReport;
pub use router::intern_routes;
pub use service::InternService;
