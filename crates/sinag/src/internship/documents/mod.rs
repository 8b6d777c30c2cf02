//! Requirement documents: uploads, the review queue and the per-intern
//! checklist.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod vault;


pub use domain::{
    Checklist, ChecklistItem, ChecklistStatus, Document, DocumentKind, DocumentMedia,
    PendingDocument, Upload,
};
pub use repository::DocumentRepository;
pub use router::{document_routes, FILE_NAME_HEADER};
pub use service::DocumentService;
pub use vault::{DocumentVault, VaultError};
