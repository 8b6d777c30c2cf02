use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    Checklist, Document, DocumentKind, DocumentMedia, PendingDocument, Upload, UploadRecord,
};
use super::repository::DocumentRepository;
use super::vault::DocumentVault;
use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::ids::{DocumentId, InternId};
use crate::internship::interns::{Intern, InternFilter, InternRepository};
use crate::internship::interns::service::scoped_query;
use crate::internship::review::{ReviewRequest, ReviewStatus};
use crate::storage::RepositoryError;

const MAX_FILE_NAME_LEN: usize = 200;

pub struct DocumentService<R> {
    repository: Arc<R>,
    vault: Arc<DocumentVault>,
    max_upload_bytes: usize,
}

impl<R> DocumentService<R>
where
    R: DocumentRepository + InternRepository + 'static,
{
    pub fn new(repository: Arc<R>, vault: Arc<DocumentVault>, max_upload_bytes: usize) -> Self {
        Self {
            repository,
            vault,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn upload(
        &self,
        session: &Session,
        intern_id: InternId,
        kind: DocumentKind,
        upload: Upload,
        now: DateTime<Utc>,
    ) -> Result<Document, PortalError> {
        session.require(&[Role::Intern])?;
        if session.intern_id != Some(intern_id) {
            return Err(PortalError::forbidden("interns can only upload their own documents"));
        }
        self.load_intern(intern_id)?;

        if upload.bytes.is_empty() {
            return Err(PortalError::validation("uploaded file is empty"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(PortalError::PayloadTooLarge {
                limit: self.max_upload_bytes,
            });
        }
        let file_name = sanitize_file_name(&upload.file_name)?;
        let media = DocumentMedia::detect(upload.content_type.as_deref(), &file_name)?;
        if !media.matches(&upload.bytes) {
            return Err(PortalError::UnsupportedMedia(format!(
                "{} content does not match {}",
                file_name,
                media.content_type()
            )));
        }

        let previous = self.repository.fetch_document_of_kind(intern_id, kind)?;
        if previous
            .as_ref()
            .is_some_and(|doc| doc.status == ReviewStatus::Approved)
        {
            return Err(PortalError::conflict(format!(
                "{} is already approved and cannot be replaced",
                kind.label()
            )));
        }

        let storage_key = self.vault.store(intern_id, kind, media, &upload.bytes)?;
        let record = UploadRecord {
            intern_id,
            kind,
            file_name,
            content_type: media.content_type(),
            storage_key,
            size_bytes: upload.bytes.len() as u64,
        };
        let saved = match self.repository.save_document(&record, now) {
            Ok(saved) => saved,
            Err(err) => {
                if let Err(cleanup) = self.vault.remove(&record.storage_key) {
                    warn!(error = %cleanup, "orphaned upload left in vault");
                }
                return Err(match err {
                    RepositoryError::Conflict => PortalError::conflict(format!(
                        "{} is already approved and cannot be replaced",
                        kind.label()
                    )),
                    other => other.into(),
                });
            }
        };
        if let Some(previous) = previous {
            if let Err(err) = self.vault.remove(&previous.storage_key) {
                warn!(error = %err, document = %previous.id, "replaced file not removed");
            }
        }

        info!(intern = %intern_id, kind = %kind, document = %saved.id, "document uploaded");
        Ok(saved)
    }

    pub fn review(
        &self,
        session: &Session,
        id: DocumentId,
        request: ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<Document, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let document = self.load_document(id)?;
        let intern = self.load_intern(document.intern_id)?;
        session.ensure_manage(&intern)?;
        if document.status != ReviewStatus::Pending {
            return Err(PortalError::conflict(format!(
                "document is already {}",
                document.status
            )));
        }
        let verdict = request.into_verdict()?;
        let reviewed =
            self.repository
                .record_document_review(id, &verdict, session.account_id, now)?;
        info!(
            document = %id,
            intern = %intern.id,
            status = %reviewed.status,
            reviewer = %session.account_id,
            "document reviewed"
        );
        Ok(reviewed)
    }

    pub fn checklist(&self, session: &Session, intern_id: InternId) -> Result<Checklist, PortalError> {
        let intern = self.load_intern(intern_id)?;
        session.ensure_view(&intern)?;
        self.checklist_for(&intern)
    }

    pub(crate) fn checklist_for(&self, intern: &Intern) -> Result<Checklist, PortalError> {
        let documents = self.repository.list_documents(intern.id)?;
        Ok(Checklist::build(intern.id, documents))
    }

    pub fn download(
        &self,
        session: &Session,
        id: DocumentId,
    ) -> Result<(Document, Vec<u8>), PortalError> {
        let document = self.load_document(id)?;
        let intern = self.load_intern(document.intern_id)?;
        session.ensure_view(&intern)?;
        let bytes = self.vault.read(&document.storage_key)?;
        Ok((document, bytes))
    }

    pub fn pending_reviews(&self, session: &Session) -> Result<Vec<PendingDocument>, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let Some(scope) = scoped_query(session, InternFilter::default()) else {
            return Ok(Vec::new());
        };
        Ok(self.repository.list_pending_documents(&scope)?)
    }

    fn load_document(&self, id: DocumentId) -> Result<Document, PortalError> {
        self.repository
            .fetch_document(id)?
            .ok_or(PortalError::NotFound("document"))
    }

    fn load_intern(&self, id: InternId) -> Result<Intern, PortalError> {
        self.repository
            .fetch_intern(id)?
            .ok_or(PortalError::NotFound("intern"))
    }
}

/// Keeps only the final path segment and drops control characters.
fn sanitize_file_name(raw: &str) -> Result<String, PortalError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .filter(|ch| !ch.is_control() && *ch != '"')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(PortalError::validation("a file name is required"));
    }
    Ok(cleaned.chars().take(MAX_FILE_NAME_LEN).collect())
}
