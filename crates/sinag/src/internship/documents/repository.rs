use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{Document, DocumentKind, PendingDocument, UploadRecord};
use crate::ids::{AccountId, DocumentId, InternId};
use crate::internship::interns::InternQuery;
use crate::internship::review::{ReviewStatus, Verdict};
use crate::storage::{parse_column, RepositoryError, SqliteStore};

/// Storage abstraction for requirement documents.
pub trait DocumentRepository: Send + Sync {
    /// Inserts or replaces the intern's document of that kind, resetting it
    /// to pending. An approved document is never replaced; that write
    /// yields `Conflict`.
    fn save_document(
        &self,
        upload: &UploadRecord,
        now: DateTime<Utc>,
    ) -> Result<Document, RepositoryError>;
    fn fetch_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;
    fn fetch_document_of_kind(
        &self,
        intern_id: InternId,
        kind: DocumentKind,
    ) -> Result<Option<Document>, RepositoryError>;
    fn list_documents(&self, intern_id: InternId) -> Result<Vec<Document>, RepositoryError>;
    /// Settles a pending document; one already reviewed yields `Conflict`.
    fn record_document_review(
        &self,
        id: DocumentId,
        verdict: &Verdict,
        reviewer: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Document, RepositoryError>;
    /// Pending documents of interns matching the scope, oldest first.
    fn list_pending_documents(
        &self,
        scope: &InternQuery,
    ) -> Result<Vec<PendingDocument>, RepositoryError>;
}

const DOCUMENT_COLUMNS: &str = "d.id, d.intern_id, d.kind, d.file_name, d.content_type, \
     d.storage_key, d.size_bytes, d.status, d.remarks, d.reviewed_by, d.uploaded_at, d.reviewed_at";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let size: i64 = row.get(6)?;
    Ok(Document {
        id: row.get(0)?,
        intern_id: row.get(1)?,
        kind: parse_column(row, 2)?,
        file_name: row.get(3)?,
        content_type: row.get(4)?,
        storage_key: row.get(5)?,
        size_bytes: u64::try_from(size).unwrap_or_default(),
        status: parse_column(row, 7)?,
        remarks: row.get(8)?,
        reviewed_by: row.get(9)?,
        uploaded_at: row.get(10)?,
        reviewed_at: row.get(11)?,
    })
}

impl DocumentRepository for SqliteStore {
    fn save_document(
        &self,
        upload: &UploadRecord,
        now: DateTime<Utc>,
    ) -> Result<Document, RepositoryError> {
        let size = i64::try_from(upload.size_bytes)
            .map_err(|_| RepositoryError::Unavailable("document too large".to_string()))?;
        let changed = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (intern_id, kind, file_name, content_type, storage_key, \
                 size_bytes, status, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (intern_id, kind) DO UPDATE SET
                    file_name = excluded.file_name,
                    content_type = excluded.content_type,
                    storage_key = excluded.storage_key,
                    size_bytes = excluded.size_bytes,
                    status = excluded.status,
                    uploaded_at = excluded.uploaded_at,
                    remarks = NULL,
                    reviewed_by = NULL,
                    reviewed_at = NULL
                 WHERE documents.status <> ?9",
                params![
                    upload.intern_id,
                    upload.kind.as_str(),
                    upload.file_name,
                    upload.content_type,
                    upload.storage_key,
                    size,
                    ReviewStatus::Pending.as_str(),
                    now,
                    ReviewStatus::Approved.as_str(),
                ],
            )
        })?;
        if changed == 0 {
            return Err(RepositoryError::Conflict);
        }
        self.fetch_document_of_kind(upload.intern_id, upload.kind)?
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.id = ?1"),
                [id],
                document_from_row,
            )
            .optional()
        })
    }

    fn fetch_document_of_kind(
        &self,
        intern_id: InternId,
        kind: DocumentKind,
    ) -> Result<Option<Document>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents d \
                     WHERE d.intern_id = ?1 AND d.kind = ?2"
                ),
                params![intern_id, kind.as_str()],
                document_from_row,
            )
            .optional()
        })
    }

    fn list_documents(&self, intern_id: InternId) -> Result<Vec<Document>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.intern_id = ?1 ORDER BY d.id"
            ))?;
            let rows = stmt.query_map([intern_id], document_from_row)?;
            rows.collect()
        })
    }

    fn record_document_review(
        &self,
        id: DocumentId,
        verdict: &Verdict,
        reviewer: AccountId,
        now: DateTime<Utc>,
    ) -> Result<Document, RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE documents SET status = ?2, remarks = ?3, reviewed_by = ?4, reviewed_at = ?5
                 WHERE id = ?1 AND status = ?6",
                params![
                    id,
                    verdict.status.as_str(),
                    verdict.remarks,
                    reviewer,
                    now,
                    ReviewStatus::Pending.as_str(),
                ],
            )
        })?;
        match self.fetch_document(id)? {
            Some(document) if changed > 0 => Ok(document),
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list_pending_documents(
        &self,
        scope: &InternQuery,
    ) -> Result<Vec<PendingDocument>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS}, i.student_number, i.last_name, i.first_name
                 FROM documents d JOIN interns i ON i.id = d.intern_id
                 WHERE d.status = ?1
                   AND (?2 IS NULL OR i.program_id = ?2)
                   AND (?3 IS NULL OR i.company_id = ?3)
                   AND (?4 IS NULL OR i.id = ?4)
                 ORDER BY d.uploaded_at, d.id"
            ))?;
            let rows = stmt.query_map(
                params![
                    ReviewStatus::Pending.as_str(),
                    scope.program_id,
                    scope.company_id,
                    scope.intern_id,
                ],
                |row| {
                    let last_name: String = row.get(13)?;
                    let first_name: String = row.get(14)?;
                    Ok(PendingDocument {
                        document: document_from_row(row)?,
                        student_number: row.get(12)?,
                        intern_name: format!("{last_name}, {first_name}"),
                    })
                },
            )?;
            rows.collect()
        })
    }
}
