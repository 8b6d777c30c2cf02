use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::ids::{AccountId, DocumentId, InternId};
use crate::internship::review::ReviewStatus;
use crate::storage::UnknownVariant;

/// Pre-deployment and completion requirements an intern submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    ParentalConsent,
    MedicalCertificate,
    InternshipAgreement,
    EndorsementLetter,
    AcceptanceLetter,
    TrainingPlan,
    CertificateOfCompletion,
}

impl DocumentKind {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Resume,
            Self::ParentalConsent,
            Self::MedicalCertificate,
            Self::InternshipAgreement,
            Self::EndorsementLetter,
            Self::AcceptanceLetter,
            Self::TrainingPlan,
            Self::CertificateOfCompletion,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::ParentalConsent => "parental_consent",
            Self::MedicalCertificate => "medical_certificate",
            Self::InternshipAgreement => "internship_agreement",
            Self::EndorsementLetter => "endorsement_letter",
            Self::AcceptanceLetter => "acceptance_letter",
            Self::TrainingPlan => "training_plan",
            Self::CertificateOfCompletion => "certificate_of_completion",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Resume => "Resume / Curriculum Vitae",
            Self::ParentalConsent => "Parental Consent",
            Self::MedicalCertificate => "Medical Certificate",
            Self::InternshipAgreement => "Student Internship Agreement",
            Self::EndorsementLetter => "Endorsement Letter",
            Self::AcceptanceLetter => "Acceptance Letter",
            Self::TrainingPlan => "Training Plan",
            Self::CertificateOfCompletion => "Certificate of Completion",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

/// File types accepted for requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentMedia {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentMedia {
    /// Uses the declared content type, falling back to the file extension
    /// when the client sent none or a generic binary type.
    pub fn detect(content_type: Option<&str>, file_name: &str) -> Result<Self, PortalError> {
        let declared = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                value
                    .parse::<mime::Mime>()
                    .map_err(|_| PortalError::UnsupportedMedia(value.to_string()))
            })
            .transpose()?
            .filter(|mime| *mime != mime::APPLICATION_OCTET_STREAM);
        let media = match declared {
            Some(mime) => mime,
            None => mime_guess::from_path(file_name)
                .first()
                .ok_or_else(|| PortalError::UnsupportedMedia(file_name.to_string()))?,
        };

        match media.essence_str() {
            "application/pdf" => Ok(Self::Pdf),
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            other => Err(PortalError::UnsupportedMedia(other.to_string())),
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Checks the leading magic bytes against the detected type.
    pub fn matches(self, bytes: &[u8]) -> bool {
        match self {
            Self::Pdf => bytes.starts_with(b"%PDF-"),
            Self::Png => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        }
    }
}

/// Stored requirement metadata; the bytes live in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub intern_id: InternId,
    pub kind: DocumentKind,
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub storage_key: String,
    pub size_bytes: u64,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<AccountId>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Row written on upload; replaces any earlier file of the same kind.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub intern_id: InternId,
    pub kind: DocumentKind,
    pub file_name: String,
    pub content_type: &'static str,
    pub storage_key: String,
    pub size_bytes: u64,
}

/// Raw upload as received over HTTP.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    Missing,
    Pending,
    Approved,
    Rejected,
}

impl From<ReviewStatus> for ChecklistStatus {
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Pending => Self::Pending,
            ReviewStatus::Approved => Self::Approved,
            ReviewStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub status: ChecklistStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub intern_id: InternId,
    pub items: Vec<ChecklistItem>,
    pub approved: usize,
    pub total: usize,
    pub percent_complete: u8,
}

impl Checklist {
    pub fn build(intern_id: InternId, documents: Vec<Document>) -> Self {
        let items: Vec<ChecklistItem> = DocumentKind::ordered()
            .into_iter()
            .map(|kind| {
                let document = documents.iter().find(|doc| doc.kind == kind).cloned();
                ChecklistItem {
                    kind,
                    label: kind.label(),
                    status: document
                        .as_ref()
                        .map_or(ChecklistStatus::Missing, |doc| doc.status.into()),
                    document,
                }
            })
            .collect();
        let approved = items
            .iter()
            .filter(|item| item.status == ChecklistStatus::Approved)
            .count();
        let total = items.len();
        let percent_complete = u8::try_from(approved * 100 / total).unwrap_or(100);
        Self {
            intern_id,
            items,
            approved,
            total,
            percent_complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.approved == self.total
    }
}

/// Pending document with enough intern context for a review queue.
#[derive(Debug, Clone, Serialize)]
pub struct PendingDocument {
    #[serde(flatten)]
    pub document: Document,
    pub student_number: String,
    pub intern_name: String,
}
