//! Single-issuance certificate records.

use crate::{EntitlementId, Fingerprint, Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// Default label for certificates issued without an explicit category
pub const DEFAULT_CERTIFICATE_CATEGORY: &str = "certificate";

/// Identifying fields of a certificate; at most one live record per tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateFields {
    pub recipient_name: String,
    pub course: String,
    /// Issuing institution as printed on the certificate
    pub issuer: String,
}

impl CertificateFields {
    pub fn new(
        recipient_name: impl Into<String>,
        course: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            recipient_name: recipient_name.into().trim().to_string(),
            course: course.into().trim().to_string(),
            issuer: issuer.into().trim().to_string(),
        }
    }

    /// Digest of the trimmed fields; surrounding whitespace never
    /// distinguishes two certificates
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_fields([
            self.recipient_name.trim(),
            self.course.trim(),
            self.issuer.trim(),
        ])
    }

    /// Name of the first blank field, if any
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("recipient_name", &self.recipient_name),
            ("course", &self.course),
            ("issuer", &self.issuer),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Certificate issuance request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub fields: CertificateFields,
    /// Free-form label (e.g. "diploma", "course-completion")
    pub category: String,
    pub metadata_uri: Option<String>,
}

impl CertificateRequest {
    pub fn new(fields: CertificateFields) -> Self {
        Self {
            fields,
            category: DEFAULT_CERTIFICATE_CATEGORY.to_string(),
            metadata_uri: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_metadata_uri(mut self, uri: impl Into<String>) -> Self {
        self.metadata_uri = Some(uri.into());
        self
    }
}

/// One minted certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: EntitlementId,
    pub holder: Principal,
    pub fields: CertificateFields,
    pub category: String,
    pub issued_at: Timestamp,
    /// Cleared by revocation; never set back
    pub valid: bool,
    pub revoked_at: Option<Timestamp>,
    pub metadata_uri: Option<String>,
    pub fingerprint: Fingerprint,
}
