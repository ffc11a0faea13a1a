// Record model types shared by the form, repository, and list view.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A part's photo reference.
///
/// Starts out absent, may become a local file pending upload, and ends up as a
/// resolved retrieval URL once stored. A resolved URL is never demoted back to
/// pending; re-saving a record with an untouched URL keeps it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// Stable retrieval URL in the blob store. Serializes as a plain string.
    Url(String),
    /// Local file selected for upload. Only ever lives in form state; the
    /// submit pipeline resolves it before anything reaches the store.
    Pending { pending: PathBuf },
}

impl ImageRef {
    pub fn pending(path: impl Into<PathBuf>) -> Self {
        ImageRef::Pending { pending: path.into() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        ImageRef::Url(url.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ImageRef::Pending { .. })
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageRef::Url(url) => Some(url),
            ImageRef::Pending { .. } => None,
        }
    }
}

/// One replacement-part entry on a vehicle record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_date: Option<String>,
}

impl PartRecord {
    /// Both required fields filled in (whitespace-only counts as empty).
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.status.trim().is_empty()
    }
}

/// A tracked vehicle: identifying fields plus its ordered parts list.
/// `id` is absent until the store assigns one on first insert and is
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub plate: String,
    pub brand: String,
    pub owner_name: String,
    #[serde(default)]
    pub parts: Vec<PartRecord>,
}
