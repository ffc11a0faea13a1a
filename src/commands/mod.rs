// Shop Track - Commands Module
// The discrete event surface over the core, organized by domain. A UI (or
// the CLI) holds one AppState and feeds it events; all mutable state lives
// here and is only touched from the caller's loop.

pub mod auth;
pub mod diagnostics;
pub mod listing;
pub mod vehicles;


use std::path::Path;
use std::sync::Arc;

use crate::auth::{AuthProvider, KeychainAuthProvider, Session};
use crate::blob::{BlobStore, FileBlobStore};
use crate::constants::{DEFAULT_PAGE_SIZE, PAGE_SIZE_SETTING};
use crate::error::Result;
use crate::form::FormModel;
use crate::list::ListViewModel;
use crate::repo::RecordRepository;
use crate::store::documents::DocumentStore;

/// Shared application state: one open store plus the form and list view
/// models bound to it.
pub struct AppState {
    pub repo: RecordRepository,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Box<dyn AuthProvider>,
    pub session: Option<Session>,
    pub form: FormModel,
    pub list: ListViewModel,
}

impl AppState {
    /// Open (creating if needed) the store at `root` and wire up the models.
    pub fn open(root: &Path) -> Result<Self> {
        let store = DocumentStore::open(root)?;
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(root));
        let auth: Box<dyn AuthProvider> = Box::new(KeychainAuthProvider);
        Self::with_providers(store, blobs, auth)
    }

    /// Wire up models over explicit collaborators (tests, embedding).
    pub fn with_providers(
        store: DocumentStore,
        blobs: Arc<dyn BlobStore>,
        auth: Box<dyn AuthProvider>,
    ) -> Result<Self> {
        let page_size = configured_page_size(&store)?;
        let repo = RecordRepository::new(store);
        let list = ListViewModel::attach(&repo, page_size)?;

        Ok(Self {
            repo,
            blobs,
            auth,
            session: None,
            form: FormModel::new(),
            list,
        })
    }
}

/// List page size from store settings, falling back to the default.
fn configured_page_size(store: &DocumentStore) -> Result<usize> {
    let size = store
        .get_setting(PAGE_SIZE_SETTING)?
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    Ok(size)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::MemoryAuthProvider;
    use crate::model::VehicleRecord;
    use tempfile::TempDir;

    /// Fresh store in a temp dir with one registered staff account.
    pub fn open_state() -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::open(tmp.path()).unwrap();
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(tmp.path()));

        let auth = MemoryAuthProvider::new();
        auth.register("staff@taller.test", "hunter22").unwrap();

        let state = AppState::with_providers(store, blobs, Box::new(auth)).unwrap();
        (tmp, state)
    }

    /// Insert a minimal record directly through the repository.
    pub fn seed_vehicle(state: &AppState, plate: &str, brand: &str) -> String {
        let record = VehicleRecord {
            id: None,
            plate: plate.to_string(),
            brand: brand.to_string(),
            owner_name: "owner".to_string(),
            parts: Vec::new(),
        };
        state.repo.insert(&record).unwrap()
    }
}
