// Vehicle intake form model.
//
// Holds the editable top-level fields plus the ordered parts list. Everything
// here is in-memory until submit(); nothing touches the store or the blob
// store before validation passes.

use std::sync::Arc;

use crate::blob::BlobStore;
use crate::error::{Result, ShopTrackError};
use crate::model::{PartRecord, VehicleRecord};
use crate::repo::RecordRepository;
use crate::upload;

#[derive(Debug, Default)]
pub struct FormModel {
    /// Set when editing an existing record; submit() updates instead of
    /// inserting. Immutable for the lifetime of the edit.
    record_id: Option<String>,
    pub plate: String,
    pub brand: String,
    pub owner_name: String,
    parts: Vec<PartRecord>,
}

impl FormModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    /// Append a blank part entry and return it for editing.
    pub fn add_part(&mut self) -> &mut PartRecord {
        self.parts.push(PartRecord::default());
        self.parts.last_mut().unwrap()
    }

    /// Remove the entry at `index`, preserving the order of the rest.
    pub fn remove_part(&mut self, index: usize) -> Result<PartRecord> {
        if index >= self.parts.len() {
            return Err(ShopTrackError::PartIndexOutOfRange {
                index,
                len: self.parts.len(),
            });
        }
        Ok(self.parts.remove(index))
    }

    pub fn part_mut(&mut self, index: usize) -> Result<&mut PartRecord> {
        let len = self.parts.len();
        self.parts
            .get_mut(index)
            .ok_or(ShopTrackError::PartIndexOutOfRange { index, len })
    }

    /// Load a persisted record for editing. Discards any unsaved edits: every
    /// top-level field and the whole parts list are overwritten, not merged.
    pub fn load_from(&mut self, record: &VehicleRecord) {
        self.record_id = record.id.clone();
        self.plate = record.plate.clone();
        self.brand = record.brand.clone();
        self.owner_name = record.owner_name.clone();
        self.parts = record.parts.clone();
    }

    /// Reset to an empty new-vehicle form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether every required top-level field and every required field of
    /// every part is non-empty. Never mutates state.
    pub fn validate(&self) -> bool {
        !self.plate.trim().is_empty()
            && !self.brand.trim().is_empty()
            && !self.owner_name.trim().is_empty()
            && self.parts.iter().all(PartRecord::is_complete)
    }

    /// Snapshot the current form state as a record.
    pub fn to_record(&self) -> VehicleRecord {
        VehicleRecord {
            id: self.record_id.clone(),
            plate: self.plate.clone(),
            brand: self.brand.clone(),
            owner_name: self.owner_name.clone(),
            parts: self.parts.clone(),
        }
    }

    /// Validate, resolve pending part images, then insert or update.
    ///
    /// Order is fixed: no store write happens until every upload has settled,
    /// and nothing at all is written when validation or any upload fails. On
    /// success the form resets for the next intake and the record id (newly
    /// assigned or existing) is returned.
    pub fn submit(
        &mut self,
        repo: &RecordRepository,
        blobs: &Arc<dyn BlobStore>,
    ) -> Result<String> {
        if !self.validate() {
            return Err(ShopTrackError::Validation(
                "form has empty required fields".to_string(),
            ));
        }

        let mut record = self.to_record();
        record.parts = upload::resolve_part_images(&record.parts, blobs)?;

        let id = match &self.record_id {
            Some(id) => {
                repo.update(id, &record)?;
                id.clone()
            }
            None => repo.insert(&record)?,
        };

        log::info!("Saved vehicle {} ({})", record.plate, id);
        self.clear();
        Ok(id)
    }
}
