// Image upload orchestration for form submission.
//
// Every pending part image uploads on its own thread; the batch settles only
// after every thread joins. A single failure fails the whole batch so a
// half-resolved parts list can never reach the store. Blobs already uploaded
// by the time a sibling fails stay on disk (no cleanup pass).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Utc;

use crate::blob::BlobStore;
use crate::constants::PARTS_PREFIX;
use crate::error::{Result, ShopTrackError};
use crate::model::{ImageRef, PartRecord};

/// Process-wide counter so two images submitted in the same millisecond never
/// derive the same storage path.
static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Storage key for one pending image: intake timestamp, disambiguating
/// sequence, original filename.
fn derive_storage_path(file_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}/{}_{}_{}", PARTS_PREFIX, millis, seq, file_name)
}

/// Resolve every pending image in `parts` to a retrieval URL.
///
/// Parts whose image is already a URL, or absent, pass through unchanged;
/// re-saving an edited record never re-uploads an untouched photo. Returns
/// the fully-resolved list, or the first upload error once all uploads have
/// settled; the caller must not persist anything on error.
pub fn resolve_part_images(
    parts: &[PartRecord],
    blobs: &Arc<dyn BlobStore>,
) -> Result<Vec<PartRecord>> {
    // Fan out: one upload thread per pending image.
    let mut handles: Vec<(usize, thread::JoinHandle<Result<String>>)> = Vec::new();
    for (index, part) in parts.iter().enumerate() {
        let local = match &part.image_ref {
            Some(ImageRef::Pending { pending }) => pending.clone(),
            _ => continue,
        };
        let blobs = Arc::clone(blobs);

        handles.push((
            index,
            thread::spawn(move || {
                let file_name = local
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        ShopTrackError::Upload(format!("no usable filename: {}", local.display()))
                    })?
                    .to_string();

                let bytes = std::fs::read(&local).map_err(|e| {
                    ShopTrackError::Upload(format!("read {}: {}", local.display(), e))
                })?;

                let storage_path = derive_storage_path(&file_name);
                blobs
                    .upload(&storage_path, &bytes)
                    .map_err(|e| ShopTrackError::Upload(format!("{}: {}", file_name, e)))?;
                blobs
                    .download_url(&storage_path)
                    .map_err(|e| ShopTrackError::Upload(format!("{}: {}", file_name, e)))
            }),
        ));
    }

    // Fan in: join every upload before reporting anything.
    let mut resolved: Vec<(usize, String)> = Vec::new();
    let mut first_error: Option<ShopTrackError> = None;
    for (index, handle) in handles {
        match handle.join() {
            Ok(Ok(url)) => resolved.push((index, url)),
            Ok(Err(e)) => {
                log::warn!("Part image upload failed: {}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(_) => {
                if first_error.is_none() {
                    first_error = Some(ShopTrackError::Upload("upload thread panicked".into()));
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let mut out = parts.to_vec();
    for (index, url) in resolved {
        out[index].image_ref = Some(ImageRef::Url(url));
    }
    Ok(out)
}
