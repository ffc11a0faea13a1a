// Shop Track - Diagnostics Commands
// Read-only health reports. Orphaned blobs (uploaded for submissions that
// never persisted, or left behind by deleted records) are listed, never
// removed.

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::Result;
use crate::store;

use super::AppState;

/// Blobs in the uploads folder that no persisted record references.
/// Paths are relative to the uploads root.
pub fn orphan_blobs(state: &AppState) -> Result<Vec<String>> {
    let uploads_root = store::get_uploads_path(state.repo.store().root());

    // Every URL the current records point at
    let mut referenced: HashSet<String> = HashSet::new();
    for record in state.repo.list_all()? {
        for part in &record.parts {
            if let Some(url) = part.image_ref.as_ref().and_then(|i| i.as_url()) {
                referenced.insert(url.to_string());
            }
        }
    }

    let mut orphans = Vec::new();
    for entry in WalkDir::new(&uploads_root).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let url = format!("file://{}", entry.path().display());
        if !referenced.contains(&url) {
            orphans.push(relative_key(entry.path(), &uploads_root));
        }
    }
    orphans.sort();
    Ok(orphans)
}

fn relative_key(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::open_state;
    use crate::model::ImageRef;

    #[test]
    fn unreferenced_blobs_are_reported_but_never_deleted() {
        let (tmp, mut state) = open_state();

        // One referenced blob, persisted the normal way
        state.form.plate = "ABC123".to_string();
        state.form.brand = "Toyota".to_string();
        state.form.owner_name = "J. Perez".to_string();
        let image = tmp.path().join("pad.jpg");
        std::fs::write(&image, b"photo").unwrap();
        let part = state.form.add_part();
        part.name = "brake pad".to_string();
        part.status = "pending".to_string();
        part.image_ref = Some(ImageRef::pending(&image));
        crate::commands::vehicles::submit(&mut state).unwrap();

        // One orphan, written straight into the uploads folder
        let uploads = store::get_uploads_path(state.repo.store().root());
        std::fs::create_dir_all(uploads.join("parts")).unwrap();
        std::fs::write(uploads.join("parts/999_9_orphan.jpg"), b"stray").unwrap();

        let orphans = orphan_blobs(&state).unwrap();
        assert_eq!(orphans, vec!["parts/999_9_orphan.jpg".to_string()]);
        assert!(uploads.join("parts/999_9_orphan.jpg").exists());
    }

    #[test]
    fn deleting_a_record_orphans_its_blobs() {
        let (tmp, mut state) = open_state();

        let image = tmp.path().join("rad.jpg");
        std::fs::write(&image, b"photo").unwrap();
        state.form.plate = "XYZ789".to_string();
        state.form.brand = "Nissan".to_string();
        state.form.owner_name = "M. Rojas".to_string();
        let part = state.form.add_part();
        part.name = "radiator".to_string();
        part.status = "arrived".to_string();
        part.image_ref = Some(ImageRef::pending(&image));
        let id = crate::commands::vehicles::submit(&mut state).unwrap();

        assert!(orphan_blobs(&state).unwrap().is_empty());

        // Delete does not cascade to blobs; the photo becomes an orphan
        crate::commands::listing::delete(&mut state, &id, true).unwrap();
        assert_eq!(orphan_blobs(&state).unwrap().len(), 1);
    }
}
