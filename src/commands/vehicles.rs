// Shop Track - Vehicle Commands
// Intake form events: add/remove part rows, load for edit, submit.

use crate::error::Result;
use crate::model::PartRecord;

use super::AppState;

/// Append a blank part row to the intake form.
pub fn add_part(state: &mut AppState) -> usize {
    state.form.add_part();
    state.form.parts().len() - 1
}

/// Remove the part row at `index`. Out-of-range indexes are an error.
pub fn remove_part(state: &mut AppState, index: usize) -> Result<PartRecord> {
    state.form.remove_part(index)
}

/// Load a persisted record into the form for editing, discarding any
/// unsaved edits.
pub fn edit(state: &mut AppState, id: &str) -> Result<()> {
    let record = state
        .repo
        .get(id)?
        .ok_or_else(|| crate::error::ShopTrackError::RecordNotFound(id.to_string()))?;
    state.form.load_from(&record);
    Ok(())
}

/// Submit the form: validate, resolve part images, insert or update.
/// Returns the record id. The list view picks the change up on its next pump.
pub fn submit(state: &mut AppState) -> Result<String> {
    let id = state.form.submit(&state.repo, &state.blobs)?;
    state.list.pump();
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::open_state;
    use crate::error::ShopTrackError;

    #[test]
    fn add_and_remove_part_rows() {
        let (_tmp, mut state) = open_state();

        assert_eq!(add_part(&mut state), 0);
        assert_eq!(add_part(&mut state), 1);
        remove_part(&mut state, 0).unwrap();
        assert_eq!(state.form.parts().len(), 1);

        let bad = remove_part(&mut state, 7);
        assert!(matches!(
            bad,
            Err(ShopTrackError::PartIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn edit_of_unknown_id_is_record_not_found() {
        let (_tmp, mut state) = open_state();
        let result = edit(&mut state, "no-such-record");
        assert!(matches!(result, Err(ShopTrackError::RecordNotFound(_))));
    }

    #[test]
    fn submit_rejects_invalid_form_without_writing() {
        let (_tmp, mut state) = open_state();
        state.form.plate = "ABC123".to_string();
        // brand and owner left empty

        let result = submit(&mut state);
        assert!(matches!(result, Err(ShopTrackError::Validation(_))));
        assert!(state.repo.list_all().unwrap().is_empty());
    }
}
