// Shop Track - List Commands
// Live list events: search, paging, refresh, confirmed delete.

use crate::error::Result;
use crate::model::VehicleRecord;

use super::AppState;

/// Apply a new search term. Any change returns the view to page 1.
pub fn search_changed(state: &mut AppState, text: &str) {
    state.list.pump();
    state.list.set_search(text);
}

pub fn next_page(state: &mut AppState) {
    state.list.pump();
    state.list.next_page();
}

pub fn prev_page(state: &mut AppState) {
    state.list.pump();
    state.list.prev_page();
}

/// Drain pending live snapshots into the view. Returns the current page of
/// records after the refresh.
pub fn refresh(state: &mut AppState) -> Vec<VehicleRecord> {
    state.list.pump();
    state.list.page_items().into_iter().cloned().collect()
}

/// Delete a record, gated behind an explicit confirmation. Returns whether
/// the delete was performed. Deleting an id that is already gone succeeds.
pub fn delete(state: &mut AppState, id: &str, confirmed: bool) -> Result<bool> {
    if !confirmed {
        log::info!("Delete of {} not confirmed; skipping", id);
        return Ok(false);
    }
    state.repo.delete(id)?;
    state.list.pump();
    Ok(true)
}
