// Live vehicle list view: search filter plus pagination, recomputed from
// the latest full snapshot on every change.

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::Result;
use crate::model::VehicleRecord;
use crate::repo::{RecordRepository, RecordSubscription};

pub struct ListViewModel {
    records: Vec<VehicleRecord>,
    search: String,
    /// 1-based. Only a search change resets it; snapshot churn never does.
    page: usize,
    page_size: usize,
    subscription: Option<RecordSubscription>,
}

impl ListViewModel {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
            subscription: None,
        }
    }

    /// Subscribe to the repository's live stream and apply the initial
    /// snapshot.
    pub fn attach(repo: &RecordRepository, page_size: usize) -> Result<Self> {
        let mut view = Self::new(page_size);
        let subscription = repo.subscribe_all()?;
        view.subscription = Some(subscription);
        view.pump();
        Ok(view)
    }

    /// Drain any pending snapshots from the subscription into view state.
    /// Returns true when a newer snapshot was applied.
    pub fn pump(&mut self) -> bool {
        let Some(subscription) = &self.subscription else {
            return false;
        };
        match subscription.latest() {
            Some(snapshot) => {
                self.records = snapshot;
                true
            }
            None => false,
        }
    }

    /// Replace the backing snapshot directly (detached use and tests).
    pub fn apply_snapshot(&mut self, records: Vec<VehicleRecord>) {
        self.records = records;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Update the search term. Any change returns the view to page 1.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.page = 1;
    }

    /// Records whose plate or brand contains the search term,
    /// case-insensitively. An empty term matches everything.
    pub fn filtered(&self) -> Vec<&VehicleRecord> {
        let term = self.search.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.plate.to_lowercase().contains(&term) || r.brand.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// The current page of the filtered list.
    pub fn page_items(&self) -> Vec<&VehicleRecord> {
        let filtered = self.filtered();
        let start = (self.page - 1) * self.page_size;
        filtered
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Advance one page; a no-op at the last page (never wraps).
    pub fn next_page(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    /// Go back one page; a no-op at the first page.
    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }
}

impl Default for ListViewModel {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(plate: &str, brand: &str) -> VehicleRecord {
        VehicleRecord {
            id: Some(plate.to_string()),
            plate: plate.to_string(),
            brand: brand.to_string(),
            owner_name: "owner".to_string(),
            parts: Vec::new(),
        }
    }

    fn nine_records() -> Vec<VehicleRecord> {
        (1..=9)
            .map(|i| record(&format!("PL{:03}", i), "Toyota"))
            .collect()
    }

    #[test]
    fn nine_records_page_size_four_gives_three_pages_clamped() {
        let mut view = ListViewModel::new(4);
        view.apply_snapshot(nine_records());

        assert_eq!(view.total_pages(), 3);

        // Five next_page() calls from page 1 end on page 3: no error, no wrap
        for _ in 0..5 {
            view.next_page();
        }
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.page_items().len(), 1);

        // And prev past the first page clamps at 1
        for _ in 0..5 {
            view.prev_page();
        }
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.page_items().len(), 4);
    }

    #[test]
    fn search_matches_plate_or_brand_case_insensitively() {
        let mut view = ListViewModel::new(4);
        view.apply_snapshot(vec![
            record("ABC123", "Toyota"),
            record("XYZ789", "Nissan"),
            record("TOY001", "Kia"),
        ]);

        view.set_search("toy");
        let plates: Vec<&str> = view.filtered().iter().map(|r| r.plate.as_str()).collect();
        assert_eq!(plates, ["ABC123", "TOY001"]);

        view.set_search("xyz");
        assert_eq!(view.filtered().len(), 1);
    }

    #[test]
    fn unmatched_search_empties_the_view_and_resets_the_page() {
        let mut view = ListViewModel::new(4);
        view.apply_snapshot(nine_records());
        view.next_page();
        assert_eq!(view.current_page(), 2);

        view.set_search("no-such-plate");
        assert_eq!(view.current_page(), 1);
        assert!(view.filtered().is_empty());
        assert_eq!(view.total_pages(), 0);
        assert!(view.page_items().is_empty());

        // next_page with zero pages stays put
        view.next_page();
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn search_change_resets_page_but_snapshot_churn_does_not() {
        let mut view = ListViewModel::new(4);
        view.apply_snapshot(nine_records());
        view.next_page();
        view.next_page();
        assert_eq!(view.current_page(), 3);

        // A fresh snapshot leaves the page alone
        view.apply_snapshot(nine_records());
        assert_eq!(view.current_page(), 3);

        view.set_search("");
        assert_eq!(view.current_page(), 1);
    }
}
