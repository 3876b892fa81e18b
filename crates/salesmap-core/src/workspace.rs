//! The in-memory working set: one canonical record list plus derived views.
//!
//! The original tool kept three synchronized copies of every record (raw,
//! joined, filtered) and patched each one on edit; a missed patch meant the
//! map and the backing store quietly diverged. Here the joined records are
//! the single source of truth and the geo-enabled and filtered "projections"
//! are index lists into it, so an edit lands in every view by construction
//! while the observable semantics stay the same.

use std::collections::HashMap;

use chrono::Utc;

use crate::editor::{apply_edit, EditInput, EditOutcome};
use crate::error::CoreError;
use crate::facets::{derive_facets, FacetOptions, FilterState};
use crate::identity::store_id;
use crate::join::{join_by_employee_number, JoinStats};
use crate::record::{JoinedRecord, SalespersonRecord, StoreRecord};

/// Canonical records in load order, with the geo and filter views as index
/// lists and a derived-id lookup table.
#[derive(Debug, Clone)]
pub struct Workspace {
    records: Vec<JoinedRecord>,
    index: HashMap<String, usize>,
    geo: Vec<usize>,
    filter: FilterState,
    filtered: Vec<usize>,
    stats: JoinStats,
}

impl Workspace {
    /// Join freshly loaded records against the roster and build the views.
    ///
    /// Any `salesInfo` already present in the loaded records is discarded
    /// and re-derived — the roster is authoritative for the join.
    #[must_use]
    pub fn load_and_join(loaded: Vec<JoinedRecord>, roster: &[SalespersonRecord]) -> Self {
        let stores = loaded.into_iter().map(|record| record.store).collect();
        Self::from_stores(stores, roster)
    }

    /// Join raw store records against the roster and build the views.
    #[must_use]
    pub fn from_stores(stores: Vec<StoreRecord>, roster: &[SalespersonRecord]) -> Self {
        let (records, stats) = join_by_employee_number(stores, roster);

        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            // First occurrence wins for duplicate derived ids, matching the
            // first-match lookup the edit path has always used.
            index.entry(store_id(&record.store)).or_insert(position);
        }

        let geo: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.store.has_valid_coordinates())
            .map(|(position, _)| position)
            .collect();

        tracing::debug!(
            total = records.len(),
            geo_valid = geo.len(),
            "built working set"
        );

        let mut workspace = Self {
            records,
            index,
            geo,
            filter: FilterState::default(),
            filtered: Vec::new(),
            stats,
        };
        workspace.refilter();
        workspace
    }

    /// Every record, in load order. This is also the persisted shape.
    #[must_use]
    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    /// Records with valid coordinates — the geo-enabled working set.
    pub fn geo_records(&self) -> impl Iterator<Item = &JoinedRecord> {
        self.geo.iter().map(|&position| &self.records[position])
    }

    /// Records passing the current filter, a subset of the geo set.
    pub fn filtered_records(&self) -> impl Iterator<Item = &JoinedRecord> {
        self.filtered.iter().map(|&position| &self.records[position])
    }

    #[must_use]
    pub fn stats(&self) -> JoinStats {
        self.stats
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&JoinedRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// Facet option sets for the current selection, derived over the geo
    /// working set.
    #[must_use]
    pub fn facets(&self) -> FacetOptions {
        self.facets_for(&self.filter)
    }

    /// Facet option sets for an arbitrary selection (e.g. query parameters),
    /// without touching the workspace's own filter state.
    #[must_use]
    pub fn facets_for(&self, selection: &FilterState) -> FacetOptions {
        let records = &self.records;
        derive_facets(self.geo.iter().map(|&position| &records[position]), selection)
    }

    /// Select (or clear) the branch facet; clears the office and reconciles
    /// the salesperson selection (see [`FilterState::select_branch`]).
    pub fn select_branch(&mut self, branch: Option<String>) {
        let records = &self.records;
        self.filter
            .select_branch(branch, self.geo.iter().map(|&position| &records[position]));
        self.refilter();
    }

    /// Select (or clear) the office facet.
    pub fn select_office(&mut self, office: Option<String>) {
        let records = &self.records;
        self.filter
            .select_office(office, self.geo.iter().map(|&position| &records[position]));
        self.refilter();
    }

    /// Replace the salesperson multi-selection.
    pub fn select_salespeople(&mut self, selection: Vec<String>) {
        let records = &self.records;
        self.filter.select_salespeople(
            selection,
            self.geo.iter().map(|&position| &records[position]),
        );
        self.refilter();
    }

    /// Replace the whole filter state at once (e.g. from query parameters).
    /// The salesperson selection is reconciled against the resulting
    /// option set.
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = FilterState {
            branch: filter.branch.filter(|b| !b.trim().is_empty()),
            office: filter.office.filter(|o| !o.trim().is_empty()),
            salespeople: filter.salespeople,
        };
        let records = &self.records;
        let selection = std::mem::take(&mut self.filter.salespeople);
        self.filter.select_salespeople(
            selection,
            self.geo.iter().map(|&position| &records[position]),
        );
        self.refilter();
    }

    /// Clear every facet.
    pub fn reset_filter(&mut self) {
        self.filter.reset();
        self.refilter();
    }

    /// Apply an edit to the record with the given derived id.
    ///
    /// The updated record replaces the canonical entry, so the geo and
    /// filtered views see it immediately; the filtered view is then
    /// recomputed since the edit may move the record in or out of the
    /// current selection.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] when the id is not in the working set, or a
    /// [`CoreError::Validation`] from the editor. Nothing is mutated on
    /// error.
    pub fn apply_edit(
        &mut self,
        id: &str,
        input: &EditInput,
        roster: &[SalespersonRecord],
    ) -> Result<EditOutcome, CoreError> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let outcome = apply_edit(&self.records[position], input, roster, Utc::now())?;
        self.records[position] = outcome.updated.clone();
        self.refilter();

        tracing::info!(
            store_id = id,
            store = %outcome.updated.store.store_name,
            salesperson = %outcome.updated.store.salesperson_name(),
            "applied salesperson edit"
        );
        Ok(outcome)
    }

    fn refilter(&mut self) {
        let records = &self.records;
        let filter = &self.filter;
        self.filtered = self
            .geo
            .iter()
            .copied()
            .filter(|&position| filter.matches(&records[position]))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(
        name: &str,
        number: &str,
        salesperson: &str,
        lat: serde_json::Value,
    ) -> StoreRecord {
        serde_json::from_value(json!({
            "거래처명": name,
            "기본주소(사업자기준)": format!("{name} street"),
            "담당 사번": number,
            "담당 영업사원": salesperson,
            "위도": lat,
            "경도": 127.0
        }))
        .unwrap()
    }

    fn roster() -> Vec<SalespersonRecord> {
        serde_json::from_value(json!([
            { "담당 사번": "77", "담당 영업사원": "Park", "지사": "North", "지점": "Station" },
            { "담당 사번": "88", "담당 영업사원": "Choi", "지사": "North", "지점": "Station" },
            { "담당 사번": "99", "담당 영업사원": "Lee", "지사": "South", "지점": "Central" }
        ]))
        .unwrap()
    }

    fn workspace() -> Workspace {
        let stores = vec![
            store("ABC Mart", "77", "Park", json!(37.5)),
            store("Harbor Shop", "99", "Lee", json!(35.1)),
            store("No Geo Mart", "77", "Park", json!("")),
        ];
        Workspace::from_stores(stores, &roster())
    }

    #[test]
    fn geo_view_excludes_invalid_coordinates() {
        let ws = workspace();
        assert_eq!(ws.records().len(), 3);
        assert_eq!(ws.geo_records().count(), 2);
        // But the record stays in the canonical (persisted) set.
        assert!(ws
            .records()
            .iter()
            .any(|r| r.store.store_name == "No Geo Mart"));
    }

    #[test]
    fn empty_filter_shows_all_geo_records() {
        let ws = workspace();
        assert_eq!(ws.filtered_records().count(), 2);
    }

    #[test]
    fn filter_narrows_the_filtered_view() {
        let mut ws = workspace();
        ws.select_branch(Some("South".to_string()));
        let names: Vec<&str> = ws
            .filtered_records()
            .map(|r| r.store.store_name.as_str())
            .collect();
        assert_eq!(names, vec!["Harbor Shop"]);
    }

    #[test]
    fn edit_propagates_to_every_view() {
        let mut ws = workspace();
        let id = store_id(&ws.records()[0].store);

        let input = EditInput {
            new_salesperson: Some("Choi".to_string()),
            ..EditInput::default()
        };
        let roster = roster();
        let outcome = ws.apply_edit(&id, &input, &roster).unwrap();

        assert_eq!(outcome.updated.store.salesperson_name(), "Choi");
        // Canonical view.
        assert_eq!(ws.get(&id).unwrap().store.salesperson_name(), "Choi");
        // Geo view.
        assert!(ws
            .geo_records()
            .filter(|r| store_id(&r.store) == id)
            .all(|r| r.store.salesperson_name() == "Choi"));
        // Filtered view.
        assert!(ws
            .filtered_records()
            .filter(|r| store_id(&r.store) == id)
            .all(|r| r.store.salesperson_name() == "Choi"));
    }

    #[test]
    fn edit_can_move_a_record_out_of_the_filtered_view() {
        let mut ws = workspace();
        ws.select_salespeople(vec!["Park".to_string()]);
        assert_eq!(ws.filtered_records().count(), 1);

        let id = store_id(&ws.records()[0].store);
        let input = EditInput {
            new_salesperson: Some("Choi".to_string()),
            ..EditInput::default()
        };
        let roster = roster();
        ws.apply_edit(&id, &input, &roster).unwrap();

        // The edited record no longer matches the Park selection.
        assert_eq!(ws.filtered_records().count(), 0);
        // But it is still present (and updated) in the canonical set.
        assert_eq!(ws.get(&id).unwrap().store.salesperson_name(), "Choi");
    }

    #[test]
    fn edit_unknown_id_is_not_found_and_mutates_nothing() {
        let mut ws = workspace();
        let before = ws.records().to_vec();

        let input = EditInput {
            new_salesperson: Some("Choi".to_string()),
            ..EditInput::default()
        };
        let roster = roster();
        let err = ws.apply_edit("STORE_0", &input, &roster).unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(
            serde_json::to_value(ws.records()).unwrap(),
            serde_json::to_value(&before).unwrap()
        );
    }

    #[test]
    fn set_filter_reconciles_stale_selection() {
        let mut ws = workspace();
        ws.set_filter(FilterState {
            branch: Some("North".to_string()),
            office: None,
            salespeople: vec!["Park".to_string(), "Lee".to_string()],
        });
        // Lee works the South branch, so the selection keeps only Park.
        assert_eq!(ws.filter().salespeople, vec!["Park"]);
    }

    #[test]
    fn facets_are_derived_from_the_geo_set() {
        let ws = workspace();
        let facets = ws.facets();
        assert_eq!(facets.branches, vec!["North", "South"]);
        assert_eq!(facets.salespeople, vec!["Lee", "Park"]);
    }

    #[test]
    fn load_and_join_discards_stale_sales_info() {
        let loaded: Vec<JoinedRecord> = serde_json::from_value(json!([
            {
                "거래처명": "ABC Mart",
                "담당 사번": "77",
                "담당 영업사원": "Park",
                "위도": 37.5,
                "경도": 127.0,
                "salesInfo": { "담당 사번": "1", "담당 영업사원": "Stale", "지사": "Old", "지점": "Old" }
            }
        ]))
        .unwrap();

        let ws = Workspace::load_and_join(loaded, &roster());
        let info = ws.records()[0].sales_info.as_ref().unwrap();
        assert_eq!(info.name, "Park");
        assert_eq!(info.branch, "North");
    }
}
