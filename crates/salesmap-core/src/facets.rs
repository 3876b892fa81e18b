//! Filter facets: branch → office → salesperson cascade.
//!
//! Facet values are derived from the joined working set. Branch and office
//! come from the nested roster info; salesperson options come from the
//! top-level assignment field, restricted by whichever upstream facets are
//! currently selected. Selections live in an explicit [`FilterState`] value
//! object — there is no ambient selection state anywhere in the crate.
//!
//! The derivation functions are generic over any iterator of records so
//! they work both on plain slices and on the workspace's index-driven
//! views without copying.

use serde::{Deserialize, Serialize};

use crate::record::JoinedRecord;

/// Current facet selections. Branch and office are single-valued; the
/// salesperson selection is a multi-select whose insertion order is
/// preserved for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub branch: Option<String>,
    pub office: Option<String>,
    #[serde(default)]
    pub salespeople: Vec<String>,
}

/// The valid option sets for the three facets under a given selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub branches: Vec<String>,
    pub offices: Vec<String>,
    pub salespeople: Vec<String>,
}

impl FilterState {
    /// Select (or clear) the branch facet. Changing the branch always clears
    /// the office — office options are scoped to a branch, so a stale office
    /// would describe an impossible combination. The salesperson selection
    /// is reconciled against the options valid under the new branch.
    pub fn select_branch<'a, I>(&mut self, branch: Option<String>, joined: I)
    where
        I: IntoIterator<Item = &'a JoinedRecord>,
    {
        self.branch = branch.filter(|b| !b.trim().is_empty());
        self.office = None;
        self.reconcile_salespeople(joined);
    }

    /// Select (or clear) the office facet and reconcile the salesperson
    /// selection against the narrowed option set.
    pub fn select_office<'a, I>(&mut self, office: Option<String>, joined: I)
    where
        I: IntoIterator<Item = &'a JoinedRecord>,
    {
        self.office = office.filter(|o| !o.trim().is_empty());
        self.reconcile_salespeople(joined);
    }

    /// Replace the multi-select salesperson set, dropping entries that are
    /// not valid under the current branch/office selection.
    pub fn select_salespeople<'a, I>(&mut self, selection: Vec<String>, joined: I)
    where
        I: IntoIterator<Item = &'a JoinedRecord>,
    {
        self.salespeople = selection;
        self.reconcile_salespeople(joined);
    }

    /// Clear every facet.
    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    /// Whether a record passes every currently-set facet.
    #[must_use]
    pub fn matches(&self, record: &JoinedRecord) -> bool {
        if let Some(branch) = &self.branch {
            if record.branch().as_deref() != Some(branch.as_str()) {
                return false;
            }
        }
        if let Some(office) = &self.office {
            if record.office().as_deref() != Some(office.as_str()) {
                return false;
            }
        }
        if !self.salespeople.is_empty() {
            let name = record.store.salesperson_name();
            if !self.salespeople.iter().any(|s| s == &name) {
                return false;
            }
        }
        true
    }

    fn reconcile_salespeople<'a, I>(&mut self, joined: I)
    where
        I: IntoIterator<Item = &'a JoinedRecord>,
    {
        let options =
            salesperson_options(joined, self.branch.as_deref(), self.office.as_deref());
        self.salespeople = reconcile_selection(&self.salespeople, &options);
    }
}

/// Distinct non-empty branch values across records carrying roster info.
pub fn branch_options<'a, I>(joined: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a JoinedRecord>,
{
    let mut branches: Vec<String> = joined.into_iter().filter_map(JoinedRecord::branch).collect();
    branches.sort_unstable();
    branches.dedup();
    branches
}

/// Distinct non-empty office values, restricted to the selected branch when
/// one is set.
pub fn office_options<'a, I>(joined: I, branch: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a JoinedRecord>,
{
    let mut offices: Vec<String> = joined
        .into_iter()
        .filter(|record| match branch {
            Some(b) => record.branch().as_deref() == Some(b),
            None => true,
        })
        .filter_map(JoinedRecord::office)
        .collect();
    offices.sort_unstable();
    offices.dedup();
    offices
}

/// Distinct non-empty salesperson names among records passing the currently
/// set branch/office facets. Unlike branch/office these come from the
/// top-level assignment field, so an unmatched store still contributes its
/// salesperson — unless a branch or office facet is set, which an unmatched
/// record cannot satisfy.
pub fn salesperson_options<'a, I>(joined: I, branch: Option<&str>, office: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a JoinedRecord>,
{
    let mut names: Vec<String> = joined
        .into_iter()
        .filter(|record| match branch {
            Some(b) => record.branch().as_deref() == Some(b),
            None => true,
        })
        .filter(|record| match office {
            Some(o) => record.office().as_deref() == Some(o),
            None => true,
        })
        .map(|record| record.store.salesperson_name())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Intersect a previous multi-selection with the newly valid option set,
/// preserving the previous selection's relative order. Stale entries are
/// silently dropped — filtering by a value no longer offered would select
/// an impossible combination. Never adds entries.
#[must_use]
pub fn reconcile_selection(previous: &[String], options: &[String]) -> Vec<String> {
    previous
        .iter()
        .filter(|selected| options.iter().any(|o| o == *selected))
        .cloned()
        .collect()
}

/// Derive all three facet option sets under the given selection.
pub fn derive_facets<'a, I>(joined: I, state: &FilterState) -> FacetOptions
where
    I: IntoIterator<Item = &'a JoinedRecord> + Clone,
{
    FacetOptions {
        branches: branch_options(joined.clone()),
        offices: office_options(joined.clone(), state.branch.as_deref()),
        salespeople: salesperson_options(
            joined,
            state.branch.as_deref(),
            state.office.as_deref(),
        ),
    }
}

/// Snapshot of the records passing every facet in `state`.
#[must_use]
pub fn apply_filter(joined: &[JoinedRecord], state: &FilterState) -> Vec<JoinedRecord> {
    joined
        .iter()
        .filter(|record| state.matches(record))
        .cloned()
        .collect()
}
