use std::collections::{BTreeSet, HashSet};

use super::model::{MunicipalDataset, MunicipalRecord};

// ---------------------------------------------------------------------------
// Filter selection: one optional constraint per stage
// ---------------------------------------------------------------------------

/// The user's choices for the three cascading filter stages.
///
/// `None` means the stage is switched off (everything passes). `Some` with an
/// empty set means the stage is on but nothing is chosen, so nothing passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub state: Option<String>,
    pub regions: Option<BTreeSet<String>>,
    pub ufs: Option<BTreeSet<String>>,
}

impl FilterSelection {
    /// The combined predicate `state ∧ region ∧ uf`.
    pub fn matches(&self, record: &MunicipalRecord) -> bool {
        self.matches_state(record) && self.matches_region(record) && self.matches_uf(record)
    }

    fn matches_state(&self, record: &MunicipalRecord) -> bool {
        self.state.as_ref().is_none_or(|s| record.estado == *s)
    }

    fn matches_region(&self, record: &MunicipalRecord) -> bool {
        self.regions
            .as_ref()
            .is_none_or(|set| set.contains(&record.regiao))
    }

    fn matches_uf(&self, record: &MunicipalRecord) -> bool {
        self.ufs.as_ref().is_none_or(|set| set.contains(&record.uf))
    }

    /// Drop chosen regions and UFs that the scoped option lists no longer offer.
    /// Returns `true` if anything was removed.
    pub fn prune(&mut self, view: &FilteredView) -> bool {
        let mut changed = false;
        if let Some(regions) = &mut self.regions {
            let before = regions.len();
            regions.retain(|r| view.region_options.contains(r));
            changed |= regions.len() != before;
        }
        if let Some(ufs) = &mut self.ufs {
            let before = ufs.len();
            ufs.retain(|u| view.uf_options.contains(u));
            changed |= ufs.len() != before;
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Filtered view: scoped option lists plus surviving row indices
// ---------------------------------------------------------------------------

/// Result of running the filter cascade once. Borrows nothing; rows are
/// referenced by index into the dataset the view was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    /// Every state in the dataset, sorted.
    pub state_options: Vec<String>,
    /// Regions present after the state stage, in first-appearance order.
    pub region_options: Vec<String>,
    /// UFs present after the region stage, in first-appearance order.
    pub uf_options: Vec<String>,
    /// Indices of rows passing all three stages, ascending.
    pub indices: Vec<usize>,
}

impl FilteredView {
    /// A view that passes every row.
    pub fn unfiltered(dataset: &MunicipalDataset) -> Self {
        apply_filters(dataset, &FilterSelection::default())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the rows of `dataset` selected by this view.
    pub fn records<'a>(
        &'a self,
        dataset: &'a MunicipalDataset,
    ) -> impl Iterator<Item = &'a MunicipalRecord> + 'a {
        self.indices
            .iter()
            .filter_map(move |&i| dataset.record(i))
    }
}

/// Unique values in first-appearance order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Run the cascade: state, then region, then UF.
///
/// Each stage's option list is computed from the rows that survived the
/// previous stage, so later choices always reflect earlier ones.
pub fn apply_filters(dataset: &MunicipalDataset, selection: &FilterSelection) -> FilteredView {
    let state_options: Vec<String> = dataset.states.iter().cloned().collect();

    let by_state: Vec<usize> = (0..dataset.len())
        .filter(|&i| selection.matches_state(&dataset.records[i]))
        .collect();
    let region_options = distinct(by_state.iter().map(|&i| dataset.records[i].regiao.as_str()));

    let by_region: Vec<usize> = by_state
        .into_iter()
        .filter(|&i| selection.matches_region(&dataset.records[i]))
        .collect();
    let uf_options = distinct(by_region.iter().map(|&i| dataset.records[i].uf.as_str()));

    let indices: Vec<usize> = by_region
        .into_iter()
        .filter(|&i| selection.matches_uf(&dataset.records[i]))
        .collect();

    log::debug!(
        "filters {:?} → {} of {} rows ({} region / {} UF options)",
        selection,
        indices.len(),
        dataset.len(),
        region_options.len(),
        uf_options.len()
    );

    FilteredView {
        state_options,
        region_options,
        uf_options,
        indices,
    }
}
