use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::filter::{FilterSelection, FilteredView, apply_filters};
use crate::data::loader::load_file;
use crate::data::model::MunicipalDataset;
use crate::map::{MapKind, MapOutcome, RenderOptions, dispatch};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// File the dataset was read from; reloaded on cache invalidation.
    pub data_path: PathBuf,

    /// Loaded dataset, shared read-only for the process lifetime.
    pub dataset: Arc<MunicipalDataset>,

    /// Selected map type.
    pub map_kind: MapKind,

    /// State filter checkbox (customisable maps only).
    pub filter_by_state: bool,
    /// Chosen state. On the native map `None` means "All states".
    pub chosen_state: Option<String>,

    pub filter_by_region: bool,
    pub chosen_regions: BTreeSet<String>,

    pub filter_by_uf: bool,
    pub chosen_ufs: BTreeSet<String>,

    /// Map customisation.
    pub render: RenderOptions,

    /// Result of the last filter pass (cached).
    pub view: FilteredView,

    /// Result of the last map dispatch (cached).
    pub outcome: MapOutcome,

    /// Bumped on every refresh so the map view resets to the new chart.
    pub revision: u64,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    state_chosen: bool,
}

impl AppState {
    /// Build the state and load the configured dataset. A load failure leaves
    /// an empty dataset and a status message.
    pub fn new(config: AppConfig) -> Self {
        let mut state = Self {
            data_path: config.data_path,
            dataset: Arc::new(MunicipalDataset::default()),
            map_kind: MapKind::default(),
            filter_by_state: false,
            chosen_state: None,
            filter_by_region: false,
            chosen_regions: BTreeSet::new(),
            filter_by_uf: false,
            chosen_ufs: BTreeSet::new(),
            render: config.render,
            view: FilteredView::default(),
            outcome: MapOutcome::Info(String::new()),
            revision: 0,
            status_message: None,
            state_chosen: false,
        };
        state.reload();
        state
    }

    /// Drop the cached dataset and read `data_path` again.
    pub fn reload(&mut self) {
        match load_file(&self.data_path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", self.data_path.display());
                self.status_message = Some(format!("Error: {e:#}"));
                self.refresh();
            }
        }
    }

    /// Switch to another file.
    pub fn open(&mut self, path: &Path) {
        self.data_path = path.to_path_buf();
        self.reload();
    }

    /// Ingest a newly loaded dataset and drop choices it cannot satisfy.
    pub fn set_dataset(&mut self, dataset: MunicipalDataset) {
        if let Some(state) = &self.chosen_state {
            if !dataset.states.contains(state) {
                self.chosen_state = None;
            }
        }
        self.dataset = Arc::new(dataset);
        self.status_message = None;
        self.refresh();
    }

    /// The filter selection implied by the current widgets.
    pub fn selection(&self) -> FilterSelection {
        let state = if self.map_kind.is_customisable() && !self.filter_by_state {
            None
        } else {
            self.chosen_state.clone()
        };
        FilterSelection {
            state,
            regions: self.filter_by_region.then(|| self.chosen_regions.clone()),
            ufs: self.filter_by_uf.then(|| self.chosen_ufs.clone()),
        }
    }

    /// Turn the state filter checkbox on or off. Turning it on picks the
    /// first state when none is chosen yet.
    pub fn set_filter_by_state(&mut self, enabled: bool) {
        self.filter_by_state = enabled;
        if enabled && self.chosen_state.is_none() {
            self.chosen_state = self.dataset.states.iter().next().cloned();
        }
        self.refresh();
    }

    pub fn set_map_kind(&mut self, kind: MapKind) {
        self.map_kind = kind;
        if kind.is_customisable() && self.filter_by_state && self.chosen_state.is_none() {
            self.chosen_state = self.dataset.states.iter().next().cloned();
        }
        self.refresh();
    }

    /// Toggle one value of a multiselect.
    pub fn toggle(set: &mut BTreeSet<String>, value: &str) {
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    /// Re-run the filter cascade and the map dispatch.
    pub fn refresh(&mut self) {
        let mut selection = self.selection();
        self.view = apply_filters(&self.dataset, &selection);

        // Pruned choices had no rows in scope, so the view is unchanged.
        if selection.prune(&self.view) {
            if let Some(regions) = selection.regions.take() {
                self.chosen_regions = regions;
            }
            if let Some(ufs) = selection.ufs.take() {
                self.chosen_ufs = ufs;
            }
        }

        let state_chosen = selection.state.is_some();
        if state_chosen != self.state_chosen {
            self.state_chosen = state_chosen;
            self.render.set_zoom(RenderOptions::default_zoom(state_chosen));
        }

        if self.view.is_empty() && !self.dataset.is_empty() {
            log::warn!("No municipalities match {selection:?}");
        }

        self.outcome = dispatch(&self.dataset, &self.view, self.map_kind, &self.render);
        self.revision = self.revision.wrapping_add(1);
    }
}
