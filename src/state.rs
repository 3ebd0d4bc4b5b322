use std::collections::BTreeMap;

use crate::data::cache::{DatasetCache, SharedDataset};
use crate::data::export::{export_csv, ExportError};
use crate::data::filter::{
    candidates, filtered_indices, preview_products, FilterCriteria, FilteredView, SearchPreview,
    PREVIEW_LIMIT, SELECTABLE,
};
use crate::data::model::Field;
use crate::data::summary::{summarize, Summary};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where the current dataset comes from; kept for reloads.
    pub cache: Option<DatasetCache>,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<SharedDataset>,

    /// Current selections.
    pub criteria: FilterCriteria,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Candidate values per selector (cached).
    pub candidates: BTreeMap<Field, Vec<String>>,

    /// Product preview for the current search text.
    pub preview: SearchPreview,

    pub preview_limit: usize,

    /// Blocking load error; nothing is computed while set.
    pub load_error: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: None,
            dataset: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            candidates: BTreeMap::new(),
            preview: SearchPreview::Inactive,
            preview_limit: PREVIEW_LIMIT,
            load_error: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and reset every filter.
    pub fn set_dataset(&mut self, dataset: SharedDataset) {
        self.dataset = Some(dataset);
        self.load_error = None;
        self.status_message = None;
        self.reset_filters();
    }

    /// Swap in a reloaded copy of the dataset, keeping the selections.
    pub fn replace_dataset(&mut self, dataset: SharedDataset) {
        self.dataset = Some(dataset);
        self.load_error = None;
        self.rebuild_candidates();
        self.update_preview();
        self.refilter();
    }

    /// Record a load failure. Any previously loaded dataset is dropped so no
    /// stale numbers stay on screen.
    pub fn set_load_error(&mut self, message: String) {
        self.dataset = None;
        self.visible_indices.clear();
        self.candidates.clear();
        self.preview = SearchPreview::Inactive;
        self.load_error = Some(message);
    }

    /// Back to "Todos" everywhere and an empty search.
    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.rebuild_candidates();
        self.update_preview();
        self.refilter();
    }

    /// Change one selector. A municipality that does not belong to a newly
    /// selected state falls back to "Todos".
    pub fn select(&mut self, field: Field, value: Option<String>) {
        if self.criteria.selection(field) == value.as_deref() {
            return;
        }
        self.criteria.select(field, value);
        self.rebuild_candidates();

        for dependent in SELECTABLE.into_iter().filter(|f| f.upstream() == Some(field)) {
            let still_valid = match self.criteria.active(dependent) {
                Some(current) => self
                    .candidates
                    .get(&dependent)
                    .is_some_and(|c| c.iter().any(|v| v == current)),
                None => true,
            };
            if !still_valid {
                self.criteria.select(dependent, None);
            }
        }
        self.refilter();
    }

    pub fn set_search(&mut self, text: String) {
        if self.criteria.product_search == text {
            return;
        }
        self.criteria.product_search = text;
        self.update_preview();
        self.refilter();
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(shared) = &self.dataset {
            self.visible_indices = filtered_indices(&shared.dataset, &self.criteria);
            log::debug!(
                "{} of {} records match {:?}",
                self.visible_indices.len(),
                shared.dataset.len(),
                self.criteria
            );
        }
    }

    fn rebuild_candidates(&mut self) {
        self.candidates.clear();
        if let Some(shared) = &self.dataset {
            for field in SELECTABLE {
                self.candidates
                    .insert(field, candidates(&shared.dataset, field, &self.criteria));
            }
        }
    }

    fn update_preview(&mut self) {
        self.preview = match &self.dataset {
            Some(shared) => {
                preview_products(&shared.dataset, &self.criteria.product_search, self.preview_limit)
            }
            None => SearchPreview::Inactive,
        };
    }

    /// The currently visible records.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.dataset
            .as_ref()
            .map(|shared| FilteredView::from_indices(&shared.dataset, self.visible_indices.clone()))
    }

    pub fn summary(&self) -> Option<Summary<'_>> {
        self.view().map(|view| summarize(&view))
    }

    /// CSV bytes of the visible records.
    pub fn export(&self) -> Option<Result<Vec<u8>, ExportError>> {
        self.view().map(|view| export_csv(&view))
    }
}
