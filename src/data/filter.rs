use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Field, Record};

/// Selector label meaning "no constraint".
pub const ALL: &str = "Todos";

/// Number of product descriptions shown in the search preview.
pub const PREVIEW_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// FilterCriteria – what the user selected
// ---------------------------------------------------------------------------

/// Active selections. A `None`, blank or [`ALL`] value means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub supplier: Option<String>,
    pub year: Option<String>,
    pub product_search: String,
}

impl FilterCriteria {
    /// The raw selection for a categorical field.
    pub fn selection(&self, field: Field) -> Option<&str> {
        match field {
            Field::State => self.state.as_deref(),
            Field::Municipality => self.municipality.as_deref(),
            Field::Supplier => self.supplier.as_deref(),
            Field::Year => self.year.as_deref(),
            _ => None,
        }
    }

    /// Set a categorical selection; [`ALL`] clears it.
    pub fn select(&mut self, field: Field, value: Option<String>) {
        let value = value.filter(|v| v != ALL);
        match field {
            Field::State => self.state = value,
            Field::Municipality => self.municipality = value,
            Field::Supplier => self.supplier = value,
            Field::Year => self.year = value,
            _ => {}
        }
    }

    /// Selection as it constrains the data (`None` when inactive).
    pub fn active(&self, field: Field) -> Option<&str> {
        active(self.selection(field))
    }

    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.product_search.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Whether no criterion narrows the dataset.
    pub fn is_unconstrained(&self) -> bool {
        SELECTABLE.iter().all(|f| self.active(*f).is_none()) && self.search_term().is_none()
    }
}

/// Categorical fields that take an exact-match selection.
pub const SELECTABLE: [Field; 4] = [Field::State, Field::Municipality, Field::Supplier, Field::Year];

fn active(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != ALL)
}

/// Case-insensitive substring match on a lowercased needle.
fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

// ---------------------------------------------------------------------------
// Candidate lists
// ---------------------------------------------------------------------------

/// Sorted, duplicate-free, null-free values of `field`, optionally restricted
/// to records of a single `state`.
pub fn distinct_values(dataset: &Dataset, field: Field, state: Option<&str>) -> Vec<String> {
    let state = active(state);
    dataset
        .records
        .iter()
        .filter(|rec| state.map_or(true, |s| rec.state.as_deref() == Some(s)))
        .filter_map(|rec| rec.text(field))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Candidate list for a selector, honouring its upstream selection
/// (municipality follows the selected state).
pub fn candidates(dataset: &Dataset, field: Field, criteria: &FilterCriteria) -> Vec<String> {
    match field.upstream() {
        Some(Field::State) => distinct_values(dataset, field, criteria.active(Field::State)),
        _ => distinct_values(dataset, field, None),
    }
}

// ---------------------------------------------------------------------------
// Product search
// ---------------------------------------------------------------------------

/// Up to `limit` distinct product descriptions containing `term`
/// (case-insensitive), in first-encountered order.
pub fn search_products(dataset: &Dataset, term: &str, limit: usize) -> Vec<String> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }
    let needle = term.to_lowercase();

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for desc in dataset
        .records
        .iter()
        .filter_map(|rec| rec.product_description.as_deref())
    {
        if found.len() == limit {
            break;
        }
        if contains_ci(desc, &needle) && seen.insert(desc) {
            found.push(desc.to_string());
        }
    }
    found
}

/// Outcome of the product preview, separating "nothing typed" from
/// "typed but nothing matched".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "products", rename_all = "snake_case")]
pub enum SearchPreview {
    Inactive,
    NoMatches,
    Matches(Vec<String>),
}

pub fn preview_products(dataset: &Dataset, term: &str, limit: usize) -> SearchPreview {
    if term.trim().is_empty() {
        return SearchPreview::Inactive;
    }
    let found = search_products(dataset, term, limit);
    if found.is_empty() {
        SearchPreview::NoMatches
    } else {
        SearchPreview::Matches(found)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// A filtered view: indices into an unchanged dataset, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub dataset: &'a Dataset,
    pub indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a Record> {
        self.indices.get(i).and_then(|&idx| self.dataset.records.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset: &'a Dataset = self.dataset;
        let records = &dataset.records;
        self.indices.iter().filter_map(move |&idx| records.get(idx))
    }
}

/// Whether a record satisfies every active criterion.
pub fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    if !matches_exact(record, criteria) {
        return false;
    }
    let needle = criteria.search_term().map(str::to_lowercase);
    matches_search(record, needle.as_deref())
}

fn matches_exact(record: &Record, criteria: &FilterCriteria) -> bool {
    SELECTABLE.iter().all(|&field| match criteria.active(field) {
        Some(want) => record.text(field) == Some(want),
        None => true,
    })
}

fn matches_search(record: &Record, needle_lower: Option<&str>) -> bool {
    match needle_lower {
        Some(needle) => record
            .product_description
            .as_deref()
            .is_some_and(|desc| contains_ci(desc, needle)),
        None => true,
    }
}

/// Return indices of records that pass all active filters.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    if criteria.is_unconstrained() {
        return (0..dataset.len()).collect();
    }
    let needle = criteria.search_term().map(str::to_lowercase);
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| matches_exact(rec, criteria) && matches_search(rec, needle.as_deref()))
        .map(|(i, _)| i)
        .collect()
}

/// Narrow `dataset` by `criteria` (conjunctive). The dataset is untouched.
pub fn apply_filters<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    FilteredView::from_indices(dataset, filtered_indices(dataset, criteria))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(state: &str, municipality: &str, supplier: &str, year: &str, product: Option<&str>) -> Record {
        Record {
            state: Some(state.into()),
            municipality: Some(municipality.into()),
            supplier: Some(supplier.into()),
            year: year.into(),
            product_description: product.map(str::to_string),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        let mut no_state = rec("", "Avulso", "Delta", "2020", Some("Seringa 10ml"));
        no_state.state = None;
        Dataset::from_records(vec![
            rec("SP", "Campinas", "Alfa", "2021", Some("Dipirona 500mg")),
            rec("SP", "Santos", "Beta", "2022", Some("DIPIRONA gotas")),
            rec("RJ", "Niterói", "Alfa", "2021", Some("Paracetamol 750mg")),
            rec("SP", "Campinas", "Gama", "2021", None),
            rec("RJ", "Rio de Janeiro", "Beta", "2022", Some("Dipirona 500mg")),
            no_state,
        ])
    }

    #[test]
    fn distinct_values_sorted_unique_non_null() {
        let ds = sample();
        assert_eq!(distinct_values(&ds, Field::State, None), vec!["RJ", "SP"]);
        assert_eq!(
            distinct_values(&ds, Field::Supplier, Some(ALL)),
            vec!["Alfa", "Beta", "Delta", "Gama"]
        );
        let products = distinct_values(&ds, Field::ProductDescription, None);
        let mut sorted = products.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(products, sorted);
        assert_eq!(products.len(), 4);
    }

    #[test]
    fn municipality_cascades_from_state() {
        let ds = sample();
        assert_eq!(
            distinct_values(&ds, Field::Municipality, Some("SP")),
            vec!["Campinas", "Santos"]
        );
        let criteria = FilterCriteria {
            state: Some("RJ".into()),
            ..Default::default()
        };
        assert_eq!(
            candidates(&ds, Field::Municipality, &criteria),
            vec!["Niterói", "Rio de Janeiro"]
        );
        // supplier has no upstream; the state selection does not narrow it
        assert_eq!(candidates(&ds, Field::Supplier, &criteria).len(), 4);
        assert_eq!(distinct_values(&ds, Field::Municipality, None).len(), 5);
    }

    #[test]
    fn search_is_case_insensitive_and_deduplicated() {
        let ds = sample();
        assert_eq!(
            search_products(&ds, "dipirona", PREVIEW_LIMIT),
            vec!["Dipirona 500mg", "DIPIRONA gotas"]
        );
        assert_eq!(search_products(&ds, "DIPIRONA", 1), vec!["Dipirona 500mg"]);
        assert!(search_products(&ds, "", PREVIEW_LIMIT).is_empty());
        assert!(search_products(&ds, "   ", PREVIEW_LIMIT).is_empty());
        assert!(search_products(&ds, "insulina", PREVIEW_LIMIT).is_empty());
    }

    #[test]
    fn preview_distinguishes_blank_from_no_match() {
        let ds = sample();
        assert_eq!(preview_products(&ds, " ", 10), SearchPreview::Inactive);
        assert_eq!(preview_products(&ds, "xyz", 10), SearchPreview::NoMatches);
        assert_eq!(
            preview_products(&ds, "para", 10),
            SearchPreview::Matches(vec!["Paracetamol 750mg".into()])
        );
    }

    #[test]
    fn default_criteria_is_identity() {
        let ds = sample();
        let view = apply_filters(&ds, &FilterCriteria::default());
        assert_eq!(view.indices, (0..ds.len()).collect::<Vec<_>>());

        let todos = FilterCriteria {
            state: Some(ALL.into()),
            municipality: Some(ALL.into()),
            supplier: Some(ALL.into()),
            year: Some(ALL.into()),
            product_search: "  ".into(),
        };
        assert_eq!(apply_filters(&ds, &todos).len(), ds.len());
    }

    #[test]
    fn filters_are_conjunctive() {
        let ds = sample();
        let criteria = FilterCriteria {
            state: Some("SP".into()),
            year: Some("2021".into()),
            product_search: " dipi ".into(),
            ..Default::default()
        };
        let view = apply_filters(&ds, &criteria);
        assert_eq!(view.indices, vec![0]);
        assert!(view.iter().all(|r| matches(r, &criteria)));
    }

    #[test]
    fn search_filter_skips_null_descriptions() {
        let ds = sample();
        let criteria = FilterCriteria {
            state: Some("SP".into()),
            municipality: Some("Campinas".into()),
            product_search: "a".into(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&ds, &criteria).indices, vec![0]);
    }

    #[test]
    fn zero_matches_yield_empty_view() {
        let ds = sample();
        let criteria = FilterCriteria {
            state: Some("SP".into()),
            supplier: Some("Delta".into()),
            ..Default::default()
        };
        let view = apply_filters(&ds, &criteria);
        assert!(view.is_empty());
        assert_eq!(ds.len(), 6);
    }

    #[test]
    fn select_all_label_clears() {
        let mut criteria = FilterCriteria::default();
        criteria.select(Field::Supplier, Some("Alfa".into()));
        assert_eq!(criteria.active(Field::Supplier), Some("Alfa"));
        criteria.select(Field::Supplier, Some(ALL.into()));
        assert_eq!(criteria.supplier, None);
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn criteria_json_defaults_missing_fields() {
        let criteria: FilterCriteria = serde_json::from_str(r#"{"state":"SP"}"#).unwrap();
        assert_eq!(criteria.state.as_deref(), Some("SP"));
        assert_eq!(criteria.product_search, "");
        assert_eq!(criteria.municipality, None);
    }
}
