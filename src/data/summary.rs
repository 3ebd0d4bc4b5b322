use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::FilteredView;
use super::model::Record;

// ---------------------------------------------------------------------------
// Aggregate – a statistic that may be undefined
// ---------------------------------------------------------------------------

/// A statistic over nullable inputs. `Unavailable` means every input was
/// null; it is never the same thing as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate<T> {
    Available(T),
    Unavailable,
}

impl<T> Aggregate<T> {
    pub fn available(self) -> Option<T> {
        match self {
            Aggregate::Available(v) => Some(v),
            Aggregate::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Aggregate::Available(_))
    }
}

impl<T> From<Option<T>> for Aggregate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Aggregate::Unavailable, Aggregate::Available)
    }
}

// ---------------------------------------------------------------------------
// Summary – KPIs of a filtered subset
// ---------------------------------------------------------------------------

/// Key figures of a non-empty subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis<'a> {
    pub rows: usize,
    /// Sum of total prices, nulls counted as zero.
    pub total_price: f64,
    /// Sum of purchased quantities, nulls counted as zero.
    pub total_quantity: f64,
    /// Mean over non-null unit prices.
    pub average_unit_price: Aggregate<f64>,
    /// First record holding the minimum non-null unit price.
    pub best_purchase: Aggregate<&'a Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary<'a> {
    /// The filters matched no record.
    NoData,
    Computed(Kpis<'a>),
}

impl<'a> Summary<'a> {
    pub fn kpis(&self) -> Option<&Kpis<'a>> {
        match self {
            Summary::NoData => None,
            Summary::Computed(k) => Some(k),
        }
    }
}

/// Compute the KPIs of a filtered subset.
pub fn summarize<'a>(view: &FilteredView<'a>) -> Summary<'a> {
    if view.is_empty() {
        return Summary::NoData;
    }

    let mut total_price = 0.0;
    let mut total_quantity = 0.0;
    let mut unit_sum = 0.0;
    let mut unit_count = 0usize;
    let mut best: Option<&'a Record> = None;

    for rec in view.iter() {
        total_price += rec.total_price.unwrap_or(0.0);
        total_quantity += rec.quantity_purchased.unwrap_or(0.0);

        let Some(price) = rec.unit_price else {
            continue;
        };
        unit_sum += price;
        unit_count += 1;
        // strict comparison keeps the first record on ties
        if best.and_then(|b| b.unit_price).map_or(true, |min| price < min) {
            best = Some(rec);
        }
    }

    let average_unit_price = (unit_count > 0).then(|| unit_sum / unit_count as f64);

    Summary::Computed(Kpis {
        rows: view.len(),
        total_price,
        total_quantity,
        average_unit_price: average_unit_price.into(),
        best_purchase: best.into(),
    })
}

/// Mean non-null unit price per year, sorted by year. Years without any
/// unit price are left out.
pub fn average_by_year(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in view.iter() {
        if let Some(price) = rec.unit_price {
            let slot = acc.entry(rec.year.as_str()).or_insert((0.0, 0));
            slot.0 += price;
            slot.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(year, (sum, n))| (year.to_string(), sum / n as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterCriteria};
    use crate::data::model::Dataset;

    fn rec(state: &str, unit: Option<f64>, qty: Option<f64>, total: Option<f64>) -> Record {
        Record {
            state: Some(state.into()),
            year: "2021".into(),
            unit_price: unit,
            quantity_purchased: qty,
            total_price: total,
            ..Default::default()
        }
    }

    #[test]
    fn state_filter_scenario() {
        let ds = Dataset::from_records(vec![
            rec("SP", Some(10.0), Some(5.0), Some(50.0)),
            rec("SP", Some(7.0), Some(3.0), Some(21.0)),
            rec("RJ", Some(20.0), Some(1.0), Some(20.0)),
        ]);
        let criteria = FilterCriteria {
            state: Some("SP".into()),
            ..Default::default()
        };
        let view = apply_filters(&ds, &criteria);
        assert_eq!(view.len(), 2);

        let summary = summarize(&view);
        let kpis = summary.kpis().expect("rows matched");
        assert_eq!(kpis.rows, 2);
        assert_eq!(kpis.total_quantity, 8.0);
        assert_eq!(kpis.total_price, 71.0);
        assert_eq!(kpis.average_unit_price, Aggregate::Available(8.5));
        assert_eq!(kpis.best_purchase, Aggregate::Available(&ds.records[1]));
    }

    #[test]
    fn empty_subset_is_no_data() {
        let ds = Dataset::from_records(vec![rec("SP", Some(1.0), None, None)]);
        let criteria = FilterCriteria {
            state: Some("AM".into()),
            ..Default::default()
        };
        let view = apply_filters(&ds, &criteria);
        assert!(view.is_empty());
        assert_eq!(summarize(&view), Summary::NoData);
    }

    #[test]
    fn all_null_unit_prices_are_unavailable() {
        let ds = Dataset::from_records(vec![
            rec("SP", None, Some(2.0), Some(30.0)),
            rec("SP", None, None, Some(12.5)),
        ]);
        let view = apply_filters(&ds, &FilterCriteria::default());
        let summary = summarize(&view);
        let kpis = summary.kpis().expect("rows matched");
        assert_eq!(kpis.total_quantity, 2.0);
        assert_eq!(kpis.total_price, 42.5);
        assert_eq!(kpis.average_unit_price, Aggregate::Unavailable);
        assert!(!kpis.best_purchase.is_available());
    }

    #[test]
    fn nulls_are_excluded_from_the_mean() {
        let ds = Dataset::from_records(vec![
            rec("SP", Some(4.0), None, None),
            rec("SP", None, None, None),
            rec("SP", Some(2.0), None, None),
        ]);
        let view = apply_filters(&ds, &FilterCriteria::default());
        let kpis = summarize(&view).kpis().cloned().expect("rows matched");
        assert_eq!(kpis.average_unit_price, Aggregate::Available(3.0));
        assert_eq!(kpis.total_price, 0.0);
    }

    #[test]
    fn best_purchase_ties_keep_first_record() {
        let mut first = rec("SP", Some(5.0), None, None);
        first.supplier = Some("Primeiro".into());
        let mut second = rec("SP", Some(5.0), None, None);
        second.supplier = Some("Segundo".into());
        let ds = Dataset::from_records(vec![rec("SP", Some(9.0), None, None), first, second]);

        let view = apply_filters(&ds, &FilterCriteria::default());
        let best = summarize(&view)
            .kpis()
            .and_then(|k| k.best_purchase.available())
            .expect("a best purchase");
        assert_eq!(best.supplier.as_deref(), Some("Primeiro"));
    }

    #[test]
    fn summarize_is_idempotent() {
        let ds = Dataset::from_records(vec![
            rec("SP", Some(1.5), Some(1.0), Some(1.5)),
            rec("RJ", Some(0.5), Some(4.0), None),
        ]);
        let view = apply_filters(&ds, &FilterCriteria::default());
        assert_eq!(summarize(&view), summarize(&view));
    }

    #[test]
    fn yearly_average_skips_null_years() {
        let mut a = rec("SP", Some(10.0), None, None);
        a.year = "2022".into();
        let mut b = rec("SP", Some(20.0), None, None);
        b.year = "2022".into();
        let mut c = rec("SP", None, None, None);
        c.year = "2023".into();
        let d = rec("SP", Some(1.0), None, None);
        let ds = Dataset::from_records(vec![a, b, c, d]);

        let view = apply_filters(&ds, &FilterCriteria::default());
        assert_eq!(
            average_by_year(&view),
            vec![("2021".to_string(), 1.0), ("2022".to_string(), 15.0)]
        );
    }
}
