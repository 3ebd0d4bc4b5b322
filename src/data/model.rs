use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Display value for a year that is missing or could not be read.
pub const NOT_INFORMED: &str = "Não informado";

// ---------------------------------------------------------------------------
// RawCell – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A loosely-typed cell, common to every supported source format.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    /// Text rendering used for categorical columns. Blank text is `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) if s.trim().is_empty() => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(v) if v.is_finite() => Some(v.to_string()),
            RawCell::Number(_) => None,
        }
    }

    /// Numeric coercion: anything that is not a finite decimal becomes `None`.
    pub fn as_number(&self) -> Option<f64> {
        let v = match self {
            RawCell::Empty => return None,
            RawCell::Number(v) => *v,
            RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Year normalisation: strip every trailing `.0` left by numeric-to-text
    /// conversion and map blanks / `nan` to [`NOT_INFORMED`].
    pub fn as_year(&self) -> String {
        let Some(text) = self.as_text() else {
            return NOT_INFORMED.to_string();
        };
        let text = text.trim();
        let text = text.trim_end_matches(".0");
        if text.is_empty() || text.eq_ignore_ascii_case("nan") {
            NOT_INFORMED.to_string()
        } else {
            text.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Field – the mapped columns of a procurement record
// ---------------------------------------------------------------------------

/// Columns the dashboard understands, with their source header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    State,
    Municipality,
    ProductDescription,
    Supplier,
    Manufacturer,
    Year,
    TotalPrice,
    UnitPrice,
    QuantityPurchased,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::State,
        Field::Municipality,
        Field::ProductDescription,
        Field::Supplier,
        Field::Manufacturer,
        Field::Year,
        Field::TotalPrice,
        Field::UnitPrice,
        Field::QuantityPurchased,
    ];

    /// Header text in the source spreadsheet (after trimming).
    pub fn header(self) -> &'static str {
        match self {
            Field::State => "UF",
            Field::Municipality => "Município Instituição",
            Field::ProductDescription => "Descrição CATMAT",
            Field::Supplier => "Fornecedor",
            Field::Manufacturer => "Fabricante",
            Field::Year => "Ano",
            Field::TotalPrice => "Preço Total",
            Field::UnitPrice => "Preço Unitário",
            Field::QuantityPurchased => "Qtd Itens Comprados",
        }
    }

    pub fn from_header(header: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.header() == header)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::TotalPrice | Field::UnitPrice | Field::QuantityPurchased
        )
    }

    /// The field whose selection narrows this field's candidate list.
    pub fn upstream(self) -> Option<Field> {
        match self {
            Field::Municipality => Some(Field::State),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the spreadsheet
// ---------------------------------------------------------------------------

/// A single procurement record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub state: Option<String>,
    pub municipality: Option<String>,
    pub product_description: Option<String>,
    pub supplier: Option<String>,
    pub manufacturer: Option<String>,
    /// Always present; see [`NOT_INFORMED`].
    pub year: String,
    pub total_price: Option<f64>,
    pub unit_price: Option<f64>,
    pub quantity_purchased: Option<f64>,
    /// Unmapped source columns: column_name → text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Text value of a categorical field. Numeric fields return `None`.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::State => self.state.as_deref(),
            Field::Municipality => self.municipality.as_deref(),
            Field::ProductDescription => self.product_description.as_deref(),
            Field::Supplier => self.supplier.as_deref(),
            Field::Manufacturer => self.manufacturer.as_deref(),
            Field::Year => Some(self.year.as_str()),
            Field::TotalPrice | Field::UnitPrice | Field::QuantityPurchased => None,
        }
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::TotalPrice => self.total_price,
            Field::UnitPrice => self.unit_price,
            Field::QuantityPurchased => self.quantity_purchased,
            _ => None,
        }
    }

    /// Cell text for `column` as written by the CSV export. Nulls are empty.
    pub fn cell(&self, column: &str) -> String {
        match Field::from_header(column) {
            Some(field) if field.is_numeric() => {
                self.number(field).map(|v| v.to_string()).unwrap_or_default()
            }
            Some(field) => self.text(field).unwrap_or_default().to_string(),
            None => self.extra.get(column).cloned().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Never mutated after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All records, in source order.
    pub records: Vec<Record>,
    /// Trimmed source column names, in source order.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset carrying the nine mapped columns only.
    pub fn from_records(records: Vec<Record>) -> Self {
        Dataset {
            records,
            column_names: Field::ALL.iter().map(|f| f.header().to_string()).collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
