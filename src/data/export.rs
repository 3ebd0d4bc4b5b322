use thiserror::Error;

use super::filter::FilteredView;

/// Default file name offered when saving an export.
pub const EXPORT_FILE_NAME: &str = "BPS_filtrado.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("flushing CSV buffer: {0}")]
    Flush(String),
}

/// Serialise a filtered view to UTF-8 CSV: the dataset's columns in source
/// order, then the rows in view order. Nulls are written as empty fields.
pub fn export_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, ExportError> {
    let columns = &view.dataset.column_names;
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(columns)?;
    for rec in view.iter() {
        writer.write_record(columns.iter().map(|col| rec.cell(col)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterCriteria};
    use crate::data::model::{Dataset, Record};

    #[test]
    fn header_and_rows_in_order() {
        let ds = Dataset::from_records(vec![
            Record {
                state: Some("SP".into()),
                product_description: Some("Luva, látex \"M\"".into()),
                year: "2021".into(),
                unit_price: Some(0.35),
                quantity_purchased: Some(100.0),
                ..Default::default()
            },
            Record {
                state: Some("RJ".into()),
                year: "2020".into(),
                ..Default::default()
            },
        ]);
        let bytes = export_csv(&apply_filters(&ds, &FilterCriteria::default())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "UF,Município Instituição,Descrição CATMAT,Fornecedor,Fabricante,Ano,Preço Total,Preço Unitário,Qtd Itens Comprados"
        );
        assert_eq!(lines[1], "SP,,\"Luva, látex \"\"M\"\"\",,,2021,,0.35,100");
        assert_eq!(lines[2], "RJ,,,,,2020,,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_view_exports_header_only() {
        let ds = Dataset::from_records(vec![Record::default()]);
        let criteria = FilterCriteria {
            year: Some("1999".into()),
            ..Default::default()
        };
        let bytes = export_csv(&apply_filters(&ds, &criteria)).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 1);
    }
}
