use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use bps_dashboard::data::filter::FilteredView;

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable table of the visible records, all dataset columns.
pub fn records_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let columns = &view.dataset.column_names;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .min_scrolled_height(0.0)
        .columns(Column::auto().at_least(60.0).clip(true), columns.len())
        .header(ROW_HEIGHT + 4.0, |mut header| {
            for name in columns {
                header.col(|ui| {
                    ui.strong(name.as_str());
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, view.len(), |mut row| {
                let Some(rec) = view.get(row.index()) else {
                    return;
                };
                for name in columns {
                    row.col(|ui| {
                        ui.label(rec.cell(name));
                    });
                }
            });
        });
}
