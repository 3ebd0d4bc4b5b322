use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Plot};

use bps_dashboard::data::filter::FilteredView;
use bps_dashboard::data::summary::average_by_year;
use bps_dashboard::format;

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Average unit price per year (central panel)
// ---------------------------------------------------------------------------

/// Bar chart of the mean unit price of the visible records, one bar per year.
pub fn price_by_year(ui: &mut Ui, view: &FilteredView<'_>) {
    let yearly = average_by_year(view);
    if yearly.is_empty() {
        ui.label(format!("Preço médio por ano: {}", format::UNAVAILABLE));
        return;
    }

    let colors = ColorMap::new(yearly.iter().map(|(year, _)| year.as_str()));
    let bars: Vec<Bar> = yearly
        .iter()
        .enumerate()
        .map(|(i, (year, avg))| {
            Bar::new(i as f64, *avg)
                .name(format!("{year}: {}", format::brl(*avg)))
                .fill(colors.color_for(year))
                .width(0.6)
        })
        .collect();
    let labels: Vec<String> = yearly.into_iter().map(|(year, _)| year).collect();

    Plot::new("price_by_year")
        .height(180.0)
        .x_axis_label("Ano")
        .y_axis_label("Preço médio (R$)")
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Preço médio"));
        });
}
