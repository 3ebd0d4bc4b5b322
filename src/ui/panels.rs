use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use bps_dashboard::data::cache::DatasetCache;
use bps_dashboard::data::export::{export_csv, EXPORT_FILE_NAME};
use bps_dashboard::data::filter::{FilteredView, SearchPreview, ALL};
use bps_dashboard::data::model::{Field, Record};
use bps_dashboard::data::summary::{summarize, Aggregate, Summary};
use bps_dashboard::format;
use bps_dashboard::state::AppState;

use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("Nenhuma base carregada.");
        return;
    }

    if ui.button("🔄 Resetar filtros").clicked() {
        state.reset_filters();
    }
    ui.add_space(6.0);

    for (field, label) in [
        (Field::State, "Estado"),
        (Field::Municipality, "Município"),
        (Field::Supplier, "Fornecedor"),
        (Field::Year, "Ano"),
    ] {
        selector(ui, state, field, label);
    }

    ui.add_space(6.0);
    ui.strong("🔎 Buscar produto (busca parcial)");
    let mut search = state.criteria.product_search.clone();
    if ui.text_edit_singleline(&mut search).changed() {
        state.set_search(search);
    }

    match &state.preview {
        SearchPreview::Inactive => {}
        SearchPreview::NoMatches => {
            ui.colored_label(Color32::from_rgb(200, 140, 0), "Nenhum produto encontrado com esse termo!");
        }
        SearchPreview::Matches(items) => {
            ui.label(RichText::new("Prévia dos produtos encontrados:").small().strong());
            ScrollArea::vertical()
                .id_salt("product_preview")
                .max_height(180.0)
                .show(ui, |ui: &mut Ui| {
                    for item in items {
                        ui.label(format!("• {item}"));
                    }
                });
        }
    }
}

/// A combo box over a field's candidates, with "Todos" first.
fn selector(ui: &mut Ui, state: &mut AppState, field: Field, label: &str) {
    let current = state.criteria.active(field).unwrap_or(ALL).to_string();
    let options = state.candidates.get(&field).cloned().unwrap_or_default();

    ui.strong(label);
    let mut picked: Option<Option<String>> = None;
    egui::ComboBox::from_id_salt(field.header())
        .selected_text(current.as_str())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current == ALL, ALL).clicked() {
                picked = Some(None);
            }
            for value in &options {
                if ui.selectable_label(current == *value, value.as_str()).clicked() {
                    picked = Some(Some(value.clone()));
                }
            }
        });
    if let Some(value) = picked {
        state.select(field, value);
    }
}

// ---------------------------------------------------------------------------
// Central panel – KPIs, best purchase, chart, table
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.load_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(
                RichText::new(format!("Não foi possível carregar a base de dados:\n{err}"))
                    .color(Color32::RED)
                    .heading(),
            );
        });
        return;
    }
    let Some(shared) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Abra um arquivo para começar  (Arquivo → Abrir…)");
        });
        return;
    };

    ui.heading("🩺 Dashboard BPS");
    ui.label(format!("Arquivo carregado: {}", shared.source_name));
    ui.separator();

    // borrow fields separately so the export can update the status line
    let view = FilteredView::from_indices(&shared.dataset, state.visible_indices.clone());

    ui.heading("📊 KPIs detalhados");
    let kpis = match summarize(&view) {
        Summary::NoData => {
            ui.colored_label(Color32::from_rgb(200, 140, 0), "Nenhum dado encontrado para os filtros.");
            return;
        }
        Summary::Computed(kpis) => kpis,
    };

    ui.columns(3, |cols| {
        metric(&mut cols[0], "💰 Valor total", format::brl(kpis.total_price));
        metric(&mut cols[1], "📦 Quantidade total", format::quantity(kpis.total_quantity));
        metric(
            &mut cols[2],
            "💡 Preço médio",
            format::brl_or_unavailable(kpis.average_unit_price),
        );
    });

    ui.add_space(8.0);
    ui.heading("🏆 Melhor compra");
    match kpis.best_purchase {
        Aggregate::Available(rec) => best_purchase(ui, rec),
        Aggregate::Unavailable => {
            ui.label(format!("Preço unitário {}", format::UNAVAILABLE));
        }
    }

    ui.add_space(8.0);
    plot::price_by_year(ui, &view);

    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("📄 Registros detalhados");
        if ui.button("⬇ Exportar CSV").clicked() {
            save_export(&view, &mut state.status_message);
        }
    });
    table::records_table(ui, &view);
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).heading().strong());
    });
}

fn best_purchase(ui: &mut Ui, rec: &Record) {
    let show = |ui: &mut Ui, label: &str, value: Option<&str>| {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!("{label}:"));
            ui.strong(value.unwrap_or("-"));
        });
    };
    show(ui, "Produto", rec.product_description.as_deref());
    show(ui, "Fornecedor", rec.supplier.as_deref());
    show(ui, "Fabricante", rec.manufacturer.as_deref());
    show(ui, "Ano", Some(rec.year.as_str()));
    let price = rec.unit_price.map(format::brl);
    show(ui, "Preço unitário", price.as_deref());
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Abrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.cache.is_some(), egui::Button::new("Recarregar"))
                .clicked()
            {
                reload(state);
                ui.close_menu();
            }
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Exportar CSV…"))
                .clicked()
            {
                if let Some(shared) = &state.dataset {
                    let view = FilteredView::from_indices(&shared.dataset, state.visible_indices.clone());
                    save_export(&view, &mut state.status_message);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(shared) = &state.dataset {
            ui.label(format!(
                "{} registros carregados, {} visíveis",
                shared.dataset.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::LIGHT_BLUE));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Load `path` into the state; failures become the blocking load error.
pub fn load_into(state: &mut AppState, path: &Path) {
    let cache = DatasetCache::new(path);
    match cache.get() {
        Ok(shared) => {
            log::info!(
                "Loaded {} records from {} with columns {:?}",
                shared.dataset.len(),
                shared.source_name,
                shared.dataset.column_names
            );
            state.set_dataset(shared);
        }
        Err(e) => {
            log::error!("Failed to load {}: {e}", path.display());
            state.set_load_error(e.to_string());
        }
    }
    state.cache = Some(cache);
}

/// Re-read the current file. On failure the loaded dataset stays in place.
pub fn reload(state: &mut AppState) {
    let Some(result) = state.cache.as_ref().map(DatasetCache::reload) else {
        return;
    };
    match result {
        Ok(shared) => state.replace_dataset(shared),
        Err(e) if state.dataset.is_some() => {
            log::warn!("Reload failed, keeping the loaded dataset: {e}");
            state.status_message = Some(format!("Falha ao recarregar: {e}"));
        }
        Err(e) => {
            log::error!("Reload failed: {e}");
            state.set_load_error(e.to_string());
        }
    }
}

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Abrir base BPS")
        .add_filter("Arquivos suportados", &["zip", "xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "parquet", "pq"])
        .add_filter("ZIP", &["zip"])
        .add_filter("Planilhas", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        load_into(state, &path);
    }
}

/// Ask where to save and write the CSV of `view`.
fn save_export(view: &FilteredView<'_>, status: &mut Option<String>) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Exportar dados filtrados")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    let result = export_csv(view)
        .map_err(|e| e.to_string())
        .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
    *status = Some(match result {
        Ok(()) => {
            log::info!("Exported {} records to {}", view.len(), path.display());
            format!("{} registros exportados para {}", view.len(), path.display())
        }
        Err(e) => {
            log::error!("Export to {} failed: {e}", path.display());
            format!("Falha ao exportar: {e}")
        }
    });
}
