// src/bin/cli.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use bps_dashboard::config::AppConfig;
use bps_dashboard::data::export::export_csv;
use bps_dashboard::data::filter::{apply_filters, candidates, preview_products, FilterCriteria, SearchPreview};
use bps_dashboard::data::loader::load_file;
use bps_dashboard::data::model::Field;
use bps_dashboard::data::summary::{summarize, Aggregate, Summary};
use bps_dashboard::format;

/// Filter, summarise and export the BPS procurement dataset without the GUI.
#[derive(Debug, Parser)]
#[command(name = "cli", version, about)]
struct Args {
    /// Dataset to load (.zip, .xlsx, .csv, .parquet). Defaults to $BPS_ARCHIVE
    /// or the bundled archive name.
    #[arg(long)]
    archive: Option<PathBuf>,

    /// JSON file with saved filter criteria; the flags below override it.
    #[arg(long)]
    criteria: Option<PathBuf>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    municipality: Option<String>,

    #[arg(long)]
    supplier: Option<String>,

    #[arg(long)]
    year: Option<String>,

    /// Partial, case-insensitive product search.
    #[arg(long)]
    search: Option<String>,

    /// Print the candidate values of a selector and exit.
    #[arg(long, value_enum)]
    list: Option<Selector>,

    /// Print the product preview for --search.
    #[arg(long)]
    preview: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,

    /// Write the filtered records as CSV to this path.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Selector {
    State,
    Municipality,
    Supplier,
    Year,
}

impl From<Selector> for Field {
    fn from(s: Selector) -> Self {
        match s {
            Selector::State => Field::State,
            Selector::Municipality => Field::Municipality,
            Selector::Supplier => Field::Supplier,
            Selector::Year => Field::Year,
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn build_criteria(args: &Args) -> Result<FilterCriteria> {
    let mut criteria = match &args.criteria {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading criteria file {}", path.display()))?;
            serde_json::from_str(&text).context("parsing criteria JSON")?
        }
        None => FilterCriteria::default(),
    };
    for (field, value) in [
        (Field::State, &args.state),
        (Field::Municipality, &args.municipality),
        (Field::Supplier, &args.supplier),
        (Field::Year, &args.year),
    ] {
        if let Some(value) = value {
            criteria.select(field, Some(value.clone()));
        }
    }
    if let Some(search) = &args.search {
        criteria.product_search = search.clone();
    }
    Ok(criteria)
}

fn run(args: Args) -> Result<()> {
    let config = AppConfig::from_env().with_archive(args.archive.clone());
    let criteria = build_criteria(&args)?;

    let loaded = load_file(&config.archive_path)
        .with_context(|| format!("loading {}", config.archive_path.display()))?;
    let dataset = &loaded.dataset;
    log::info!("Arquivo carregado: {}", loaded.source_name);

    if let Some(selector) = args.list {
        for value in candidates(dataset, selector.into(), &criteria) {
            println!("{value}");
        }
        return Ok(());
    }

    let preview = args
        .preview
        .then(|| preview_products(dataset, &criteria.product_search, config.preview_limit));
    let view = apply_filters(dataset, &criteria);
    let summary = summarize(&view);

    if args.json {
        let report = match &preview {
            Some(preview) => {
                let mut report = serde_json::Map::new();
                report.insert("preview".into(), serde_json::to_value(preview)?);
                report.insert("summary".into(), serde_json::to_value(&summary)?);
                serde_json::Value::Object(report)
            }
            None => serde_json::to_value(&summary)?,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(preview) = &preview {
            print_preview(preview);
        }
        print_summary(&summary);
    }

    if let Some(path) = &args.export {
        let bytes = export_csv(&view)?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported {} records to {}", view.len(), path.display());
        eprintln!("{} registros exportados para {}", view.len(), path.display());
    }
    Ok(())
}

fn print_preview(preview: &SearchPreview) {
    match preview {
        SearchPreview::Inactive => println!("(sem termo de busca)"),
        SearchPreview::NoMatches => println!("Nenhum produto encontrado com esse termo!"),
        SearchPreview::Matches(items) => {
            for item in items {
                println!("- {item}");
            }
        }
    }
}

fn print_summary(summary: &Summary<'_>) {
    let kpis = match summary {
        Summary::NoData => {
            println!("Nenhum dado encontrado para os filtros.");
            return;
        }
        Summary::Computed(kpis) => kpis,
    };
    println!("Registros:          {}", kpis.rows);
    println!("Valor total:        {}", format::brl(kpis.total_price));
    println!("Quantidade total:   {}", format::quantity(kpis.total_quantity));
    println!("Preço médio:        {}", format::brl_or_unavailable(kpis.average_unit_price));
    match kpis.best_purchase {
        Aggregate::Available(rec) => {
            println!("Melhor compra:");
            println!("  Produto:        {}", rec.product_description.as_deref().unwrap_or("-"));
            println!("  Fornecedor:     {}", rec.supplier.as_deref().unwrap_or("-"));
            println!("  Fabricante:     {}", rec.manufacturer.as_deref().unwrap_or("-"));
            println!("  Ano:            {}", rec.year);
            if let Some(price) = rec.unit_price {
                println!("  Preço unitário: {}", format::brl(price));
            }
        }
        Aggregate::Unavailable => println!("Melhor compra:      {}", format::UNAVAILABLE),
    }
}
