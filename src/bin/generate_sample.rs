use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use bps_dashboard::data::model::Field;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const MUNICIPALITIES: &[(&str, &str)] = &[
    ("SP", "Campinas"),
    ("SP", "Santos"),
    ("SP", "São Paulo"),
    ("RJ", "Niterói"),
    ("RJ", "Rio de Janeiro"),
    ("MG", "Belo Horizonte"),
    ("MG", "Uberlândia"),
    ("BA", "Salvador"),
];

/// (description, reference unit price)
const PRODUCTS: &[(&str, f64)] = &[
    ("DIPIRONA SÓDICA 500 MG COMPRIMIDO", 0.12),
    ("DIPIRONA SÓDICA 500 MG/ML SOLUÇÃO INJETÁVEL", 0.95),
    ("PARACETAMOL 750 MG COMPRIMIDO", 0.09),
    ("SORO FISIOLÓGICO 0,9% 500 ML", 3.40),
    ("LUVA PARA PROCEDIMENTO LÁTEX TAMANHO M", 0.35),
    ("SERINGA DESCARTÁVEL 10 ML", 0.28),
    ("AMOXICILINA 500 MG CÁPSULA", 0.21),
];

const SUPPLIERS: &[&str] = &["Alfa Distribuidora", "Beta Hospitalar", "Gama Medicamentos", "Delta Saúde"];
const MANUFACTURERS: &[&str] = &["Lab Norte", "Lab Sul", "Farmacêutica Leste"];
const YEARS: &[&str] = &["2020", "2021.0", "2022", "2023", ""];

const OUTPUT_PATH: &str = "sample_bps.zip";
const ENTRY_NAME: &str = "bps_sample.csv";
const ROWS: usize = 400;

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let mut csv = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = Field::ALL.iter().map(|f| f.header()).collect();
    header.push("Código BR");
    csv.write_record(&header)?;

    for i in 0..ROWS {
        let (state, municipality) = *rng.pick(MUNICIPALITIES);
        let (product, reference) = *rng.pick(PRODUCTS);
        let supplier = *rng.pick(SUPPLIERS);
        let manufacturer = *rng.pick(MANUFACTURERS);
        let year = *rng.pick(YEARS);

        let quantity = (rng.next_f64() * 5000.0).round().max(1.0);
        let unit = reference * (0.7 + rng.next_f64() * 0.8);
        // about one row in twenty has no unit price
        let unit_text = if rng.next_f64() < 0.05 {
            String::new()
        } else {
            format!("{unit:.4}")
        };
        let total = format!("{:.2}", unit * quantity);
        let quantity = quantity.to_string();
        let code = format!("BR{:07}", 200_000 + i);

        csv.write_record([
            state,
            municipality,
            product,
            supplier,
            manufacturer,
            year,
            total.as_str(),
            unit_text.as_str(),
            quantity.as_str(),
            code.as_str(),
        ])?;
    }
    let bytes = csv.into_inner().map_err(|e| anyhow::anyhow!("flushing CSV: {}", e.error()))?;

    let file = File::create(OUTPUT_PATH).with_context(|| format!("creating {OUTPUT_PATH}"))?;
    let mut zip = ZipWriter::new(file);
    zip.start_file(ENTRY_NAME, SimpleFileOptions::default())?;
    zip.write_all(&bytes)?;
    zip.finish()?;

    println!("Wrote {ROWS} records to {OUTPUT_PATH} ({ENTRY_NAME})");
    Ok(())
}
