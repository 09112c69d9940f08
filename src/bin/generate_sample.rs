use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// (state, region, UF, capital latitude, capital longitude, municipalities)
const UFS: [(&str, &str, &str, f64, f64, usize); 27] = [
    ("Acre", "Norte", "AC", -9.97, -67.81, 22),
    ("Alagoas", "Nordeste", "AL", -9.67, -35.74, 102),
    ("Amapá", "Norte", "AP", 0.03, -51.07, 16),
    ("Amazonas", "Norte", "AM", -3.10, -60.02, 62),
    ("Bahia", "Nordeste", "BA", -12.97, -38.50, 417),
    ("Ceará", "Nordeste", "CE", -3.72, -38.54, 184),
    ("Distrito Federal", "Centro-Oeste", "DF", -15.79, -47.88, 1),
    ("Espírito Santo", "Sudeste", "ES", -20.32, -40.34, 78),
    ("Goiás", "Centro-Oeste", "GO", -16.68, -49.25, 246),
    ("Maranhão", "Nordeste", "MA", -2.53, -44.30, 217),
    ("Mato Grosso", "Centro-Oeste", "MT", -15.60, -56.10, 141),
    ("Mato Grosso do Sul", "Centro-Oeste", "MS", -20.44, -54.65, 79),
    ("Minas Gerais", "Sudeste", "MG", -19.92, -43.94, 853),
    ("Pará", "Norte", "PA", -1.46, -48.50, 144),
    ("Paraíba", "Nordeste", "PB", -7.12, -34.86, 223),
    ("Paraná", "Sul", "PR", -25.43, -49.27, 399),
    ("Pernambuco", "Nordeste", "PE", -8.05, -34.88, 185),
    ("Piauí", "Nordeste", "PI", -5.09, -42.80, 224),
    ("Rio de Janeiro", "Sudeste", "RJ", -22.91, -43.17, 92),
    ("Rio Grande do Norte", "Nordeste", "RN", -5.79, -35.21, 167),
    ("Rio Grande do Sul", "Sul", "RS", -30.03, -51.23, 497),
    ("Rondônia", "Norte", "RO", -8.76, -63.90, 52),
    ("Roraima", "Norte", "RR", 2.82, -60.67, 15),
    ("Santa Catarina", "Sul", "SC", -27.59, -48.55, 295),
    ("São Paulo", "Sudeste", "SP", -23.55, -46.63, 645),
    ("Sergipe", "Nordeste", "SE", -10.91, -37.07, 75),
    ("Tocantins", "Norte", "TO", -10.18, -48.33, 139),
];

#[derive(Serialize)]
struct Row {
    municipio: String,
    estado: &'static str,
    regiao: &'static str,
    uf: &'static str,
    latitude: f64,
    longitude: f64,
    pop_21: i64,
}

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(estado, regiao, uf, lat, lon, count) in &UFS {
        // Larger states spread their municipalities further from the capital.
        let spread = (count as f64).sqrt() * 0.25;
        for i in 0..count {
            let (latitude, longitude, pop) = if i == 0 {
                (lat, lon, rng.gauss(13.5, 0.8).exp())
            } else {
                (
                    (lat + rng.gauss(0.0, spread)).clamp(-33.7, 5.2),
                    (lon + rng.gauss(0.0, spread)).clamp(-73.9, -34.8),
                    rng.gauss(9.3, 1.1).exp(),
                )
            };
            let municipio = if i == 0 {
                format!("Capital {uf}")
            } else {
                format!("Município {uf}-{i:03}")
            };
            rows.push(Row {
                municipio,
                estado,
                regiao,
                uf,
                latitude: (latitude * 1e4).round() / 1e4,
                longitude: (longitude * 1e4).round() / 1e4,
                pop_21: pop.round().max(800.0) as i64,
            });
        }
    }
    rows
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let strings = |f: fn(&Row) -> &str| StringArray::from(rows.iter().map(f).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("municipio", DataType::Utf8, false),
        Field::new("estado", DataType::Utf8, false),
        Field::new("regiao", DataType::Utf8, false),
        Field::new("uf", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("pop_21", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(strings(|r| r.municipio.as_str())),
            Arc::new(strings(|r| r.estado)),
            Arc::new(strings(|r| r.regiao)),
            Arc::new(strings(|r| r.uf)),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.pop_21))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    let csv_path = "dados_municipais.csv";
    let parquet_path = "dados_municipais.parquet";
    write_csv(csv_path, &rows)?;
    write_parquet(parquet_path, &rows)?;

    log::info!("generated {} synthetic municipalities", rows.len());
    println!(
        "Wrote {} municipalities across {} UFs to {csv_path} and {parquet_path}",
        rows.len(),
        UFS.len()
    );
    Ok(())
}
