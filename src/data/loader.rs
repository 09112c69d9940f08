use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{COLUMNS, MunicipalDataset, MunicipalRecord, population_from_f64};

/// Typed failures raised while reading a municipal file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("row {row}: column '{column}' has unsupported type {data_type}")]
    UnsupportedType {
        row: usize,
        column: &'static str,
        data_type: String,
    },

    #[error("row {row}: '{municipio}' has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        row: usize,
        municipio: String,
        latitude: f64,
        longitude: f64,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a municipal dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header `municipio,estado,regiao,uf,latitude,longitude,pop_21`
/// * `.json`    – `[{ "municipio": ..., "estado": ..., ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_file(path: &Path) -> Result<MunicipalDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            read_csv(file)?
        }
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "Loaded {} municipalities across {} states from {}",
        dataset.len(),
        dataset.states.len(),
        path.display()
    );
    Ok(dataset)
}

fn validate(records: Vec<MunicipalRecord>) -> Result<MunicipalDataset> {
    for (row, r) in records.iter().enumerate() {
        if !r.has_valid_coordinates() {
            return Err(LoadError::InvalidCoordinates {
                row,
                municipio: r.municipio.clone(),
                latitude: r.latitude,
                longitude: r.longitude,
            }
            .into());
        }
    }
    Ok(MunicipalDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV text with a header row. Extra columns are ignored; every name in
/// [`COLUMNS`] must be present.
pub fn read_csv<R: Read>(source: R) -> Result<MunicipalDataset> {
    let mut reader = csv::Reader::from_reader(source);
    let headers = reader.headers().context("reading CSV headers")?.clone();

    for column in COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn { column }.into());
        }
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<MunicipalRecord>().enumerate() {
        // Header is line 1.
        let record = result.with_context(|| format!("CSV line {}", row_no + 2))?;
        records.push(record);
    }

    validate(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<MunicipalDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<MunicipalRecord> = serde_json::from_str(&text).context("parsing JSON")?;
    validate(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per record field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<MunicipalDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        records_from_batch(&batch, records.len(), &mut records)?;
    }

    validate(records)
}

/// Append the rows of one record batch. `offset` is the absolute row number of
/// the batch's first row, used in error messages.
pub(crate) fn records_from_batch(
    batch: &RecordBatch,
    offset: usize,
    out: &mut Vec<MunicipalRecord>,
) -> Result<()> {
    let municipio = column(batch, "municipio")?;
    let estado = column(batch, "estado")?;
    let regiao = column(batch, "regiao")?;
    let uf = column(batch, "uf")?;
    let latitude = column(batch, "latitude")?;
    let longitude = column(batch, "longitude")?;
    let pop_21 = column(batch, "pop_21")?;

    for row in 0..batch.num_rows() {
        let abs = offset + row;
        out.push(MunicipalRecord {
            municipio: extract_string(municipio, row, abs, "municipio")?,
            estado: extract_string(estado, row, abs, "estado")?,
            regiao: extract_string(regiao, row, abs, "regiao")?,
            uf: extract_string(uf, row, abs, "uf")?,
            latitude: extract_f64(latitude, row, abs, "latitude")?,
            longitude: extract_f64(longitude, row, abs, "longitude")?,
            pop_21: extract_population(pop_21, row, abs)?,
        });
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| LoadError::MissingColumn { column: name })?;
    Ok(batch.column(idx))
}

fn unsupported(col: &Arc<dyn Array>, abs: usize, column: &'static str) -> anyhow::Error {
    LoadError::UnsupportedType {
        row: abs,
        column,
        data_type: format!("{:?}", col.data_type()),
    }
    .into()
}

fn extract_string(
    col: &Arc<dyn Array>,
    row: usize,
    abs: usize,
    column: &'static str,
) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        _ => Err(unsupported(col, abs, column)),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize, abs: usize, column: &'static str) -> Result<f64> {
    if col.is_null(row) {
        bail!("row {abs}: null value in '{column}'");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        Err(unsupported(col, abs, column))
    }
}

fn extract_population(col: &Arc<dyn Array>, row: usize, abs: usize) -> Result<u64> {
    if col.is_null(row) {
        bail!("row {abs}: null value in 'pop_21'");
    }
    let value = match col.data_type() {
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        DataType::Float64 | DataType::Float32 => extract_f64(col, row, abs, "pop_21")?,
        _ => return Err(unsupported(col, abs, "pop_21")),
    };
    population_from_f64(value).map_err(|e| anyhow::anyhow!("row {abs}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
municipio,estado,regiao,uf,latitude,longitude,pop_21
São Paulo,São Paulo,Sudeste,SP,-23.55,-46.63,12396372
Manaus,Amazonas,Norte,AM,-3.10,-60.02,2255903
Salvador,Bahia,Nordeste,BA,-12.97,-38.50,2900319.0
";

    #[test]
    fn reads_csv_rows() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[0].uf, "SP");
        assert_eq!(ds.records[2].pop_21, 2_900_319);
        assert!(ds.states.contains("Amazonas"));
    }

    #[test]
    fn reports_missing_column() {
        let text = "municipio,estado,regiao,latitude,longitude,pop_21\nA,B,C,1,2,3\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::MissingColumn { column }) => assert_eq!(*column, "uf"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_row_names_file_line() {
        let text = format!("{SAMPLE}Recife,Pernambuco,Nordeste,PE,abc,-34.88,1661017\n");
        assert_eq!(text.lines().nth(4).map(|l| l.starts_with("Recife")), Some(true));
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV line 5"), "{err:#}");
    }

    #[test]
    fn rejects_invalid_coordinates() {
        let text = "municipio,estado,regiao,uf,latitude,longitude,pop_21\nA,B,C,D,120,2,3\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::InvalidCoordinates { row: 0, .. })
        ));
    }

    #[test]
    fn dispatches_by_extension() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("dados.CSV");
        std::fs::write(&csv_path, SAMPLE).unwrap();
        assert_eq!(load_file(&csv_path).unwrap().len(), 3);

        let json_path = dir.path().join("dados.json");
        let records = read_csv(SAMPLE.as_bytes()).unwrap().records;
        std::fs::write(&json_path, serde_json::to_string(&records).unwrap()).unwrap();
        assert_eq!(load_file(&json_path).unwrap().records, records);

        let txt_path = dir.path().join("dados.txt");
        std::fs::write(&txt_path, SAMPLE).unwrap();
        assert!(load_file(&txt_path).is_err());
    }

    #[test]
    fn reads_parquet_with_int32_population() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("municipio", DataType::Utf8, false),
            Field::new("estado", DataType::Utf8, false),
            Field::new("regiao", DataType::Utf8, false),
            Field::new("uf", DataType::Utf8, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float32, false),
            Field::new("pop_21", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Palmas", "Belém"])),
                Arc::new(StringArray::from(vec!["Tocantins", "Pará"])),
                Arc::new(StringArray::from(vec!["Norte", "Norte"])),
                Arc::new(StringArray::from(vec!["TO", "PA"])),
                Arc::new(Float64Array::from(vec![-10.18, -1.45])),
                Arc::new(Float32Array::from(vec![-48.33_f32, -48.50])),
                Arc::new(Int32Array::from(vec![313_349, 1_506_420])),
            ],
        )
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dados.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].municipio, "Belém");
        assert_eq!(ds.records[1].pop_21, 1_506_420);
        assert!((ds.records[0].longitude + 48.33).abs() < 1e-4);
    }

    #[test]
    fn parquet_batch_without_uf_is_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("municipio", DataType::Utf8, false),
            Field::new("estado", DataType::Utf8, false),
            Field::new("regiao", DataType::Utf8, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("pop_21", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Palmas"])),
                Arc::new(StringArray::from(vec!["Tocantins"])),
                Arc::new(StringArray::from(vec!["Norte"])),
                Arc::new(Float64Array::from(vec![-10.18])),
                Arc::new(Float64Array::from(vec![-48.33])),
                Arc::new(Int64Array::from(vec![313_349])),
            ],
        )
        .unwrap();
        let mut out = Vec::new();
        let err = records_from_batch(&batch, 0, &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumn { column: "uf" })
        ));
        assert!(out.is_empty());
    }
}
