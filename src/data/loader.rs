use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Int16Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{AgeGroup, CaseDataset, CaseRecord};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ano",
    "semana",
    "departamento",
    "provincia",
    "distrito",
    "sexo",
    "tipo_edad",
];

/// Validation failures while reading case records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: epidemiological week {week} is outside 1..=53")]
    WeekOutOfRange { row: usize, week: i64 },

    #[error("row {row}: column '{column}' has unusable value {value}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a case dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required columns (recommended)
/// * `.parquet` – one column per required field
/// * `.json`    – `[{ "ano": 2023, "semana": 7, ... }, ...]`
pub fn load_file(path: &Path) -> Result<CaseDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => Err(DataError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} case records from {} ({} departments, years {:?})",
        dataset.len(),
        path.display(),
        dataset.departments.len(),
        dataset.years
    );
    Ok(dataset)
}

/// One row as it appears in the source files.
#[derive(Debug, Deserialize)]
struct RawCase {
    ano: i64,
    semana: i64,
    departamento: String,
    provincia: String,
    distrito: String,
    sexo: String,
    tipo_edad: String,
}

impl RawCase {
    fn into_record(self, row: usize) -> Result<CaseRecord, DataError> {
        if !(1..=53).contains(&self.semana) {
            return Err(DataError::WeekOutOfRange {
                row,
                week: self.semana,
            });
        }
        let year = i32::try_from(self.ano).map_err(|_| DataError::InvalidValue {
            row,
            column: "ano",
            value: self.ano.to_string(),
        })?;

        Ok(CaseRecord {
            year,
            week: self.semana as u32,
            department: self.departamento,
            province: self.provincia,
            district: self.distrito,
            sex: self.sexo,
            age_group: AgeGroup::parse(&self.tipo_edad),
        })
    }
}

fn check_columns<'a, I>(present: I) -> Result<(), DataError>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    match REQUIRED_COLUMNS.iter().find(|c| !present.contains(*c)) {
        Some(missing) => Err(DataError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. Columns beyond the required
/// ones are ignored.
fn load_csv(path: &Path) -> Result<CaseDataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<CaseDataset> {
    let headers = reader.headers().context("reading CSV headers")?.clone();
    check_columns(headers.iter())?;

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawCase>().enumerate() {
        let raw = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(raw.into_record(row_no)?);
    }

    Ok(CaseDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<CaseDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<RawCase> = serde_json::from_str(&text).context("parsing JSON")?;

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CaseDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per required field. `ano` and
/// `semana` may be any integer width; the text columns may be `Utf8` or
/// `LargeUtf8`.
fn load_parquet(path: &Path) -> Result<CaseDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        check_columns(schema.fields().iter().map(|f| f.name().as_str()))?;

        let ano = column(&batch, "ano")?;
        let semana = column(&batch, "semana")?;
        let departamento = column(&batch, "departamento")?;
        let provincia = column(&batch, "provincia")?;
        let distrito = column(&batch, "distrito")?;
        let sexo = column(&batch, "sexo")?;
        let tipo_edad = column(&batch, "tipo_edad")?;

        for row in 0..batch.num_rows() {
            let row_no = records.len();
            let raw = RawCase {
                ano: extract_int(ano, row).with_context(|| format!("Row {row_no}: 'ano'"))?,
                semana: extract_int(semana, row)
                    .with_context(|| format!("Row {row_no}: 'semana'"))?,
                departamento: extract_string(departamento, row)
                    .with_context(|| format!("Row {row_no}: 'departamento'"))?,
                provincia: extract_string(provincia, row)
                    .with_context(|| format!("Row {row_no}: 'provincia'"))?,
                distrito: extract_string(distrito, row)
                    .with_context(|| format!("Row {row_no}: 'distrito'"))?,
                sexo: extract_string(sexo, row).with_context(|| format!("Row {row_no}: 'sexo'"))?,
                tipo_edad: extract_string(tipo_edad, row)
                    .with_context(|| format!("Row {row_no}: 'tipo_edad'"))?,
            };
            records.push(raw.into_record(row_no)?);
        }
    }

    Ok(CaseDataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Arc<dyn Array>, DataError> {
    let idx = batch
        .schema_ref()
        .index_of(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    Ok(batch.column(idx))
}

fn extract_int(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    match col.data_type() {
        DataType::Int16 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int16Array>()
                .context("expected Int16Array")?;
            Ok(i64::from(arr.value(row)))
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(i64::from(arr.value(row)))
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row))
        }
        other => bail!("expected an integer column, got {other:?}"),
    }
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in text column");
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
        other => bail!("expected a text column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::LargeStringArray;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::Builder;

    const HEADER: &str = "ano,semana,departamento,provincia,distrito,sexo,tipo_edad,extra";

    fn csv_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    #[test]
    fn loads_csv_rows_in_order() {
        let file = csv_file(&format!(
            "{HEADER}\n\
             2022,1,LIMA,LIMA,ATE,M,ADULTOS,x\n\
             2022,1,LIMA,LIMA,COMAS,F,NIÑOS,y\n\
             2022,2,CALLAO,CALLAO,VENTANILLA,M,ADULTOS MAYORES,z\n"
        ));
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[1].district, "COMAS");
        assert_eq!(ds.records[1].age_group, AgeGroup::Children);
        assert_eq!(ds.records[2].age_group, AgeGroup::OlderAdults);
        assert_eq!(ds.week_bounds, Some((1, 2)));
    }

    #[test]
    fn missing_column_is_reported() {
        let file = csv_file("ano,semana,departamento\n2022,1,LIMA\n");
        let err = load_file(file.path()).unwrap_err();
        let data_err = err.downcast_ref::<DataError>();
        assert!(
            matches!(data_err, Some(DataError::MissingColumn(c)) if c == "provincia"),
            "{err:#}"
        );
    }

    #[test]
    fn week_out_of_range_is_rejected() {
        let file = csv_file(&format!("{HEADER}\n2022,54,LIMA,LIMA,ATE,M,ADULTOS,\n"));
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::WeekOutOfRange { row: 0, week: 54 })
        ));
    }

    #[test]
    fn unparsable_number_fails_whole_load() {
        let file = csv_file(&format!(
            "{HEADER}\n2022,1,LIMA,LIMA,ATE,M,ADULTOS,\nabc,1,LIMA,LIMA,ATE,M,ADULTOS,\n"
        ));
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_file(Path::new("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("cases.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn loads_json_records() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"ano": 2023, "semana": 10, "departamento": "PIURA", "provincia": "SULLANA",
                 "distrito": "BELLAVISTA", "sexo": "F", "tipo_edad": "JOVENES"}}]"#
        )
        .unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].age_group, AgeGroup::YoungAdults);
        assert!(ds.sexes.contains("F"));
    }

    /// Parquet file with an `Int32` year and a `LargeUtf8` department, one
    /// row per entry of `weeks`.
    fn parquet_file(weeks: Vec<Option<i64>>) -> tempfile::NamedTempFile {
        let n = weeks.len();
        let text = |value: &str| Arc::new(StringArray::from(vec![value; n])) as Arc<dyn Array>;
        let schema = Arc::new(Schema::new(vec![
            Field::new("ano", DataType::Int32, false),
            Field::new("semana", DataType::Int64, true),
            Field::new("departamento", DataType::LargeUtf8, false),
            Field::new("provincia", DataType::Utf8, false),
            Field::new("distrito", DataType::Utf8, false),
            Field::new("sexo", DataType::Utf8, false),
            Field::new("tipo_edad", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![2023; n])),
                Arc::new(Int64Array::from(weeks)),
                Arc::new(LargeStringArray::from(vec!["PIURA"; n])),
                text("SULLANA"),
                text("BELLAVISTA"),
                text("F"),
                text("ADOLESCENTES"),
            ],
        )
        .unwrap();

        let file = Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        file
    }

    #[test]
    fn loads_parquet_with_mixed_column_types() {
        let file = parquet_file(vec![Some(3), Some(9)]);
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].year, 2023);
        assert_eq!(ds.records[0].department, "PIURA");
        assert_eq!(ds.records[1].age_group, AgeGroup::Adolescents);
        assert_eq!(ds.week_bounds, Some((3, 9)));
    }

    #[test]
    fn parquet_week_out_of_range_names_the_row() {
        let file = parquet_file(vec![Some(1), Some(60)]);
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::WeekOutOfRange { row: 1, week: 60 })
        ));
        assert_eq!(
            err.to_string(),
            "row 1: epidemiological week 60 is outside 1..=53"
        );
    }

    #[test]
    fn parquet_null_week_fails_the_load() {
        let file = parquet_file(vec![Some(1), None]);
        let err = load_file(file.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Row 1: 'semana'"), "{message}");
        assert!(message.contains("null value"), "{message}");
    }
}
