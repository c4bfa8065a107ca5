use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{Channel, Facet, FacetTuple, MetadataValue, RawColumns, SignalTable};

pub const TIME_COLUMN: &str = "time_ms";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a recording table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – one row per sample, header row with column names
/// * `.parquet` – flat scalar columns, as written by Pandas or Polars
/// * `.json`    – `[{ "time_ms": 0, "speaker": 1, ... }, ...]`
pub fn load_file(path: &Path) -> Result<SignalTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => Err(DataError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let table = SignalTable::from_columns(raw);
    log::info!(
        "Loaded {} rows in {} sessions from {}",
        table.len(),
        table.sessions().len(),
        path.display()
    );
    Ok(table)
}

/// Every column a source file must carry.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    std::iter::once(TIME_COLUMN)
        .chain(Facet::ALL.into_iter().map(Facet::column_name))
        .chain(Channel::RAW.into_iter().map(Channel::column_name))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions of the required fields within a header row.
struct ColumnIndex {
    time: usize,
    facets: [usize; 4],
    channels: [usize; 9],
}

impl ColumnIndex {
    fn resolve<F>(mut position: F) -> Result<Self, DataError>
    where
        F: FnMut(&'static str) -> Option<usize>,
    {
        let mut found = [0; 14];
        for (slot, name) in found.iter_mut().zip(required_columns()) {
            *slot = position(name).ok_or(DataError::MissingColumn(name))?;
        }
        let [time, speaker, rhyme, hand, rate, channels @ ..] = found;
        Ok(Self {
            time,
            facets: [speaker, rhyme, hand, rate],
            channels,
        })
    }
}

fn load_csv(path: &Path) -> Result<RawColumns> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let index = ColumnIndex::resolve(|name| headers.iter().position(|h| h == name))?;

    let mut raw = RawColumns::default();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let time = parse_signal(cell(index.time), row_no, TIME_COLUMN)?
            .ok_or(DataError::MissingTime { row: row_no })?;

        let [s, r, h, sr] = index.facets.map(|i| MetadataValue::infer(cell(i)));
        let facets = FacetTuple::new(s, r, h, sr);

        let mut values = [None; 9];
        for ((slot, &col), channel) in values.iter_mut().zip(&index.channels).zip(Channel::RAW) {
            *slot = parse_signal(cell(col), row_no, channel.column_name())?;
        }

        raw.push_row(time, facets, values);
    }

    Ok(raw)
}

/// Parse a numeric cell. Empty, `NaN` and infinite values are missing.
fn parse_signal(s: &str, row: usize, column: &'static str) -> Result<Option<f64>, DataError> {
    if s.is_empty() {
        return Ok(None);
    }
    let v = s.parse::<f64>().map_err(|_| DataError::InvalidNumber {
        row,
        column,
        value: s.to_string(),
    })?;
    Ok(v.is_finite().then_some(v))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "time_ms": 0.0, "speaker": 1, "rhyme_name": "ent", "point_hand": "_L",
///     "speech_rate": "normal", "env": 0.12, "f0": 0, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawColumns> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut raw = RawColumns::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let field = |name: &'static str| obj.get(name).ok_or(DataError::MissingColumn(name));

        let time = json_to_signal(field(TIME_COLUMN)?, i, TIME_COLUMN)?
            .ok_or(DataError::MissingTime { row: i })?;

        let facet = |f: Facet| field(f.column_name()).map(json_to_metadata);
        let facets = FacetTuple::new(
            facet(Facet::Speaker)?,
            facet(Facet::RhymeName)?,
            facet(Facet::PointHand)?,
            facet(Facet::SpeechRate)?,
        );

        let mut values = [None; 9];
        for (slot, channel) in values.iter_mut().zip(Channel::RAW) {
            let name = channel.column_name();
            *slot = json_to_signal(field(name)?, i, name)?;
        }

        raw.push_row(time, facets, values);
    }

    Ok(raw)
}

fn json_to_signal(val: &JsonValue, row: usize, column: &'static str) -> Result<Option<f64>, DataError> {
    match val {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite())),
        other => Err(DataError::InvalidNumber {
            row,
            column,
            value: other.to_string(),
        }),
    }
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Signal columns may be Float64, Float32, Int64 or Int32. Facet columns may
/// be strings, integers, floats or booleans.
fn load_parquet(path: &Path) -> Result<RawColumns> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    // Checked against the file schema so an empty file is still validated.
    let index = ColumnIndex::resolve(|name| builder.schema().index_of(name).ok())?;
    let reader = builder.build().context("building parquet reader")?;

    let mut raw = RawColumns::default();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let row_no = row_offset + row;
            let time = extract_f64(batch.column(index.time), row, row_no, TIME_COLUMN)?
                .ok_or(DataError::MissingTime { row: row_no })?;

            let [s, r, h, sr] = index
                .facets
                .map(|i| extract_metadata_value(batch.column(i), row));

            let mut values = [None; 9];
            for ((slot, &col), channel) in values.iter_mut().zip(&index.channels).zip(Channel::RAW) {
                *slot = extract_f64(batch.column(col), row, row_no, channel.column_name())?;
            }

            raw.push_row(time, FacetTuple::new(s, r, h, sr), values);
        }
        row_offset += batch.num_rows();
    }

    Ok(raw)
}

// -- Parquet / Arrow helpers --

/// Extract a numeric cell as `f64`. Nulls and non-finite values are missing.
fn extract_f64(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    column: &'static str,
) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let v = match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        other => bail!(DataError::InvalidNumber {
            row: row_no,
            column,
            value: format!("{other:?}"),
        }),
    };
    Ok(v.is_finite().then_some(v))
}

/// Extract a single facet value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => MetadataValue::Bool(col.as_boolean().value(row)),
        _ => MetadataValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str =
        "time_ms,speaker,rhyme_name,point_hand,speech_rate,env,env_att,f0,m_fing,m_wrist,m_elb,a_fing,a_wrist,a_elb";

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_and_derives_velocity() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ts.csv",
            &format!(
                "{HEADER}\n\
                 0,1,ent,_L,normal,0.1,0.1,0,1.0,2.0,3.0,0,0,0\n\
                 10,1,ent,_L,normal,0.2,0.1,110,1.5,2.5,3.0,0,0,0\n\
                 20,1,ent,_L,normal,0.3,,,2.5,2.0,3.5,0,0,0\n"
            ),
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.time_ms(), &[0.0, 10.0, 20.0]);
        assert_eq!(table.column(Channel::F0), &[Some(0.0), Some(110.0), None]);
        assert_eq!(table.column(Channel::VFing), &[None, Some(0.5), Some(1.0)]);
        assert_eq!(table.column(Channel::VWrist), &[None, Some(0.5), Some(-0.5)]);
        assert!(table
            .facet_values(Facet::Speaker)
            .contains(&MetadataValue::Integer(1)));
    }

    #[test]
    fn missing_column_is_fatal_and_named() {
        let dir = TempDir::new().unwrap();
        let header = HEADER.replace(",a_elb", "");
        let path = write(&dir, "ts.csv", &format!("{header}\n"));

        let err = load_file(&path).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::MissingColumn(name)) => assert_eq!(*name, "a_elb"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_signal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ts.csv",
            &format!("{HEADER}\n0,1,ent,_L,normal,loud,0,0,0,0,0,0,0,0\n"),
        );

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::InvalidNumber { column: "env", .. })
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ts.xlsx", "");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn loads_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ts.json",
            r#"[
              {"time_ms": 0, "speaker": "1", "rhyme_name": "ent", "point_hand": "_R",
               "speech_rate": "fast", "env": 0.1, "env_att": 0.1, "f0": 0,
               "m_fing": 1.0, "m_wrist": 1.0, "m_elb": 1.0,
               "a_fing": 0, "a_wrist": 0, "a_elb": 0},
              {"time_ms": 5, "speaker": "1", "rhyme_name": "ent", "point_hand": "_R",
               "speech_rate": "fast", "env": null, "env_att": 0.1, "f0": 95.5,
               "m_fing": 4.0, "m_wrist": 1.0, "m_elb": 1.0,
               "a_fing": 0, "a_wrist": 0, "a_elb": 0}
            ]"#,
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(Channel::Env), &[Some(0.1), None]);
        assert_eq!(table.column(Channel::VFing), &[None, Some(3.0)]);
        let key = FacetTuple::new("1", "ent", "_R", "fast");
        assert!(table.session(&key).is_some());
    }

    #[test]
    fn json_row_without_required_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ts.json", r#"[{"time_ms": 0, "speaker": 1}]"#);

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingColumn("rhyme_name"))
        ));
    }

    #[test]
    fn required_columns_cover_time_facets_and_raw_signals() {
        let cols: Vec<&str> = required_columns().collect();
        assert_eq!(cols.len(), 14);
        assert_eq!(cols[0], "time_ms");
        assert!(!cols.contains(&"v_fing"));
    }

    #[test]
    fn header_positions_follow_required_column_order() {
        // Reversed header: every position must map back to its own name.
        let mut headers: Vec<&str> = required_columns().collect();
        headers.reverse();
        let index = ColumnIndex::resolve(|name| headers.iter().position(|h| *h == name)).unwrap();
        assert_eq!(headers[index.time], TIME_COLUMN);
        for (&i, facet) in index.facets.iter().zip(Facet::ALL) {
            assert_eq!(headers[i], facet.column_name());
        }
        for (&i, channel) in index.channels.iter().zip(Channel::RAW) {
            assert_eq!(headers[i], channel.column_name());
        }
    }

    #[test]
    fn empty_parquet_without_required_columns_is_rejected() {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(
            TIME_COLUMN,
            DataType::Float64,
            false,
        )]));
        let file = std::fs::File::create(&path).unwrap();
        let writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.close().unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingColumn("speaker"))
        ));
    }
}
