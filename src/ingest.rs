use std::io::Read;
use std::path::Path;

use serde_json::{Number, Value};
use thiserror::Error;

use crate::models::RawRecord;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("json upload must be an array of objects")]
    NotTabular,
    #[error("unsupported upload format: {0}")]
    UnsupportedFormat(String),
}

/// Reads a `.csv` or `.json` upload into raw records.
pub fn load_file(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv(std::fs::File::open(path)?),
        "json" => read_json(&std::fs::read_to_string(path)?),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// Header row gives the column names. Empty cells are left out of the
/// record; numeric cells become numbers.
pub fn read_csv<R: Read>(input: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            record.insert(header.to_string(), cell_value(cell));
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok(records)
}

pub fn read_json(input: &str) -> Result<Vec<RawRecord>, IngestError> {
    match serde_json::from_str::<Value>(input)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(IngestError::NotTabular),
            })
            .collect(),
        _ => Err(IngestError::NotTabular),
    }
}

fn cell_value(cell: &str) -> Value {
    if let Ok(whole) = cell.parse::<i64>() {
        return Value::Number(whole.into());
    }
    cell.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        dir.push(format!("workforce_pulse_ingest_{}_{}", std::process::id(), id));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_cells_are_typed_and_blanks_skipped() {
        let data = "Employee ID,Name,Department,Performance Score,Satisfaction\n\
                    E-1,Avery Lee,Sales,85,4.5\n\
                    E-2,Jules Moreno,,n/a,\n";
        let records = read_csv(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Performance Score"], Value::from(85));
        assert_eq!(records[0]["Satisfaction"], Value::from(4.5));
        assert_eq!(records[0]["Name"], Value::from("Avery Lee"));
        assert!(!records[1].contains_key("Department"));
        assert!(!records[1].contains_key("Satisfaction"));
        assert_eq!(records[1]["Performance Score"], Value::from("n/a"));
    }

    #[test]
    fn json_must_be_array_of_objects() {
        let records = read_json(r#"[{"name": "Kiara Patel", "score": 91}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["score"], Value::from(91));

        assert!(matches!(read_json(r#"{"name": "x"}"#), Err(IngestError::NotTabular)));
        assert!(matches!(read_json("[1, 2]"), Err(IngestError::NotTabular)));
        assert!(matches!(read_json("not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let csv_path = temp_file("team.csv", "dept,score\nHR,70\n");
        assert_eq!(load_file(&csv_path).unwrap().len(), 1);

        let json_path = temp_file("team.JSON", r#"[{"dept": "HR"}, {"dept": "Ops"}]"#);
        assert_eq!(load_file(&json_path).unwrap().len(), 2);

        let other = temp_file("team.xlsx", "");
        assert!(matches!(
            load_file(&other),
            Err(IngestError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }
}
