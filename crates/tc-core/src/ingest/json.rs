//! JSON array and JSON Lines readers.

use std::io::BufRead;

use serde_json::{Map, Value};

use super::IngestError;
use tc_common::RawRecord;

fn to_record(row: usize, object: Map<String, Value>) -> RawRecord {
    object
        .into_iter()
        .fold(RawRecord::new(row), |rec, (column, value)| match value {
            Value::Null => rec,
            Value::String(s) => rec.with(&column, &s),
            other => rec.with(&column, &other.to_string()),
        })
}

pub(super) fn read_json_array<R: BufRead>(reader: R) -> Result<Vec<RawRecord>, IngestError> {
    let values: Vec<Value> =
        serde_json::from_reader(reader).map_err(|source| IngestError::Json {
            line: 0,
            source,
        })?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(object) => Ok(to_record(index + 1, object)),
            _ => Err(IngestError::NotAnObject { row: index + 1 }),
        })
        .collect()
}

pub(super) fn read_json_lines<R: BufRead>(reader: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|source| IngestError::Json {
            line: index + 1,
            source,
        })?;
        match value {
            Value::Object(object) => records.push(to_record(index + 1, object)),
            _ => return Err(IngestError::NotAnObject { row: index + 1 }),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_cells_stringified() {
        let input = r#"[{"USER": "alice", "START TIMESTAMP": 1709283600, "SERVER": null}]"#;
        let records = read_json_array(input.as_bytes()).unwrap();
        assert_eq!(records[0].get("START TIMESTAMP"), Some("1709283600"));
        assert_eq!(records[0].get("SERVER"), None);
    }

    #[test]
    fn test_array_rejects_scalars() {
        let err = read_json_array("[1]".as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::NotAnObject { row: 1 }));
    }

    #[test]
    fn test_lines_skip_blanks_and_keep_line_numbers() {
        let input = "{\"USER\": \"a\"}\n\n{\"USER\": \"b\"}\n";
        let records = read_json_lines(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].row, 3);
    }

    #[test]
    fn test_lines_report_bad_line() {
        let err = read_json_lines("{}\n{bad\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Json { line: 2, .. }));
    }
}
