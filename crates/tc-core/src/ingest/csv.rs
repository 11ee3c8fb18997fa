//! Minimal RFC 4180 reader.
//!
//! Quoted fields may contain the delimiter, doubled quotes and line breaks.
//! Blank lines are skipped. A quote that does not open a field is kept as a
//! literal character.

use std::io::BufRead;

use super::IngestError;
use tc_common::RawRecord;

/// One parsed row and the source line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

pub struct CsvReader<R> {
    reader: R,
    delimiter: char,
    line: usize,
    buf: String,
}

impl<R: BufRead> CsvReader<R> {
    pub fn new(reader: R, delimiter: char) -> Self {
        CsvReader {
            reader,
            delimiter,
            line: 0,
            buf: String::new(),
        }
    }

    /// Next non-blank row, or `None` at end of input.
    pub fn next_row(&mut self) -> Result<Option<CsvRow>, IngestError> {
        let delimiter = self.delimiter;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut field_quoted = false;
        let mut start_line = None;

        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return match start_line {
                    None => Ok(None),
                    Some(line) if in_quotes => Err(IngestError::UnterminatedQuote { line }),
                    Some(line) => {
                        fields.push(field);
                        Ok(Some(CsvRow { line, fields }))
                    }
                };
            }
            self.line += 1;

            if start_line.is_none() && self.buf.trim_end_matches(['\r', '\n']).is_empty() {
                continue;
            }
            start_line.get_or_insert(self.line);

            let mut chars = self.buf.chars().peekable();
            while let Some(c) = chars.next() {
                if in_quotes {
                    if c == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        field.push(c);
                    }
                    continue;
                }
                match c {
                    '"' if field.is_empty() && !field_quoted => {
                        in_quotes = true;
                        field_quoted = true;
                    }
                    c if c == delimiter => {
                        fields.push(std::mem::take(&mut field));
                        field_quoted = false;
                    }
                    '\r' if matches!(chars.peek(), Some('\n') | None) => {}
                    '\n' => {}
                    c => field.push(c),
                }
            }

            if !in_quotes {
                fields.push(field);
                return Ok(Some(CsvRow {
                    line: start_line.unwrap_or(self.line),
                    fields,
                }));
            }
        }
    }
}

impl<R: BufRead> Iterator for CsvReader<R> {
    type Item = Result<CsvRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Read a headed CSV into records numbered from 1 (the first data row).
pub(super) fn read_csv<R: BufRead>(
    reader: R,
    delimiter: char,
) -> Result<Vec<RawRecord>, IngestError> {
    let mut rows = CsvReader::new(reader, delimiter);
    let header: Vec<String> = rows
        .next_row()?
        .ok_or(IngestError::MissingHeader)?
        .fields
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = if i == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name
            };
            name.trim().to_string()
        })
        .collect();

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let row = row?;
        if row.fields.len() > header.len() {
            return Err(IngestError::RaggedRow {
                line: row.line,
                expected: header.len(),
                found: row.fields.len(),
            });
        }
        let record = header
            .iter()
            .zip(&row.fields)
            .fold(RawRecord::new(index + 1), |rec, (column, value)| {
                rec.with(column, value)
            });
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &str) -> Vec<Vec<String>> {
        CsvReader::new(input.as_bytes(), ',')
            .map(|r| r.unwrap().fields)
            .collect()
    }

    #[test]
    fn test_plain_rows() {
        assert_eq!(rows("a,b\n1,2\n"), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_quoted_delimiter_and_escaped_quote() {
        assert_eq!(
            rows("\"x, y\",\"say \"\"hi\"\"\"\n"),
            vec![vec!["x, y", "say \"hi\""]]
        );
    }

    #[test]
    fn test_multiline_quoted_field_keeps_start_line() {
        let mut reader = CsvReader::new("h\n\"one\ntwo\",z\nlast\n".as_bytes(), ',');
        reader.next_row().unwrap();
        let row = reader.next_row().unwrap().unwrap();
        assert_eq!(row.line, 2);
        assert_eq!(row.fields, vec!["one\ntwo", "z"]);
        assert_eq!(reader.next_row().unwrap().unwrap().line, 4);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        assert_eq!(rows("a,b\r\n\r\n1,\r\n"), vec![vec!["a", "b"], vec!["1", ""]]);
    }

    #[test]
    fn test_no_trailing_newline() {
        assert_eq!(rows("a;b"), vec![vec!["a;b"]]);
        let semi: Vec<_> = CsvReader::new("a;b".as_bytes(), ';')
            .map(|r| r.unwrap().fields)
            .collect();
        assert_eq!(semi, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = CsvReader::new("ok\n\"open,\n".as_bytes(), ',')
            .nth(1)
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, IngestError::UnterminatedQuote { line: 2 }));
    }

    #[test]
    fn test_read_csv_maps_header_and_rows() {
        let input = "\u{feff}USER, START DATE ,SERVER\nalice,2024-03-01 09:00,srv1\nbob,2024-03-01 10:00\n";
        let records = read_csv(input.as_bytes(), ',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 1);
        assert_eq!(records[0].get("USER"), Some("alice"));
        assert_eq!(records[0].get("START DATE"), Some("2024-03-01 09:00"));
        assert_eq!(records[1].get("SERVER"), None);
    }

    #[test]
    fn test_read_csv_rejects_extra_fields() {
        let err = read_csv("a,b\n1,2,3\n".as_bytes(), ',').unwrap_err();
        assert!(matches!(
            err,
            IngestError::RaggedRow {
                line: 2,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_read_csv_empty_input() {
        assert!(matches!(
            read_csv("".as_bytes(), ',').unwrap_err(),
            IngestError::MissingHeader
        ));
    }
}
