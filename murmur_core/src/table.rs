//! Tab-separated metadata tables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{DatasetError, Result};

/// Columns every corpus table must provide.
pub const REQUIRED_COLUMNS: [&str; 2] = ["path", "sentence"];

/// Loads a metadata table from disk.
pub trait TableLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<MetadataTable>;
}

/// Ordered rows keyed by the table's header fields.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    columns: Arc<HashMap<String, usize>>,
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl MetadataTable {
    /// Build a table from a header row and ordered records.
    ///
    /// Every record must have exactly one field per header.
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        let columns: Arc<HashMap<String, usize>> = Arc::new(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), i))
                .collect(),
        );

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(line, values)| {
                if values.len() != headers.len() {
                    return Err(DatasetError::Configuration(format!(
                        "row {line} has {} fields, header has {}",
                        values.len(),
                        headers.len()
                    )));
                }
                Ok(TableRow {
                    columns: Arc::clone(&columns),
                    values,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            headers,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }
}

/// One example's metadata.
#[derive(Debug, Clone)]
pub struct TableRow {
    columns: Arc<HashMap<String, usize>>,
    values: Vec<String>,
}

impl TableRow {
    /// Value of `field`, if the table has that column.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.columns
            .get(field)
            .and_then(|&i| self.values.get(i))
            .map(String::as_str)
    }

    /// Relative audio filename.
    pub fn path(&self) -> &str {
        self.get("path").unwrap_or_default()
    }

    /// Transcript text.
    pub fn sentence(&self) -> &str {
        self.get("sentence").unwrap_or_default()
    }

    /// Speaker demographics; blank or absent cells are `None`.
    pub fn speaker(&self) -> SpeakerInfo {
        let field = |name: &str| {
            self.get(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        SpeakerInfo {
            age: field("age"),
            gender: field("gender"),
            accent: field("accents").or_else(|| field("accent")),
        }
    }
}

/// Self-reported speaker metadata carried by Common Voice tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerInfo {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub accent: Option<String>,
}

/// Reads tab-separated tables with a header row.
///
/// Quoting is disabled: transcripts contain bare `"` characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsvTableLoader;

impl TableLoader for TsvTableLoader {
    fn load(&self, path: &Path) -> Result<MetadataTable> {
        let table_err = |reason: String| DatasetError::Table {
            path: path.to_path_buf(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .quoting(false)
            .from_path(path)
            .map_err(|e| table_err(e.to_string()))?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| table_err(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| table_err(format!("failed to parse a row: {e}")))?;
            records.push(record.iter().map(str::to_string).collect());
        }

        let table = MetadataTable::new(headers, records).map_err(|e| table_err(e.to_string()))?;
        tracing::debug!(path = %path.display(), rows = table.len(), "loaded metadata table");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tsv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_rows_in_order() {
        let file = write_tsv(
            "client_id\tpath\tsentence\tage\tgender\taccents\n\
             c1\ta.mp3\tHello there\ttwenties\tfemale\t\n\
             c2\tb.mp3\tShe said \"hi\"\t\t\tscottish\n",
        );
        let table = TsvTableLoader.load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("sentence"));

        let first = table.row(0).unwrap();
        assert_eq!(first.path(), "a.mp3");
        assert_eq!(first.sentence(), "Hello there");
        assert_eq!(
            first.speaker(),
            SpeakerInfo {
                age: Some("twenties".into()),
                gender: Some("female".into()),
                accent: None,
            }
        );

        let second = table.row(1).unwrap();
        assert_eq!(second.sentence(), "She said \"hi\"");
        assert_eq!(second.speaker().accent.as_deref(), Some("scottish"));
        assert_eq!(second.get("client_id"), Some("c2"));
        assert_eq!(second.get("nope"), None);
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = write_tsv("path\tsentence\n");
        let table = TsvTableLoader.load(file.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_ragged_row_is_table_error() {
        let file = write_tsv("path\tsentence\na.mp3\n");
        assert!(matches!(
            TsvTableLoader.load(file.path()),
            Err(DatasetError::Table { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_table_error() {
        assert!(matches!(
            TsvTableLoader.load(Path::new("/no/such/train.tsv")),
            Err(DatasetError::Table { .. })
        ));
    }
}
