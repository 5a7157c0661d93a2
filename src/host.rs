//! Host query engine interfaces
//!
//! The host hands us per-query qualifiers (column filters) and takes rows
//! back one at a time through a sink. Both cross worker threads, so
//! qualifiers are `Sync` and sinks are `Send`.

use crate::error::{Error, Result};
use crate::resource::registry::{QualKind, TableDef};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;

/// A mapped table row, keyed by column name
pub type Row = Map<String, Value>;

/// A qualifier value supplied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualValue {
    String(String),
    Bool(bool),
}

/// Source of optional per-column filter values
pub trait Qualifiers: Sync {
    /// String value for a column, `None` when absent or empty
    fn string(&self, column: &str) -> Option<String>;

    /// Boolean value for a column
    fn bool(&self, column: &str) -> Option<bool>;
}

/// Plain qualifier map, used by the CLI and in tests
#[derive(Debug, Clone, Default)]
pub struct QualMap(HashMap<String, QualValue>);

impl QualMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, column: &str, value: &str) -> Self {
        self.0
            .insert(column.to_string(), QualValue::String(value.to_string()));
        self
    }

    pub fn with_bool(mut self, column: &str, value: bool) -> Self {
        self.0.insert(column.to_string(), QualValue::Bool(value));
        self
    }

    /// Parse a `column=value` pair against a table's qualifiers
    ///
    /// The qualifier kind decides the value type, so a string column may
    /// hold the literal `true`.
    pub fn insert_pair(&mut self, table: &TableDef, pair: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidQualifier {
            pair: pair.to_string(),
            reason,
        };

        let (column, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid("expected column=value".to_string()))?;
        let column = column.trim();
        let def = table
            .qualifiers
            .iter()
            .find(|q| q.column == column)
            .ok_or_else(|| invalid(format!("{} is not a qualifier column", column)))?;

        let value = match def.kind {
            QualKind::String => QualValue::String(value.to_string()),
            QualKind::Bool => match value {
                "true" => QualValue::Bool(true),
                "false" => QualValue::Bool(false),
                other => return Err(invalid(format!("expected true or false, got {:?}", other))),
            },
        };
        self.0.insert(column.to_string(), value);
        Ok(())
    }
}

impl Qualifiers for QualMap {
    fn string(&self, column: &str) -> Option<String> {
        match self.0.get(column)? {
            QualValue::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn bool(&self, column: &str) -> Option<bool> {
        match self.0.get(column)? {
            QualValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Receives rows as they are fetched
pub trait RowSink: Send {
    fn emit(&mut self, row: Row) -> Result<()>;
}

impl RowSink for Vec<Row> {
    fn emit(&mut self, row: Row) -> Result<()> {
        self.push(row);
        Ok(())
    }
}

/// Writes each row as one line of JSON
pub struct JsonLinesSink<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn emit(&mut self, row: Row) -> Result<()> {
        let line = Value::Object(row).to_string();
        writeln!(self.writer, "{}", line).map_err(|e| Error::Sink(e.to_string()))?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::registry::get_table_def;

    #[test]
    fn test_qual_map_pairs_follow_qualifier_kind() {
        let table = get_table_def("yandexcloud_vpc_address").unwrap();
        let mut quals = QualMap::new();
        quals.insert_pair(table, "name=true").unwrap();
        quals.insert_pair(table, "reserved=true").unwrap();
        quals.insert_pair(table, "description=").unwrap();

        assert_eq!(quals.string("name").as_deref(), Some("true"));
        assert_eq!(quals.bool("name"), None);
        assert_eq!(quals.bool("reserved"), Some(true));
        assert_eq!(quals.string("reserved"), None);
        assert_eq!(quals.string("description"), None);
    }

    #[test]
    fn test_qual_map_rejects_bad_pairs() {
        let table = get_table_def("yandexcloud_vpc_address").unwrap();
        let mut quals = QualMap::new();
        for pair in ["garbage", "zone=ru-central1-a", "reserved=yes"] {
            let err = quals.insert_pair(table, pair).unwrap_err();
            assert!(matches!(err, Error::InvalidQualifier { .. }), "{}", pair);
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_table_futures_are_send() {
        let client = crate::YcClient::new(
            crate::ConnectionConfig {
                token: Some(crate::config::Token::from("t1.static")),
                ..Default::default()
            },
            &crate::Caches::new(),
        )
        .unwrap();
        let quals = QualMap::new();
        let mut rows: Vec<Row> = Vec::new();

        assert_send(&crate::resource::list_table(&client, "yandexcloud_compute_disk", &quals, &mut rows));
        assert_send(&crate::resource::get_table(&client, "yandexcloud_compute_disk", &quals));
    }

    #[test]
    fn test_json_lines_sink() {
        let mut out = Vec::new();
        {
            let mut sink = JsonLinesSink::new(&mut out);
            let mut row = Row::new();
            row.insert("id".into(), Value::String("fhm1".into()));
            sink.emit(row).unwrap();
            assert_eq!(sink.rows(), 1);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "{\"id\":\"fhm1\"}\n");
    }
}
