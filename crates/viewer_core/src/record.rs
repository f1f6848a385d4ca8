use serde::Deserialize;
use serde_json::{Map, Value};

/// Logical name of the one column the viewer asks the host for.
pub const CONTENT_COLUMN: &str = "Html";

const ID_FIELD: &str = "id";

/// A row delivered by the host platform. Read-only to the viewer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(id: i64, fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            id,
            fields: fields.into_iter().collect(),
        }
    }
}

/// Host-supplied mapping from the logical content column to the real column name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "Html")]
    pub content: String,
}

/// Resolve the content field of `record`.
///
/// With a mapping the mapped column is used. Without one the record must carry
/// exactly one field besides its identifier. `None` means the content is
/// unresolved and the caller should ask for a column to be chosen.
pub fn resolve_content(record: &SourceRecord, mapping: Option<&ColumnMapping>) -> Option<String> {
    let value = match mapping {
        Some(mapping) => record.fields.get(&mapping.content)?,
        None => {
            let mut columns = record.fields.iter().filter(|(name, _)| *name != ID_FIELD);
            let (_, value) = columns.next()?;
            if columns.next().is_some() {
                return None;
            }
            value
        }
    };
    Some(value_to_content(value))
}

pub(crate) fn value_to_content(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> SourceRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_column_is_used_without_mapping() {
        let rec = record(json!({"id": 4, "Body": "<p>x</p>"}));
        assert_eq!(resolve_content(&rec, None).as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn zero_or_many_columns_are_unresolved() {
        assert_eq!(resolve_content(&record(json!({"id": 1})), None), None);
        let rec = record(json!({"id": 1, "A": "a", "B": "b"}));
        assert_eq!(resolve_content(&rec, None), None);
    }

    #[test]
    fn mapping_picks_named_column() {
        let rec = record(json!({"id": 1, "A": "a", "B": "b"}));
        let mapping = ColumnMapping {
            content: "B".to_string(),
        };
        assert_eq!(resolve_content(&rec, Some(&mapping)).as_deref(), Some("b"));
    }

    #[test]
    fn mapping_to_missing_column_is_unresolved() {
        let rec = record(json!({"id": 1, "A": "a"}));
        let mapping = ColumnMapping {
            content: "Gone".to_string(),
        };
        assert_eq!(resolve_content(&rec, Some(&mapping)), None);
    }

    #[test]
    fn non_string_values_are_stringified() {
        assert_eq!(
            resolve_content(&record(json!({"id": 1, "A": null})), None).as_deref(),
            Some("")
        );
        assert_eq!(
            resolve_content(&record(json!({"id": 1, "A": 42})), None).as_deref(),
            Some("42")
        );
        assert_eq!(
            resolve_content(&record(json!({"id": 1, "A": true})), None).as_deref(),
            Some("true")
        );
    }
}
