//! Fetch-into-record mode: download a record's URL on request and store the
//! sanitized body back into the same record.
use serde::Deserialize;

use crate::record::value_to_content;
use crate::SourceRecord;

/// Default column holding the location to fetch.
pub const URL_COLUMN: &str = "URL";
/// Default column the sanitized body is written to.
pub const FETCHED_COLUMN: &str = "Content";

pub const NO_URL_MESSAGE: &str = "No URL provided.";
pub const NOTHING_TO_FETCH_MESSAGE: &str = "No URL to fetch.";
pub const FETCHING_MESSAGE: &str = "Fetching content...";
pub const STORING_MESSAGE: &str = "Content fetched. Updating record...";
pub const STORED_MESSAGE: &str = "Content updated successfully.";

/// Source-table columns used by fetch-into-record mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchColumns {
    pub url: String,
    pub content: String,
}

impl Default for FetchColumns {
    fn default() -> Self {
        Self {
            url: URL_COLUMN.to_string(),
            content: FETCHED_COLUMN.to_string(),
        }
    }
}

/// The record whose URL a fetch request would download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub record_id: i64,
    pub url: String,
}

/// Location in `record`'s URL column. Missing, null and empty cells have none.
pub fn resolve_url(record: &SourceRecord, columns: &FetchColumns) -> Option<String> {
    let url = value_to_content(record.fields.get(&columns.url)?);
    (!url.is_empty()).then_some(url)
}

pub(crate) fn status_error(status_text: &str) -> String {
    format!("Error fetching content: {status_text}")
}

pub(crate) fn fetch_error(message: &str) -> String {
    format!("Fetch error: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> SourceRecord {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn url_comes_from_configured_column() {
        let rec = record(json!({"id": 2, "URL": "https://example.com", "Content": ""}));
        assert_eq!(
            resolve_url(&rec, &FetchColumns::default()).as_deref(),
            Some("https://example.com")
        );

        let columns = FetchColumns {
            url: "Link".to_string(),
            ..FetchColumns::default()
        };
        assert_eq!(resolve_url(&rec, &columns), None);
    }

    #[test]
    fn empty_or_null_url_is_absent() {
        let columns = FetchColumns::default();
        assert_eq!(resolve_url(&record(json!({"id": 1, "URL": ""})), &columns), None);
        assert_eq!(resolve_url(&record(json!({"id": 1, "URL": null})), &columns), None);
        assert_eq!(resolve_url(&record(json!({"id": 1})), &columns), None);
    }

    #[test]
    fn status_texts() {
        assert_eq!(status_error("Not Found"), "Error fetching content: Not Found");
        assert_eq!(fetch_error("timeout"), "Fetch error: timeout");
    }
}
