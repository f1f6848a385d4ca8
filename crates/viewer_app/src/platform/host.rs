//! Host event decoding: one JSON object per line on the session input.
use serde::Deserialize;
use viewer_core::{ColumnMapping, Msg, SourceRecord};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum HostEvent {
    NewRecord,
    /// The user pressed the fetch action.
    Fetch,
    Record {
        record: SourceRecord,
        #[serde(default)]
        mapping: Option<ColumnMapping>,
    },
}

/// Decode one input line. Blank lines carry no event; malformed ones become faults.
pub fn parse_line(line: &str) -> Option<Msg> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let msg = match serde_json::from_str::<HostEvent>(line) {
        Ok(HostEvent::NewRecord) => Msg::NewRecord,
        Ok(HostEvent::Fetch) => Msg::FetchRequested,
        Ok(HostEvent::Record { record, mapping }) => Msg::Record { record, mapping },
        Err(err) => Msg::Fault(format!("invalid host event: {err}")),
    };
    Some(msg)
}
