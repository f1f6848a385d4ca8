use crate::{ColumnMapping, SourceRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Host signalled a new, unpopulated record context.
    NewRecord,
    /// Host delivered the bound record, optionally with a column mapping.
    Record {
        record: SourceRecord,
        mapping: Option<ColumnMapping>,
    },
    /// The body fetch for a framed location finished.
    FrameFetched { url: String, outcome: FetchOutcome },
    /// The host rejected a mirror append.
    MirrorAppendFailed(String),
    /// Any other fault raised while handling host events.
    Fault(String),
    /// The user asked to fetch the current record's URL into its content column.
    FetchRequested,
    /// The download started by a fetch request finished.
    ContentFetched { record_id: i64, outcome: FetchOutcome },
    /// The sanitized body was written to the record.
    ContentStored { record_id: i64, content: String },
    /// Writing the sanitized body to the record failed.
    ContentStoreFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Success status.
    Body(String),
    /// The location answered with an error status; its body is kept.
    Rejected {
        status: u16,
        status_text: String,
        body: String,
    },
    /// No response at all.
    Failed(String),
}
