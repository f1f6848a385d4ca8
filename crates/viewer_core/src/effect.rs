use crate::ScriptNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowBanner(String),
    ClearBanner,
    ClearSurface,
    ShowFrame { url: String },
    FetchBody { url: String },
    InjectMarkup { markup: String },
    /// Replace each injected script with a fresh, executing equivalent.
    RearmScripts { scripts: Vec<ScriptNode> },
    AppendMirror { content: String },
    /// Replace the status line; empty text clears it.
    ShowStatus(String),
    FetchForRecord { record_id: i64, url: String },
    /// Write `content` into the record's fetched-content column.
    StoreContent { record_id: i64, content: String },
}
