//! Viewer core: content classification, sanitization and the pure render state machine.
mod classify;
mod effect;
mod fetch_mode;
mod markup;
mod msg;
mod policy;
pub mod rearm;
mod record;
mod sanitize;
mod state;
mod update;
mod view_model;

pub use classify::{classify, ContentKind};
pub use effect::Effect;
pub use fetch_mode::{
    resolve_url, FetchColumns, FetchTarget, FETCHED_COLUMN, FETCHING_MESSAGE,
    NOTHING_TO_FETCH_MESSAGE, NO_URL_MESSAGE, STORED_MESSAGE, STORING_MESSAGE, URL_COLUMN,
};
pub use msg::{FetchOutcome, Msg};
pub use policy::SanitizationPolicy;
pub use rearm::ScriptNode;
pub use record::{resolve_content, ColumnMapping, SourceRecord, CONTENT_COLUMN};
pub use sanitize::{sanitize, SanitizeError, MAX_MARKUP_BYTES};
pub use state::{
    strip_error_prefix, AppState, DisplayState, Phase, Surface, ViewerMode, NO_COLUMN_MESSAGE,
};
pub use update::update;
pub use view_model::AppViewModel;
