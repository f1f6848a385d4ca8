//! Viewer engine: network IO for frame fetches, the mirror table and remote reconciliation.
mod api;
mod decode;
mod fetch;
mod mirror;
mod persist;
mod sync;
mod types;

pub use api::{build_router, UpdateTimesRequest, MAX_UPDATE_BODY_BYTES, UPDATE_TIMES_PATH};
pub use decode::{decode_body, DecodeError, DecodedBody};
pub use fetch::{ContentFetcher, FetchSettings, ReqwestFetcher};
pub use mirror::{MirrorStore, MirrorWriter, RestMirrorStore, StoreSettings, DEFAULT_CONTENT_COLUMN};
pub use persist::{AtomicFileWriter, PersistError};
pub use sync::{Ack, RemoteSyncService, SyncError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchedBody, MirrorRecord, StoreError};
