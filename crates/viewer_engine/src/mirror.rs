use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use viewer_logging::{viewer_error, viewer_info};

use crate::{MirrorRecord, StoreError};

/// Column of the mirror table that holds displayed content.
pub const DEFAULT_CONTENT_COLUMN: &str = "HtmlContent";

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Host platform server root, e.g. `https://docs.example.com`.
    pub base_url: String,
    pub doc_id: String,
    pub table_id: String,
    pub content_column: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl StoreSettings {
    pub fn new(base_url: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            doc_id: doc_id.into(),
            table_id: "Times".to_string(),
            content_column: DEFAULT_CONTENT_COLUMN.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// `{base}/api/docs/{doc}/tables/{table}/records`
    pub fn records_url(&self) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| StoreError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "api",
                "docs",
                self.doc_id.as_str(),
                "tables",
                self.table_id.as_str(),
                "records",
            ]);
        Ok(url)
    }
}

/// Remote storage behind the mirror table.
#[async_trait::async_trait]
pub trait MirrorStore: Send + Sync {
    async fn append(&self, content: &str) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<MirrorRecord>, StoreError>;
    async fn patch(&self, id: i64, content: &str) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct NewRecords<'a> {
    records: Vec<NewRecord<'a>>,
}

#[derive(Serialize)]
struct NewRecord<'a> {
    fields: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct RecordPatches<'a> {
    records: Vec<RecordPatch<'a>>,
}

#[derive(Serialize)]
struct RecordPatch<'a> {
    id: i64,
    fields: BTreeMap<&'a str, &'a str>,
}

#[derive(Deserialize)]
struct RecordList {
    records: Vec<RemoteRecord>,
}

#[derive(Deserialize)]
struct RemoteRecord {
    id: i64,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Mirror store backed by the host platform's records REST endpoint.
#[derive(Debug, Clone)]
pub struct RestMirrorStore {
    settings: StoreSettings,
    records_url: Url,
    client: reqwest::Client,
}

impl RestMirrorStore {
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let records_url = settings.records_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(StoreError::from_reqwest)?;
        Ok(Self {
            settings,
            records_url,
            client,
        })
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let request = self.client.request(method, self.records_url.clone());
        match self.settings.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn content_fields<'a>(&'a self, content: &'a str) -> BTreeMap<&'a str, &'a str> {
        BTreeMap::from([(self.settings.content_column.as_str(), content)])
    }

    fn to_mirror_record(&self, record: RemoteRecord) -> MirrorRecord {
        let html_content = match record.fields.get(&self.settings.content_column) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        MirrorRecord {
            id: record.id,
            html_content,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl MirrorStore for RestMirrorStore {
    async fn append(&self, content: &str) -> Result<(), StoreError> {
        let body = NewRecords {
            records: vec![NewRecord {
                fields: self.content_fields(content),
            }],
        };
        let response = self
            .request(reqwest::Method::POST)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from_reqwest)?;
        check_status(response).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<MirrorRecord>, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(StoreError::from_reqwest)?;
        let list: RecordList = check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        Ok(list
            .records
            .into_iter()
            .map(|record| self.to_mirror_record(record))
            .collect())
    }

    async fn patch(&self, id: i64, content: &str) -> Result<(), StoreError> {
        let body = RecordPatches {
            records: vec![RecordPatch {
                id,
                fields: self.content_fields(content),
            }],
        };
        let response = self
            .request(reqwest::Method::PATCH)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from_reqwest)?;
        check_status(response).await?;
        Ok(())
    }
}

/// Appends one mirror record per accepted render.
#[derive(Clone)]
pub struct MirrorWriter {
    store: Arc<dyn MirrorStore>,
}

impl MirrorWriter {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    /// Append `content`. Failures are logged and returned; they never undo the render.
    pub async fn append(&self, content: &str) -> Result<(), StoreError> {
        match self.store.append(content).await {
            Ok(()) => {
                viewer_info!("Appended mirror record content_len={}", content.len());
                Ok(())
            }
            Err(err) => {
                viewer_error!("Mirror append failed: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_url_is_built_under_base_path() {
        let settings = StoreSettings::new("https://docs.example.com/o/team/", "doc1");
        assert_eq!(
            settings.records_url().unwrap().as_str(),
            "https://docs.example.com/o/team/api/docs/doc1/tables/Times/records"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let settings = StoreSettings::new("not a url", "doc1");
        assert!(matches!(
            settings.records_url(),
            Err(StoreError::InvalidUrl(_))
        ));
    }
}
