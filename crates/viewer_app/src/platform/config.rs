//! Command line and RON file configuration.
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use viewer_core::{FetchColumns, SanitizationPolicy, FETCHED_COLUMN, URL_COLUMN};
use viewer_engine::StoreSettings;

use super::logging::LogDestination;

const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Parser, Debug)]
#[command(
    name = "viewer",
    version,
    about = "Render record content in a sandboxed panel and mirror what was shown."
)]
pub struct Cli {
    /// Optional RON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub mirror: MirrorArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a rendering session fed by host events on stdin (JSON lines).
    Render(RenderArgs),
    /// Run a session that fetches each record's URL into its content column on request.
    Fetch(FetchArgs),
    /// Serve `POST /update-times` for remote reconciliation.
    Serve(ServeArgs),
}

/// Mirror table location. Command line and environment override the config file.
#[derive(Args, Debug, Default)]
pub struct MirrorArgs {
    /// Host platform server root.
    #[arg(long, env = "VIEWER_MIRROR_URL")]
    pub mirror_url: Option<String>,
    #[arg(long, env = "VIEWER_DOC_ID")]
    pub doc_id: Option<String>,
    /// Mirror table id.
    #[arg(long, env = "VIEWER_TABLE")]
    pub table: Option<String>,
    #[arg(long, env = "VIEWER_CONTENT_COLUMN")]
    pub content_column: Option<String>,
    #[arg(long, env = "VIEWER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Request timeout for mirror store calls, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Sanitization allow-list extensions.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Extra tags to allow through sanitization, comma-separated.
    #[arg(long)]
    pub tags: Option<String>,
    /// Extra attributes to allow through sanitization, comma-separated.
    #[arg(long)]
    pub attr: Option<String>,
    /// Launch query string carrying `tags` / `attr`, e.g. `?tags=script`.
    #[arg(long, conflicts_with_all = ["tags", "attr"])]
    pub query: Option<String>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,
    /// Panel document written after every change.
    #[arg(long, default_value = "panel.html")]
    pub output: PathBuf,
    /// Render without mirroring shown content.
    #[arg(long)]
    pub no_mirror: bool,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,
    /// Panel document written after every change.
    #[arg(long, default_value = "panel.html")]
    pub output: PathBuf,
    /// Table holding the records being fetched into.
    #[arg(long, env = "VIEWER_SOURCE_TABLE")]
    pub source_table: Option<String>,
    /// Column holding the location to fetch.
    #[arg(long, default_value = URL_COLUMN)]
    pub url_column: String,
    /// Column the sanitized body is written to.
    #[arg(long, default_value = FETCHED_COLUMN)]
    pub target_column: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "VIEWER_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub mirror: MirrorFileConfig,
    pub tags: Option<String>,
    pub attr: Option<String>,
    pub listen: Option<String>,
    pub source_table: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MirrorFileConfig {
    pub base_url: Option<String>,
    pub doc_id: Option<String>,
    pub table: Option<String>,
    pub content_column: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn load_file_config(path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

impl MirrorArgs {
    /// Merge with the file config into store settings.
    pub fn store_settings(&self, file: &MirrorFileConfig) -> anyhow::Result<StoreSettings> {
        let base_url = pick(&self.mirror_url, &file.base_url).ok_or_else(|| {
            anyhow!("mirror url not configured (--mirror-url or VIEWER_MIRROR_URL)")
        })?;
        let doc_id = pick(&self.doc_id, &file.doc_id)
            .ok_or_else(|| anyhow!("mirror document not configured (--doc-id or VIEWER_DOC_ID)"))?;

        let mut settings = StoreSettings::new(base_url, doc_id);
        if let Some(table) = pick(&self.table, &file.table) {
            settings.table_id = table;
        }
        if let Some(column) = pick(&self.content_column, &file.content_column) {
            settings.content_column = column;
        }
        settings.api_key = pick(&self.api_key, &file.api_key);
        if let Some(secs) = self.timeout_secs.or(file.timeout_secs) {
            settings.request_timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }
}

impl RenderArgs {
    /// Sanitization policy for the session, built once at launch.
    pub fn policy(&self, file: &FileConfig) -> SanitizationPolicy {
        self.policy.build(file)
    }
}

impl FetchArgs {
    pub fn policy(&self, file: &FileConfig) -> SanitizationPolicy {
        self.policy.build(file)
    }

    pub fn columns(&self) -> FetchColumns {
        FetchColumns {
            url: self.url_column.clone(),
            content: self.target_column.clone(),
        }
    }

    /// Store settings addressing the target column of the source table.
    pub fn source_settings(
        &self,
        mirror: &MirrorArgs,
        file: &FileConfig,
    ) -> anyhow::Result<StoreSettings> {
        let table = pick(&self.source_table, &file.source_table).ok_or_else(|| {
            anyhow!("source table not configured (--source-table or VIEWER_SOURCE_TABLE)")
        })?;
        let mut settings = mirror.store_settings(&file.mirror)?;
        settings.table_id = table;
        settings.content_column = self.target_column.clone();
        Ok(settings)
    }
}

impl PolicyArgs {
    fn build(&self, file: &FileConfig) -> SanitizationPolicy {
        if let Some(query) = self.query.as_deref() {
            return SanitizationPolicy::from_query(query);
        }
        let tags = self.tags.as_deref().or(file.tags.as_deref());
        let attr = self.attr.as_deref().or(file.attr.as_deref());
        SanitizationPolicy::from_lists(tags, attr)
    }
}

impl ServeArgs {
    pub fn listen_addr(&self, file: &FileConfig) -> anyhow::Result<SocketAddr> {
        if let Some(addr) = self.listen {
            return Ok(addr);
        }
        let raw = file.listen.as_deref().unwrap_or(DEFAULT_LISTEN);
        raw.parse()
            .with_context(|| format!("invalid listen address {raw:?}"))
    }
}

fn pick(cli: &Option<String>, file: &Option<String>) -> Option<String> {
    cli.clone().or_else(|| file.clone())
}
