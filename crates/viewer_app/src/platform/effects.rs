use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use viewer_core::{Effect, FetchOutcome, Msg};
use viewer_engine::{ContentFetcher, FetchError, FetchedBody, MirrorStore, MirrorWriter};
use viewer_logging::{viewer_debug, viewer_error, viewer_info, viewer_warn};

use super::session::Inbox;
use super::ui::viewport::Viewport;

/// Banner shown when a background task ends without reporting its result.
pub const LOST_TASK_MESSAGE: &str = "background task failed";

/// Executes render effects: surface changes synchronously, network calls as tasks.
///
/// Every spawned task reports back exactly once through the inbox as
/// [`Inbox::TaskDone`], so the session can tell when all work has settled.
pub struct EffectRunner {
    fetcher: Arc<dyn ContentFetcher>,
    mirror: Option<MirrorWriter>,
    source: Option<Arc<dyn MirrorStore>>,
    inbox: UnboundedSender<Inbox>,
}

impl EffectRunner {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        mirror: Option<MirrorWriter>,
        inbox: UnboundedSender<Inbox>,
    ) -> Self {
        Self {
            fetcher,
            mirror,
            source: None,
            inbox,
        }
    }

    /// Store used to write fetched content back into the source table.
    pub fn with_source_store(mut self, source: Arc<dyn MirrorStore>) -> Self {
        self.source = Some(source);
        self
    }

    /// Apply `effects` in order. Returns the number of tasks spawned.
    pub fn apply(&self, effects: Vec<Effect>, viewport: &mut dyn Viewport) -> usize {
        let mut spawned = 0;
        for effect in effects {
            match effect {
                Effect::ShowBanner(message) => viewport.show_banner(&message),
                Effect::ClearBanner => viewport.clear_banner(),
                Effect::ShowStatus(status) => viewport.show_status(&status),
                Effect::ClearSurface => viewport.clear(),
                Effect::ShowFrame { url } => viewport.show_frame(&url),
                Effect::InjectMarkup { markup } => viewport.inject_markup(&markup),
                Effect::RearmScripts { scripts } => {
                    viewer_warn!("Re-arming {} injected script(s)", scripts.len());
                    for (index, script) in scripts.iter().enumerate() {
                        viewport.replace_script(index, script);
                    }
                }
                Effect::FetchBody { url } => {
                    self.spawn_fetch(url);
                    spawned += 1;
                }
                Effect::AppendMirror { content } => {
                    if self.spawn_append(content) {
                        spawned += 1;
                    }
                }
                Effect::FetchForRecord { record_id, url } => {
                    self.spawn_record_fetch(record_id, url);
                    spawned += 1;
                }
                Effect::StoreContent { record_id, content } => {
                    self.spawn_store(record_id, content);
                    spawned += 1;
                }
            }
        }
        spawned
    }

    fn spawn_fetch(&self, url: String) {
        viewer_info!("FetchBody url_len={} url={}", url.len(), url);
        let fetcher = self.fetcher.clone();
        let completion = Completion::new(self.inbox.clone());
        tokio::spawn(async move {
            let outcome = outcome_of(&url, fetcher.fetch(&url).await);
            completion.finish(Some(Msg::FrameFetched { url, outcome }));
        });
    }

    fn spawn_append(&self, content: String) -> bool {
        let Some(mirror) = self.mirror.clone() else {
            viewer_debug!("Mirroring disabled; skipped content_len={}", content.len());
            return false;
        };
        let completion = Completion::new(self.inbox.clone());
        tokio::spawn(async move {
            let reply = mirror
                .append(&content)
                .await
                .err()
                .map(|err| Msg::MirrorAppendFailed(err.to_string()));
            completion.finish(reply);
        });
        true
    }

    fn spawn_record_fetch(&self, record_id: i64, url: String) {
        viewer_info!("FetchForRecord record_id={} url={}", record_id, url);
        let fetcher = self.fetcher.clone();
        let completion = Completion::new(self.inbox.clone());
        tokio::spawn(async move {
            let outcome = outcome_of(&url, fetcher.fetch(&url).await);
            completion.finish(Some(Msg::ContentFetched { record_id, outcome }));
        });
    }

    fn spawn_store(&self, record_id: i64, content: String) {
        let completion = Completion::new(self.inbox.clone());
        let Some(source) = self.source.clone() else {
            viewer_error!("No source table configured; record {} not updated", record_id);
            completion.finish(Some(Msg::ContentStoreFailed(
                "source table not configured".to_string(),
            )));
            return;
        };
        tokio::spawn(async move {
            let reply = match source.patch(record_id, &content).await {
                Ok(()) => {
                    viewer_info!(
                        "Stored fetched content record_id={} content_len={}",
                        record_id,
                        content.len()
                    );
                    Msg::ContentStored { record_id, content }
                }
                Err(err) => {
                    viewer_error!("Storing fetched content into record {} failed: {}", record_id, err);
                    Msg::ContentStoreFailed(err.to_string())
                }
            };
            completion.finish(Some(reply));
        });
    }
}

fn outcome_of(url: &str, result: Result<FetchedBody, FetchError>) -> FetchOutcome {
    match result {
        Ok(fetched) if fetched.metadata.is_success() => {
            viewer_debug!(
                "Fetched body from {} ({} bytes)",
                fetched.metadata.final_url,
                fetched.metadata.byte_len
            );
            FetchOutcome::Body(fetched.body)
        }
        Ok(fetched) => {
            viewer_warn!(
                "Fetching {} answered {} {}",
                url,
                fetched.metadata.status,
                fetched.metadata.status_text
            );
            FetchOutcome::Rejected {
                status: fetched.metadata.status,
                status_text: fetched.metadata.status_text,
                body: fetched.body,
            }
        }
        Err(err) => {
            viewer_warn!("Fetching {} failed: {}", url, err);
            FetchOutcome::Failed(err.to_string())
        }
    }
}

/// Reports a task's completion exactly once, including when the task panics.
struct Completion {
    inbox: Option<UnboundedSender<Inbox>>,
}

impl Completion {
    fn new(inbox: UnboundedSender<Inbox>) -> Self {
        Self { inbox: Some(inbox) }
    }

    fn finish(mut self, reply: Option<Msg>) {
        if let Some(inbox) = self.inbox.take() {
            let _ = inbox.send(Inbox::TaskDone(reply));
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(inbox) = self.inbox.take() {
            viewer_error!("Background task ended without a result");
            let _ = inbox.send(Inbox::TaskDone(Some(Msg::Fault(
                LOST_TASK_MESSAGE.to_string(),
            ))));
        }
    }
}
