//! The rendering session: host events and task completions feed one update loop.
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use viewer_core::{update, AppState, Msg, SanitizationPolicy};
use viewer_logging::{viewer_debug, viewer_error, viewer_info};

use super::effects::EffectRunner;
use super::host::parse_line;
use super::ui::viewport::Viewport;

pub enum Inbox {
    Host(Msg),
    InputClosed,
    TaskDone(Option<Msg>),
}

pub fn inbox() -> (UnboundedSender<Inbox>, UnboundedReceiver<Inbox>) {
    mpsc::unbounded_channel()
}

/// Forward host events read from `input` into the inbox until end of input.
pub fn spawn_host_reader<R>(input: R, tx: UnboundedSender<Inbox>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(msg) = parse_line(&line) {
                        if tx.send(Inbox::Host(msg)).is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = tx.send(Inbox::Host(Msg::Fault(format!("reading host events: {err}"))));
                    break;
                }
            }
        }
        let _ = tx.send(Inbox::InputClosed);
    });
}

pub struct Session<V: Viewport> {
    state: AppState,
    runner: EffectRunner,
    viewport: V,
    pending: usize,
}

impl<V: Viewport> Session<V> {
    pub fn new(policy: SanitizationPolicy, runner: EffectRunner, viewport: V) -> Self {
        Self::with_state(AppState::with_policy(policy), runner, viewport)
    }

    pub fn with_state(state: AppState, runner: EffectRunner, viewport: V) -> Self {
        Self {
            state,
            runner,
            viewport,
            pending: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Drain the inbox until input has closed and every spawned task reported back.
    pub async fn run(mut self, mut rx: UnboundedReceiver<Inbox>) -> Self {
        self.publish();
        let mut input_open = true;
        while input_open || self.pending > 0 {
            let Some(item) = rx.recv().await else {
                break;
            };
            match item {
                Inbox::Host(msg) => self.dispatch_msg(msg),
                Inbox::InputClosed => {
                    viewer_info!("Host input closed; {} task(s) pending", self.pending);
                    input_open = false;
                }
                Inbox::TaskDone(reply) => {
                    self.pending = self.pending.saturating_sub(1);
                    if let Some(msg) = reply {
                        self.dispatch_msg(msg);
                    }
                }
            }
        }
        self
    }

    pub fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if effects.is_empty() {
            return;
        }
        viewer_debug!("Applying {} effect(s)", effects.len());
        self.pending += self.runner.apply(effects, &mut self.viewport);
        if self.state.consume_dirty() {
            viewer_debug!("State now {:?}", self.state.phase());
        }
        self.publish();
    }

    fn publish(&mut self) {
        if let Err(err) = self.viewport.flush() {
            viewer_error!("Failed to publish panel: {}", err);
        }
    }
}
