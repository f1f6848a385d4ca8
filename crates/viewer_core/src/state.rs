use crate::view_model::AppViewModel;
use crate::{FetchColumns, FetchTarget, SanitizationPolicy};

/// Banner shown when the record's content column cannot be resolved.
pub const NO_COLUMN_MESSAGE: &str = "no column selected";

const ERROR_PREFIX: &str = "Error: ";

/// Identity and content of the last record rendered in this session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayState {
    last_id: Option<i64>,
    last_content: Option<String>,
}

impl DisplayState {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<i64> {
        self.last_id
    }

    pub fn last_content(&self) -> Option<&str> {
        self.last_content.as_deref()
    }

    pub fn is_unset(&self) -> bool {
        self.last_id.is_none() && self.last_content.is_none()
    }

    pub fn matches(&self, id: i64, content: &str) -> bool {
        self.last_id == Some(id) && self.last_content.as_deref() == Some(content)
    }

    pub(crate) fn record(&mut self, id: i64, content: String) {
        self.last_id = Some(id);
        self.last_content = Some(content);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Empty,
    Error,
    Shown,
}

/// What the viewport currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Surface {
    #[default]
    Hidden,
    Frame {
        url: String,
    },
    Markup {
        markup: String,
    },
}

/// How `Record` events are handled for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewerMode {
    /// Show each record's content and mirror what was shown.
    #[default]
    Render,
    /// Download the record's URL on request and store it into the record.
    FetchInto(FetchColumns),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    mode: ViewerMode,
    policy: SanitizationPolicy,
    display: DisplayState,
    banner: Option<String>,
    status: String,
    fetch_target: Option<FetchTarget>,
    surface: Surface,
    // Set when an error cleared the surface after the last render.
    surface_stale: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SanitizationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn fetch_into(policy: SanitizationPolicy, columns: FetchColumns) -> Self {
        Self {
            mode: ViewerMode::FetchInto(columns),
            policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase(),
            banner: self.banner.clone(),
            status: self.status.clone(),
            surface: self.surface.clone(),
            last_id: self.display.last_id(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.banner.is_some() {
            Phase::Error
        } else if self.surface == Surface::Hidden {
            Phase::Empty
        } else {
            Phase::Shown
        }
    }

    pub fn mode(&self) -> &ViewerMode {
        &self.mode
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn fetch_target(&self) -> Option<&FetchTarget> {
        self.fetch_target.as_ref()
    }

    pub fn policy(&self) -> &SanitizationPolicy {
        &self.policy
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Returns whether state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current(&self, id: i64, content: &str) -> bool {
        self.display.matches(id, content) && !self.surface_stale
    }

    pub(crate) fn reset(&mut self) {
        self.display = DisplayState::unset();
        self.banner = None;
        self.status.clear();
        self.fetch_target = None;
        self.surface = Surface::Hidden;
        self.surface_stale = false;
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) -> String {
        self.status = status.into();
        self.dirty = true;
        self.status.clone()
    }

    pub(crate) fn target(&mut self, target: Option<FetchTarget>) {
        self.fetch_target = target;
        self.dirty = true;
    }

    pub(crate) fn remember(&mut self, id: i64, content: String) {
        self.display.record(id, content);
        self.dirty = true;
    }

    pub(crate) fn show(&mut self, surface: Surface) {
        self.surface = surface;
        self.surface_stale = false;
        self.dirty = true;
    }

    pub(crate) fn clear_surface(&mut self) {
        self.surface = Surface::Hidden;
        self.surface_stale = true;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, message: &str) -> String {
        let message = strip_error_prefix(message).to_string();
        self.banner = Some(message.clone());
        self.dirty = true;
        message
    }

    /// Returns true when a banner was showing.
    pub(crate) fn clear_banner(&mut self) -> bool {
        let had_banner = self.banner.take().is_some();
        self.dirty |= had_banner;
        had_banner
    }
}

/// Strip one leading generic `Error: ` prefix from a fault description.
pub fn strip_error_prefix(message: &str) -> &str {
    message.strip_prefix(ERROR_PREFIX).unwrap_or(message)
}
