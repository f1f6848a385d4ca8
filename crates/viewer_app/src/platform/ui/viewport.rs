use std::collections::BTreeMap;
use std::path::PathBuf;

use viewer_core::ScriptNode;
use viewer_engine::{AtomicFileWriter, PersistError};

use super::render::render_document;

/// The embedded rendering surface plus its error banner and status line.
///
/// Injected markup is inert; a script only runs once it is replaced through
/// [`Viewport::replace_script`].
pub trait Viewport {
    fn show_banner(&mut self, message: &str);
    fn clear_banner(&mut self);
    /// Replace the status line; empty text hides it.
    fn show_status(&mut self, status: &str);
    fn show_frame(&mut self, url: &str);
    fn inject_markup(&mut self, markup: &str);
    fn replace_script(&mut self, index: usize, script: &ScriptNode);
    fn clear(&mut self);
    /// Publish pending changes.
    fn flush(&mut self) -> Result<(), PersistError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Hidden,
    Frame(String),
    Markup {
        markup: String,
        live_scripts: BTreeMap<usize, ScriptNode>,
    },
}

/// Viewport that keeps the panel as a standalone HTML document on disk.
pub struct DocumentViewport {
    writer: AtomicFileWriter,
    banner: Option<String>,
    status: String,
    panel: Panel,
    changed: bool,
}

impl DocumentViewport {
    pub fn new(target: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(target),
            banner: None,
            status: String::new(),
            panel: Panel::Hidden,
            // Write the empty panel on the first flush.
            changed: true,
        }
    }

    pub fn document(&self) -> String {
        render_document(self.banner.as_deref(), &self.status, &self.panel)
    }

    fn set_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.changed = true;
    }
}

impl Viewport for DocumentViewport {
    fn show_banner(&mut self, message: &str) {
        self.banner = Some(message.to_string());
        self.changed = true;
    }

    fn clear_banner(&mut self) {
        self.changed |= self.banner.take().is_some();
    }

    fn show_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_string();
            self.changed = true;
        }
    }

    fn show_frame(&mut self, url: &str) {
        self.set_panel(Panel::Frame(url.to_string()));
    }

    fn inject_markup(&mut self, markup: &str) {
        self.set_panel(Panel::Markup {
            markup: markup.to_string(),
            live_scripts: BTreeMap::new(),
        });
    }

    fn replace_script(&mut self, index: usize, script: &ScriptNode) {
        if let Panel::Markup { live_scripts, .. } = &mut self.panel {
            live_scripts.insert(index, script.clone());
            self.changed = true;
        }
    }

    fn clear(&mut self) {
        self.set_panel(Panel::Hidden);
    }

    fn flush(&mut self) -> Result<(), PersistError> {
        if !self.changed {
            return Ok(());
        }
        self.writer.write(&self.document())?;
        self.changed = false;
        Ok(())
    }
}
