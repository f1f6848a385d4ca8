//! Post-injection script re-arm pass.
//!
//! Markup injected into a viewport is inert: its `<script>` elements do not run.
//! When the launch configuration allow-lists `script`, each injected script is
//! replaced in place by a freshly built [`ScriptNode`] with the same attributes
//! and body, which the viewport then executes. This is an XSS-equivalent escape
//! hatch; it must only run when [`crate::SanitizationPolicy::rearms_scripts`] is on.
use std::collections::BTreeMap;

use scraper::{Html, Selector};

use crate::markup::{owned_attrs, rewrite_fragment, write_start_tag, ElementAction};

const INERT_TYPE: &str = "text/plain";
const INERT_MARKER: &str = "data-inert-script";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNode {
    pub attributes: Vec<(String, String)>,
    pub body: String,
}

impl ScriptNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 32);
        write_start_tag("script", &self.attributes, &mut out);
        out.push_str(&self.body);
        out.push_str("</script>");
        out
    }
}

/// Build a fresh equivalent of every script in `markup`, in document order.
pub fn collect_scripts(markup: &str) -> Vec<ScriptNode> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    let fragment = Html::parse_fragment(markup);
    fragment
        .select(&selector)
        .map(|script| ScriptNode {
            attributes: owned_attrs(script.value()),
            body: script.text().collect(),
        })
        .collect()
}

/// Serialize injected markup as the viewport holds it.
///
/// Scripts whose index appears in `replacements` are emitted as the
/// replacement node (live); all others are written inert.
pub fn render_injected(markup: &str, replacements: &BTreeMap<usize, ScriptNode>) -> String {
    let mut index = 0usize;
    rewrite_fragment(markup, |element| {
        let attrs = owned_attrs(element);
        if element.name() != "script" {
            return ElementAction::Keep(attrs);
        }
        let current = index;
        index += 1;
        match replacements.get(&current) {
            Some(live) => ElementAction::Replace(live.to_html()),
            None => ElementAction::Keep(inert_attrs(attrs, current)),
        }
    })
}

fn inert_attrs(attrs: Vec<(String, String)>, index: usize) -> Vec<(String, String)> {
    let mut inert: Vec<(String, String)> = attrs
        .into_iter()
        .filter(|(key, _)| key != "type" && key != INERT_MARKER)
        .collect();
    inert.push(("type".to_string(), INERT_TYPE.to_string()));
    inert.push((INERT_MARKER.to_string(), index.to_string()));
    inert
}
