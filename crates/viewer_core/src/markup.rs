//! Fragment re-serialization shared by the sanitizer and the script re-arm pass.
use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// What to do with one element while re-serializing a fragment.
pub(crate) enum ElementAction {
    /// Emit the element with exactly these attributes, then its children.
    Keep(Vec<(String, String)>),
    /// Drop the element but keep its children.
    Unwrap,
    /// Drop the element and everything below it.
    Drop,
    /// Emit this markup in place of the element.
    Replace(String),
}

/// Parse `markup` as a body fragment and write it back out, consulting `visit`
/// for every element. Comments, doctypes and processing instructions are dropped.
pub(crate) fn rewrite_fragment<F>(markup: &str, mut visit: F) -> String
where
    F: FnMut(&Element) -> ElementAction,
{
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    for child in fragment.root_element().children() {
        write_node(child, &mut visit, false, &mut out);
    }
    out
}

fn write_node<F>(node: NodeRef<'_, Node>, visit: &mut F, raw_text: bool, out: &mut String)
where
    F: FnMut(&Element) -> ElementAction,
{
    match node.value() {
        Node::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Node::Element(element) => match visit(element) {
            ElementAction::Keep(attrs) => {
                let name = element.name();
                write_start_tag(name, &attrs, out);
                if VOID_ELEMENTS.contains(&name) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&name);
                for child in node.children() {
                    write_node(child, visit, raw, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            ElementAction::Unwrap => {
                for child in node.children() {
                    write_node(child, visit, raw_text, out);
                }
            }
            ElementAction::Drop => {}
            ElementAction::Replace(html) => out.push_str(&html),
        },
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, visit, raw_text, out);
            }
        }
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
    }
}

pub(crate) fn write_start_tag(name: &str, attrs: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

/// Attributes of `element` in source order, as owned pairs.
pub(crate) fn owned_attrs(element: &Element) -> Vec<(String, String)> {
    element
        .attrs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}
