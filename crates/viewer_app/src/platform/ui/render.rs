use viewer_core::rearm::render_injected;

use super::viewport::Panel;

const STYLE: &str = "html, body { padding: 0; margin: 0; }\n\
    #error { display: none; background: red; color: white; padding: 20px; text-align: center; }\n\
    iframe { border: none; }";

/// Render the panel as a standalone HTML document.
///
/// An empty `status` leaves the status line out.
pub fn render_document(banner: Option<&str>, status: &str, panel: &Panel) -> String {
    let mut out = String::with_capacity(512);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Record viewer</title>\n<style>\n");
    out.push_str(STYLE);
    out.push_str("\n</style>\n</head>\n<body>\n");

    match banner {
        Some(message) => {
            out.push_str("<div id=\"error\" style=\"display: block\">");
            out.push_str(&escape(message));
            out.push_str("</div>\n");
        }
        None => out.push_str("<div id=\"error\"></div>\n"),
    }

    if !status.is_empty() {
        out.push_str("<p id=\"status\">");
        out.push_str(&escape(status));
        out.push_str("</p>\n");
    }

    match panel {
        Panel::Hidden => out.push_str("<div id=\"rendered\" style=\"display: none\"></div>\n"),
        Panel::Frame(url) => {
            out.push_str("<div id=\"rendered\" style=\"display: block\"><iframe src=\"");
            out.push_str(&escape(url));
            out.push_str("\" style=\"width: inherit; height: inherit\"></iframe></div>\n");
        }
        Panel::Markup {
            markup,
            live_scripts,
        } => {
            out.push_str("<div id=\"rendered\" style=\"display: block\">");
            out.push_str(&render_injected(markup, live_scripts));
            out.push_str("</div>\n");
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn hidden_panel_without_banner() {
        let doc = render_document(None, "", &Panel::Hidden);
        assert!(doc.contains("<div id=\"error\"></div>"));
        assert!(doc.contains("<div id=\"rendered\" style=\"display: none\"></div>"));
    }

    #[test]
    fn status_line_only_when_set() {
        assert!(!render_document(None, "", &Panel::Hidden).contains("id=\"status\""));
        let doc = render_document(None, "Fetching content...", &Panel::Hidden);
        assert!(doc.contains("<p id=\"status\">Fetching content...</p>"));
    }

    #[test]
    fn banner_text_is_escaped() {
        let doc = render_document(Some("<b>bad</b>"), "", &Panel::Hidden);
        assert!(doc.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }

    #[test]
    fn frame_url_is_attribute_escaped() {
        let doc = render_document(
            None,
            "",
            &Panel::Frame("https://example.com/?a=1&b=\"2\"".to_string()),
        );
        assert!(doc.contains("src=\"https://example.com/?a=1&amp;b=&quot;2&quot;\""));
    }

    #[test]
    fn markup_is_embedded() {
        let panel = Panel::Markup {
            markup: "<p>hi</p>".to_string(),
            live_scripts: BTreeMap::new(),
        };
        let doc = render_document(None, "", &panel);
        assert!(doc.contains("<div id=\"rendered\" style=\"display: block\"><p>hi</p></div>"));
    }
}
