use scraper::node::Element;

use crate::markup::{rewrite_fragment, ElementAction};
use crate::SanitizationPolicy;

/// Largest inline markup the sanitizer will accept.
pub const MAX_MARKUP_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("markup too large to sanitize (max {max_bytes} bytes, got {actual})")]
    TooLarge { max_bytes: usize, actual: usize },
}

const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "big", "blink", "blockquote", "br", "button", "canvas", "caption", "center", "cite", "code",
    "col", "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "dir", "div",
    "dl", "dt", "em", "fieldset", "figcaption", "figure", "font", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "i", "img", "input", "ins", "kbd", "label",
    "legend", "li", "main", "map", "mark", "marquee", "menu", "meter", "nav", "nobr", "ol",
    "optgroup", "option", "output", "p", "picture", "pre", "progress", "q", "rp", "rt", "ruby",
    "s", "samp", "section", "select", "small", "source", "span", "strike", "strong", "style",
    "sub", "summary", "sup", "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "time",
    "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
];

const DEFAULT_ATTRIBUTES: &[&str] = &[
    "accept", "action", "align", "alt", "autocomplete", "autoplay", "background", "bgcolor",
    "border", "cellpadding", "cellspacing", "checked", "cite", "class", "clear", "color", "cols",
    "colspan", "controls", "coords", "datetime", "default", "dir", "disabled", "download",
    "draggable", "enctype", "face", "for", "headers", "height", "hidden", "high", "href",
    "hreflang", "id", "inputmode", "kind", "label", "lang", "list", "loading", "loop", "low",
    "max", "maxlength", "media", "method", "min", "minlength", "multiple", "muted", "name",
    "noshade", "novalidate", "nowrap", "open", "optimum", "pattern", "placeholder", "poster",
    "preload", "readonly", "rel", "required", "reversed", "role", "rows", "rowspan", "scope",
    "selected", "shape", "size", "sizes", "span", "spellcheck", "src", "srclang", "srcset",
    "start", "step", "style", "summary", "tabindex", "title", "translate", "type", "usemap",
    "valign", "value", "width",
];

/// Elements whose content is never shown; removing them removes their content too.
const FORBID_CONTENTS: &[&str] = &[
    "embed", "frame", "frameset", "head", "iframe", "math", "noembed", "noframes", "noscript",
    "object", "plaintext", "script", "style", "svg", "template", "title", "xmp",
];

const URI_ATTRIBUTES: &[&str] = &[
    "action", "background", "cite", "formaction", "href", "longdesc", "poster", "src",
    "usemap", "xlink:href",
];

const DATA_URI_TAGS: &[&str] = &["audio", "img", "source", "track", "video"];

/// Deny-by-default sanitization of inline markup.
///
/// The policy's extra tags and attributes extend the default allow-list for
/// this call only. Scripts that survive (because `script` was allow-listed) are
/// left inert; re-arming them is a separate pass, see [`crate::rearm`].
pub fn sanitize(markup: &str, policy: &SanitizationPolicy) -> Result<String, SanitizeError> {
    if markup.len() > MAX_MARKUP_BYTES {
        return Err(SanitizeError::TooLarge {
            max_bytes: MAX_MARKUP_BYTES,
            actual: markup.len(),
        });
    }
    Ok(rewrite_fragment(markup, |element| {
        sanitize_element(element, policy)
    }))
}

fn sanitize_element(element: &Element, policy: &SanitizationPolicy) -> ElementAction {
    let tag = element.name();
    if !tag_allowed(tag, policy) {
        return if FORBID_CONTENTS.contains(&tag) {
            ElementAction::Drop
        } else {
            ElementAction::Unwrap
        };
    }
    let attrs = element
        .attrs()
        .filter(|(name, value)| attribute_allowed(tag, name, value, policy))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    ElementAction::Keep(attrs)
}

fn tag_allowed(tag: &str, policy: &SanitizationPolicy) -> bool {
    DEFAULT_TAGS.contains(&tag) || policy.allows_tag(tag)
}

fn attribute_allowed(tag: &str, name: &str, value: &str, policy: &SanitizationPolicy) -> bool {
    let name = name.to_ascii_lowercase();
    let listed = policy.allows_attribute(&name);
    let allowed = listed
        || (!name.starts_with("on")
            && (DEFAULT_ATTRIBUTES.contains(&name.as_str())
                || name.starts_with("data-")
                || name.starts_with("aria-")));
    if !allowed {
        return false;
    }
    if URI_ATTRIBUTES.contains(&name.as_str()) {
        return uri_allowed(tag, value);
    }
    true
}

fn uri_allowed(tag: &str, value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if normalized.starts_with("javascript:") || normalized.starts_with("vbscript:") {
        return false;
    }
    if normalized.starts_with("data:") {
        return DATA_URI_TAGS.contains(&tag);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strict(markup: &str) -> String {
        sanitize(markup, &SanitizationPolicy::strict()).unwrap()
    }

    #[test]
    fn safe_markup_passes_through() {
        assert_eq!(strict("<b>hi</b>"), "<b>hi</b>");
        assert_eq!(
            strict("<p class=\"lead\"><a href=\"https://example.com\">x</a></p>"),
            "<p class=\"lead\"><a href=\"https://example.com\">x</a></p>"
        );
    }

    #[test]
    fn script_is_removed_with_its_content() {
        assert_eq!(strict("<p>a</p><script>alert(1)</script>"), "<p>a</p>");
    }

    #[test]
    fn unknown_element_is_unwrapped() {
        assert_eq!(strict("<blink2><i>x</i></blink2>"), "<i>x</i>");
    }

    #[test]
    fn event_handlers_are_stripped() {
        assert_eq!(strict("<img src=\"a.png\" onerror=\"alert(1)\">"), "<img src=\"a.png\">");
    }

    #[test]
    fn javascript_urls_are_stripped() {
        assert_eq!(strict("<a href=\" JaVa\tscript:alert(1)\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn data_uris_only_on_media() {
        assert_eq!(
            strict("<img src=\"data:image/png;base64,AA==\">"),
            "<img src=\"data:image/png;base64,AA==\">"
        );
        assert_eq!(strict("<a href=\"data:text/html,x\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn data_and_aria_attributes_are_kept() {
        let out = strict("<div data-row=\"3\" aria-label=\"row\" onclick=\"x()\">x</div>");
        assert!(out.contains("data-row=\"3\""), "{out}");
        assert!(out.contains("aria-label=\"row\""), "{out}");
        assert!(!out.contains("onclick"), "{out}");
    }

    #[test]
    fn extra_tags_and_attributes_apply_per_call() {
        let policy = SanitizationPolicy::from_lists(Some("script"), Some("onclick"));
        assert_eq!(
            sanitize("<button onclick=\"go()\">x</button><script>go()</script>", &policy).unwrap(),
            "<button onclick=\"go()\">x</button><script>go()</script>"
        );
        assert_eq!(strict("<button onclick=\"go()\">x</button>"), "<button>x</button>");
    }

    #[test]
    fn oversized_markup_is_a_fault() {
        let markup = "a".repeat(MAX_MARKUP_BYTES + 1);
        assert_eq!(
            sanitize(&markup, &SanitizationPolicy::strict()),
            Err(SanitizeError::TooLarge {
                max_bytes: MAX_MARKUP_BYTES,
                actual: MAX_MARKUP_BYTES + 1,
            })
        );
    }
}
