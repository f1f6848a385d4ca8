use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Url,
    Markup,
}

/// Decide whether `content` is a reachable network location or inline markup.
///
/// Only absolute locations with an authority count as `Url`; everything that
/// fails to parse, or parses without a host (`mailto:`, `javascript:`), is markup.
pub fn classify(content: &str) -> ContentKind {
    match Url::parse(content) {
        Ok(url) if url.has_host() => ContentKind::Url,
        _ => ContentKind::Markup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_locations_are_urls() {
        assert_eq!(classify("https://example.com/a"), ContentKind::Url);
        assert_eq!(classify("http://localhost:8080/doc?x=1"), ContentKind::Url);
        assert_eq!(classify("ftp://files.example.com/"), ContentKind::Url);
    }

    #[test]
    fn markup_and_prose_are_markup() {
        assert_eq!(classify("<b>hi</b>"), ContentKind::Markup);
        assert_eq!(classify("not a url"), ContentKind::Markup);
        assert_eq!(classify("/relative/path"), ContentKind::Markup);
        assert_eq!(classify(""), ContentKind::Markup);
    }

    #[test]
    fn schemes_without_authority_are_markup() {
        assert_eq!(classify("javascript:alert(1)"), ContentKind::Markup);
        assert_eq!(classify("mailto:someone@example.com"), ContentKind::Markup);
    }

    #[test]
    fn padded_url_still_parses() {
        // WHATWG parsing strips leading/trailing C0 controls and spaces.
        assert_eq!(classify("  https://example.com  "), ContentKind::Url);
        assert_eq!(classify("see https://example.com"), ContentKind::Markup);
    }
}
