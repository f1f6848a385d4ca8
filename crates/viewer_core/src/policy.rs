use std::collections::BTreeSet;

use url::form_urlencoded;

const SCRIPT_TAG: &str = "script";

/// Allow-list extensions chosen at launch. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizationPolicy {
    extra_tags: BTreeSet<String>,
    extra_attributes: BTreeSet<String>,
}

impl SanitizationPolicy {
    /// Strict default allow-list only.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Build from the optional `tags` / `attr` comma-separated launch parameters.
    pub fn from_lists(tags: Option<&str>, attr: Option<&str>) -> Self {
        Self {
            extra_tags: split_names(tags),
            extra_attributes: split_names(attr),
        }
    }

    /// Build from a launch query string such as `?tags=script&attr=onclick`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut tags = None;
        let mut attr = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tags" => tags = Some(value.into_owned()),
                "attr" => attr = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::from_lists(tags.as_deref(), attr.as_deref())
    }

    pub fn extra_tags(&self) -> &BTreeSet<String> {
        &self.extra_tags
    }

    pub fn extra_attributes(&self) -> &BTreeSet<String> {
        &self.extra_attributes
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.extra_tags.contains(tag)
    }

    pub fn allows_attribute(&self, name: &str) -> bool {
        self.extra_attributes.contains(name)
    }

    /// Whether injected scripts must be re-armed after injection.
    ///
    /// This is an XSS-equivalent escape hatch and is only ever on when the
    /// launch configuration names `script` explicitly.
    pub fn rearms_scripts(&self) -> bool {
        self.allows_tag(SCRIPT_TAG)
    }
}

fn split_names(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_lists_mean_strict() {
        assert_eq!(SanitizationPolicy::from_lists(None, None), SanitizationPolicy::strict());
        assert!(!SanitizationPolicy::strict().rearms_scripts());
    }

    #[test]
    fn lists_are_trimmed_and_lowercased() {
        let policy = SanitizationPolicy::from_lists(Some(" Script, iframe ,,"), Some("onClick"));
        assert!(policy.allows_tag("script"));
        assert!(policy.allows_tag("iframe"));
        assert_eq!(policy.extra_tags().len(), 2);
        assert!(policy.allows_attribute("onclick"));
        assert!(policy.rearms_scripts());
    }

    #[test]
    fn query_string_is_parsed() {
        let policy = SanitizationPolicy::from_query("?tags=script%2Cmarquee&attr=onclick&x=1");
        assert!(policy.allows_tag("script"));
        assert!(policy.allows_tag("marquee"));
        assert!(policy.allows_attribute("onclick"));
    }

    #[test]
    fn empty_query_is_strict() {
        assert_eq!(SanitizationPolicy::from_query(""), SanitizationPolicy::strict());
    }
}
