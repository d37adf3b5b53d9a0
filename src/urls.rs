//! URL helpers: query-string updates, UTM tagging and display mangling.
//!
//! These work on plain strings rather than parsed [`url::Url`]s so that
//! site-relative links (`/articles/12/`) are handled the same way as
//! absolute ones.

use url::form_urlencoded;

/// URLs up to this many characters are displayed as-is by [`url_mangle`].
const MANGLE_THRESHOLD: usize = 45;

/// Split `url` into `(base, query, fragment)`.
fn split_url(url: &str) -> (&str, &str, &str) {
    let (rest, fragment) = url.split_once('#').unwrap_or((url, ""));
    let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
    (base, query, fragment)
}

fn join_url(base: &str, query: &str, fragment: &str) -> String {
    let mut out = base.to_string();
    if !query.is_empty() {
        out.push('?');
        out.push_str(query);
    }
    if !fragment.is_empty() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Set query parameters on `url`, replacing values of parameters already present.
///
/// Existing parameters keep their position (repeated keys keep all of their
/// values unless replaced); new ones are appended in the given order. Blank
/// values in the original query are dropped.
pub fn update_url_qs(url: &str, params: &[(&str, &str)]) -> String {
    let (base, query, fragment) = split_url(url);

    let mut merged: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => merged.push((key.into_owned(), vec![value.into_owned()])),
        }
    }

    for (key, value) in params {
        let value = vec![(*value).to_string()];
        match merged.iter_mut().find(|(k, _)| k.as_str() == *key) {
            Some((_, values)) => *values = value,
            None => merged.push(((*key).to_string(), value)),
        }
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in &merged {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    join_url(base, &serializer.finish(), fragment)
}

/// Urchin Tracking Module labels attached to outgoing and promo links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utm<'a> {
    /// Where the visitor comes from, e.g. `pythonz`, `google`.
    pub source: &'a str,
    /// Channel, e.g. `referral`, `cpc`, `banner`, `email`.
    pub medium: &'a str,
    /// Campaign keyword: a slogan, promo code and the like.
    pub campaign: &'a str,
}

impl<'a> Utm<'a> {
    pub fn new(source: &'a str, medium: &'a str, campaign: &'a str) -> Self {
        Self {
            source,
            medium,
            campaign,
        }
    }

    /// Labels for links leading from the site to third-party resources.
    pub fn external() -> Self {
        Self::new("pythonz", "referral", "item")
    }

    /// Labels for the site's own links promoted through `source`.
    pub fn internal(source: &'a str) -> Self {
        Self::new(source, "link", "promo")
    }

    pub fn add_to_url(&self, url: &str) -> String {
        update_url_qs(
            url,
            &[
                ("utm_source", self.source),
                ("utm_medium", self.medium),
                ("utm_campaign", self.campaign),
            ],
        )
    }

    /// Tag a link pointing away from the site.
    pub fn add_to_external_url(url: &str) -> String {
        Utm::external().add_to_url(url)
    }

    /// Tag one of the site's own links shared through `source`.
    pub fn add_to_internal_url(url: &str, source: &str) -> String {
        Utm::internal(source).add_to_url(url)
    }
}

/// Shorten a long URL for display, making it non-functional on purpose.
///
/// Query and fragment are dropped and every path segment but the last is
/// replaced by `<...>`.
pub fn url_mangle(url: &str) -> String {
    if url.chars().count() <= MANGLE_THRESHOLD {
        return url.to_string();
    }

    let (head, _, _) = split_url(url);
    let (prefix, path) = match head.find("://") {
        Some(scheme_end) => {
            let netloc_start = scheme_end + 3;
            match head[netloc_start..].find('/') {
                Some(offset) => head.split_at(netloc_start + offset),
                None => (head, ""),
            }
        }
        None => ("", head),
    };

    if path.trim_matches('/').is_empty() {
        return format!("{prefix}{path}");
    }
    let last = path.rsplit('/').next().unwrap_or_default();
    let separator = if prefix.is_empty() { "" } else { "/" };
    format!("{prefix}{separator}<...>{last}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_appends_to_empty_query() {
        assert_eq!(
            update_url_qs("http://example.com/a/", &[("x", "1")]),
            "http://example.com/a/?x=1"
        );
    }

    #[test]
    fn update_replaces_existing_and_keeps_order() {
        assert_eq!(
            update_url_qs("http://example.com/?a=1&b=2&a=3", &[("a", "9"), ("c", "4")]),
            "http://example.com/?a=9&b=2&c=4"
        );
    }

    #[test]
    fn update_keeps_repeated_untouched_keys() {
        assert_eq!(
            update_url_qs("/search?tag=py&tag=web", &[("page", "2")]),
            "/search?tag=py&tag=web&page=2"
        );
    }

    #[test]
    fn update_drops_blank_values_and_keeps_fragment() {
        assert_eq!(
            update_url_qs("http://example.com/?empty=&a=1#top", &[("b", "two words")]),
            "http://example.com/?a=1&b=two+words#top"
        );
    }

    #[test]
    fn utm_external() {
        assert_eq!(
            Utm::add_to_external_url("http://python.org/news/"),
            "http://python.org/news/?utm_source=pythonz&utm_medium=referral&utm_campaign=item"
        );
    }

    #[test]
    fn utm_internal_overrides_previous_labels() {
        let url = "http://pythonz.net/articles/1/?utm_source=old&id=5";
        assert_eq!(
            Utm::add_to_internal_url(url, "telegram"),
            "http://pythonz.net/articles/1/?utm_source=telegram&id=5&utm_medium=link&utm_campaign=promo"
        );
    }

    #[test]
    fn mangle_short_url_untouched() {
        let url = "http://pythonz.net/articles/?page=2";
        assert_eq!(url_mangle(url), url);
    }

    #[test]
    fn mangle_long_url_keeps_last_segment() {
        assert_eq!(
            url_mangle("https://docs.python.org/3/library/collections/abc.html?highlight=x#id1"),
            "https://docs.python.org/<...>abc.html"
        );
    }

    #[test]
    fn mangle_long_url_trailing_slash() {
        assert_eq!(
            url_mangle("https://example.com/some/deeply/nested/section/of/site/"),
            "https://example.com/<...>"
        );
    }

    #[test]
    fn mangle_long_url_without_path_drops_query() {
        assert_eq!(
            url_mangle("https://example.com/?q=a-very-long-query-string-value-here"),
            "https://example.com/"
        );
    }
}
