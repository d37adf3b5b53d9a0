//! Recent entries from the pythondigest.ru RSS feeds.
//!
//! The digest publishes one feed per section. Each site realm reads the
//! sections listed in [`feed_mapping`]; together they give a short list of
//! fresh links for the editors to pick from.

use crate::fetch::Fetcher;
use crate::types::Realm;
use rss::Channel;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Feeds live at `<DIGEST_URL><alias>/`.
pub const DIGEST_URL: &str = "http://pythondigest.ru/rss/";

/// One feed item assigned to a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    /// Singular realm name, e.g. `article`.
    pub realm_name: String,
    pub url: String,
    pub title: String,
    pub description: String,
}

const ARTICLE_FEEDS: &[&str] = &["article", "authors"];
const VIDEO_FEEDS: &[&str] = &["video"];
const EVENT_FEEDS: &[&str] = &["event"];

/// Realms and the digest sections that feed them.
pub fn feed_mapping() -> Vec<(Realm, &'static [&'static str])> {
    vec![
        (Realm::article(), ARTICLE_FEEDS),
        (Realm::video(), VIDEO_FEEDS),
        (Realm::event(), EVENT_FEEDS),
    ]
}

/// Items taken from each feed of a realm with `alias_count` feeds.
pub fn entries_max(alias_count: usize) -> usize {
    if alias_count > 1 { 3 } else { 5 }
}

/// Take the first `max` items of `channel`, oldest of them first.
///
/// Items without a link, and links already in `known_links`, are skipped.
/// Taken links are added to `known_links`.
pub fn select_entries(
    realm: &Realm,
    channel: &Channel,
    max: usize,
    known_links: &mut HashSet<String>,
) -> Vec<DigestEntry> {
    channel
        .items()
        .iter()
        .take(max)
        .rev()
        .filter_map(|item| {
            let link = item.link()?;
            if !known_links.insert(link.to_string()) {
                return None;
            }
            Some(DigestEntry {
                realm_name: realm.name.clone(),
                url: link.to_string(),
                title: item.title().unwrap_or_default().to_string(),
                description: item.description().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Collect entries for every realm in [`feed_mapping`].
pub fn fetch_entries(fetcher: &Fetcher) -> Vec<DigestEntry> {
    fetch_entries_from(fetcher, DIGEST_URL, &feed_mapping())
}

pub(crate) fn fetch_entries_from(
    fetcher: &Fetcher,
    base_url: &str,
    mapping: &[(Realm, &[&str])],
) -> Vec<DigestEntry> {
    let mut results = Vec::new();
    let mut known_links = HashSet::new();
    for (realm, aliases) in mapping {
        let max = entries_max(aliases.len());
        for alias in aliases.iter() {
            let url = format!("{base_url}{alias}/");
            if let Some(channel) = fetch_feed(fetcher, &url) {
                results.extend(select_entries(realm, &channel, max, &mut known_links));
            }
        }
    }
    info!(count = results.len(), "fetched digest entries");
    results
}

/// Download and parse one feed. Failures are reported and yield `None`.
fn fetch_feed(fetcher: &Fetcher, url: &str) -> Option<Channel> {
    let body = match fetcher.get_bytes(url) {
        Ok(body) => body,
        Err(e) if e.is_transient() => {
            debug!(url, error = %e, "digest temporarily unavailable");
            return None;
        }
        Err(e) => {
            fetcher.report_failure(url, &e);
            return None;
        }
    };
    Channel::read_from(&body[..])
        .map_err(|e| fetcher.report_failure(url, &e))
        .ok()
}
