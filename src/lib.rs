//! # pythonz
//!
//! Content utilities behind pythonz.net, a community reference site about
//! Python: books, articles, videos, events, vacancies and the people behind
//! them. The crate holds the pieces that every section of the site shares.
//!
//! ```text
//! user text   ──► typograph ──► clean text (dashes, quotes, ©)
//! source img  ──► thumbnail ──► /media/img/<realm>/thumbs/<W>x<H>/<name>
//! links       ──► urls      ──► UTM-tagged or display-mangled URLs
//! hh.ru, maps ──► integrations (via fetch) ──► vacancies, places, time zones
//! RSS feeds   ──► integrations::digest     ──► fresh links per realm
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`typograph`] | Ordered regex rules normalizing dashes, quotes and symbols |
//! | [`thumbnail`] | On-demand thumbnails with TTL-memoized URLs, batch warming |
//! | [`cache`] | The thread-safe TTL URL memo and hit/miss counters |
//! | [`imaging`] | Pure-Rust fit-within-box thumbnailing behind a backend trait |
//! | [`urls`] | Query-string updates, UTM labels, URL mangling |
//! | [`text`] | Character/word truncation and currency grouping |
//! | [`fetch`] | Outbound HTTP with a fixed user agent and failure events |
//! | [`integrations`] | hh.ru vacancies, Yandex geocoder, Google time zones, pythondigest RSS |
//! | [`config`] | `pythonz.toml` loading, validation and merging onto stock defaults |
//! | [`types`] | Shared types (`Realm`) |
//! | [`logging`] | `tracing` subscriber setup for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Thumbnails Are Files, URLs Are Memoized
//!
//! A thumbnail is generated once and then lives on disk next to its source's
//! realm directory; nothing ever deletes it. What expires is only the
//! memoized URL (24 hours by default), and recomputing it after expiry is a
//! file existence check. Restarting the process loses the memo but none of
//! the work.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling) for
//! every supported format, behind the [`imaging::ImageBackend`] trait so the
//! thumbnail cache can be tested against a recording mock.
//!
//! ## Failures Outside Our Control Are Not Errors
//!
//! Third-party services go down. [`fetch::Fetcher::get_json`] turns every
//! transport or status failure into an empty document, and the integrations
//! turn empty documents into `None`. Non-transient failures are still
//! reported through an observer channel so they do not go unnoticed.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod imaging;
pub mod integrations;
pub mod logging;
pub mod output;
pub mod text;
pub mod thumbnail;
pub mod typograph;
pub mod types;
pub mod urls;
