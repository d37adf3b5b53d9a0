//! Third-party data sources.
//!
//! | Service | Module | Provides |
//! |---|---|---|
//! | hh.ru | [`hh`] | Fresh Python vacancies and their archive status |
//! | Yandex geocoder | [`geo`] | Location data for a place name |
//! | Google Time Zone API | [`geo`] | Time zone name for coordinates |
//! | pythondigest.ru RSS | [`digest`] | Fresh links for articles, videos and events |
//!
//! All requests go through [`Fetcher`](crate::fetch::Fetcher). Unreachable
//! services produce `None` rather than errors; only a response that was
//! received but cannot be understood is an [`IntegrationError`].

pub mod digest;
pub mod geo;
pub mod hh;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Unexpected response layout: {0}")]
    Layout(#[from] serde_json::Error),
    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
