//! Geocoding and time zones.
//!
//! Place names are resolved through the Yandex geocoder; time zone names come
//! from the Google Time Zone API. Both lookups are best effort: any failure
//! yields `None`.

use crate::fetch::Fetcher;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const GEOCODER_URL: &str = "http://geocode-maps.yandex.ru/1.x/";
pub const TIMEZONE_URL: &str = "https://maps.googleapis.com/maps/api/timezone/json";

/// What the geocoder knows about a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationData {
    /// The name the lookup was made with.
    pub requested_name: String,
    /// Object kind, e.g. `locality`, `street`.
    pub kind: String,
    /// Full name, e.g. `Россия, Москва`.
    pub name: String,
    pub country: String,
    /// `"<lat>,<lng>"`.
    pub pos: String,
    /// `"<lower corner>|<upper corner>"`, corners as the geocoder writes them.
    pub bounds: String,
}

fn str_at<'a>(doc: &'a Value, pointer: &str) -> Option<&'a str> {
    doc.pointer(pointer).and_then(Value::as_str)
}

/// Extract [`LocationData`] from a geocoder response.
///
/// `None` when nothing was found or the document is not a geocoder response.
pub fn parse_location(requested_name: &str, doc: &Value) -> Option<LocationData> {
    let collection = doc.pointer("/response/GeoObjectCollection")?;

    let found = collection.pointer("/metaDataProperty/GeocoderResponseMetaData/found")?;
    let found = match found {
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        other => other.as_u64()?,
    };
    if found == 0 {
        return None;
    }

    let object = collection.pointer("/featureMember/0/GeoObject")?;
    let meta = object.pointer("/metaDataProperty/GeocoderMetaData")?;

    // The geocoder writes "<lng> <lat>".
    let pos: Vec<&str> = str_at(object, "/Point/pos")?.split(' ').rev().collect();

    Some(LocationData {
        requested_name: requested_name.to_string(),
        kind: str_at(meta, "/kind")?.to_string(),
        name: str_at(meta, "/text")?.to_string(),
        country: str_at(meta, "/AddressDetails/Country/CountryName")?.to_string(),
        pos: pos.join(","),
        bounds: format!(
            "{}|{}",
            str_at(object, "/boundedBy/Envelope/lowerCorner")?,
            str_at(object, "/boundedBy/Envelope/upperCorner")?
        ),
    })
}

/// Geocoder request URL for `name` against `endpoint`.
pub fn location_url(endpoint: &str, name: &str) -> Option<String> {
    Url::parse_with_params(
        endpoint,
        &[("results", "1"), ("format", "json"), ("geocode", name)],
    )
    .ok()
    .map(String::from)
}

/// Look up a place by name.
pub fn get_location_data(fetcher: &Fetcher, name: &str) -> Option<LocationData> {
    get_location_data_from(fetcher, GEOCODER_URL, name)
}

pub(crate) fn get_location_data_from(
    fetcher: &Fetcher,
    endpoint: &str,
    name: &str,
) -> Option<LocationData> {
    let url = location_url(endpoint, name)?;
    let doc = fetch_document(fetcher, &url)?;
    let location = parse_location(name, &doc);
    if location.is_none() {
        debug!(name, "geocoder found nothing");
    }
    location
}

/// Time zone request URL for a point at `timestamp` (Unix seconds).
pub fn timezone_url(endpoint: &str, lat: f64, lng: f64, timestamp: i64, api_key: &str) -> Option<String> {
    Url::parse_with_params(
        endpoint,
        &[
            ("location", format!("{lat},{lng}")),
            ("timestamp", timestamp.to_string()),
            ("key", api_key.to_string()),
        ],
    )
    .ok()
    .map(String::from)
}

/// `timeZoneId` of a Time Zone API response.
pub fn parse_timezone(doc: &Value) -> Option<String> {
    str_at(doc, "/timeZoneId").map(str::to_string)
}

/// Time zone name (e.g. `Europe/Moscow`) at the given coordinates.
pub fn get_timezone_name(fetcher: &Fetcher, api_key: &str, lat: f64, lng: f64) -> Option<String> {
    get_timezone_name_from(fetcher, TIMEZONE_URL, api_key, lat, lng)
}

pub(crate) fn get_timezone_name_from(
    fetcher: &Fetcher,
    endpoint: &str,
    api_key: &str,
    lat: f64,
    lng: f64,
) -> Option<String> {
    let timestamp = chrono::Utc::now().timestamp();
    let url = timezone_url(endpoint, lat, lng, timestamp, api_key)?;
    parse_timezone(&fetch_document(fetcher, &url)?)
}

/// Plain GET + JSON decode; failures are logged and dropped.
fn fetch_document(fetcher: &Fetcher, url: &str) -> Option<Value> {
    let response = fetcher
        .get_from_url(url)
        .map_err(|e| debug!(url, error = %e, "lookup request failed"))
        .ok()?;
    response
        .json::<Value>()
        .map_err(|e| debug!(url, error = %e, "lookup response is not JSON"))
        .ok()
}
