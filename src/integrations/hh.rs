//! Vacancies from hh.ru.

use super::IntegrationError;
use crate::fetch::Fetcher;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Python vacancies published during the last day, newest first.
pub const VACANCIES_URL: &str = "https://api.hh.ru/vacancies/?search_field=name&per_page=500&order_by=publication_time&period=1&text=python";

/// A vacancy as the site stores it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vacancy {
    pub src_id: String,
    pub src_place_name: String,
    pub src_place_id: String,
    pub title: String,
    /// Human-facing page on hh.ru.
    pub url_site: String,
    /// API resource, used later to poll the archive status.
    pub url_api: String,
    /// 90px employer logo.
    pub url_logo: Option<String>,
    pub employer_name: String,
    pub salary_from: Option<i64>,
    pub salary_till: Option<i64>,
    /// Empty when the salary is not disclosed.
    pub salary_currency: String,
    pub time_published: DateTime<FixedOffset>,
    pub archived: bool,
}

#[derive(Deserialize)]
struct RawVacancy {
    id: String,
    name: String,
    area: RawArea,
    alternate_url: String,
    url: String,
    employer: RawEmployer,
    salary: Option<RawSalary>,
    published_at: String,
    #[serde(default)]
    archived: bool,
}

#[derive(Deserialize)]
struct RawArea {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct RawEmployer {
    name: String,
    #[serde(default)]
    logo_urls: Option<RawLogos>,
}

#[derive(Deserialize)]
struct RawLogos {
    #[serde(rename = "90")]
    small: Option<String>,
}

#[derive(Deserialize)]
struct RawSalary {
    from: Option<i64>,
    to: Option<i64>,
    currency: Option<String>,
}

/// hh.ru uses `+0300` offsets; RFC 3339 `+03:00` is accepted too.
fn parse_published(value: &str) -> Result<DateTime<FixedOffset>, IntegrationError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map_err(|source| IntegrationError::Timestamp {
            value: value.to_string(),
            source,
        })
}

impl TryFrom<RawVacancy> for Vacancy {
    type Error = IntegrationError;

    fn try_from(raw: RawVacancy) -> Result<Self, Self::Error> {
        let (salary_from, salary_till, salary_currency) = match raw.salary {
            Some(s) => (s.from, s.to, s.currency.unwrap_or_default()),
            None => (None, None, String::new()),
        };
        Ok(Self {
            src_id: raw.id,
            src_place_name: raw.area.name,
            src_place_id: raw.area.id,
            title: raw.name,
            url_site: raw.alternate_url,
            url_api: raw.url,
            url_logo: raw.employer.logo_urls.and_then(|logos| logos.small),
            employer_name: raw.employer.name,
            salary_from: salary_from.filter(|v| *v != 0),
            salary_till: salary_till.filter(|v| *v != 0),
            salary_currency,
            time_published: parse_published(&raw.published_at)?,
            archived: raw.archived,
        })
    }
}

/// Turn a vacancy search response into vacancies.
///
/// `Ok(None)` when the document has no `items`, which is what a failed
/// request looks like after [`Fetcher::get_json`].
pub fn parse_list(doc: &Value) -> Result<Option<Vec<Vacancy>>, IntegrationError> {
    let Some(items) = doc.get("items") else {
        return Ok(None);
    };
    let raw = Vec::<RawVacancy>::deserialize(items)?;
    raw.into_iter()
        .map(Vacancy::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Fetch the latest Python vacancies.
pub fn fetch_list(fetcher: &Fetcher) -> Result<Option<Vec<Vacancy>>, IntegrationError> {
    fetch_list_from(fetcher, VACANCIES_URL)
}

pub(crate) fn fetch_list_from(
    fetcher: &Fetcher,
    url: &str,
) -> Result<Option<Vec<Vacancy>>, IntegrationError> {
    let vacancies = parse_list(&fetcher.get_json(url))?;
    match &vacancies {
        Some(list) => info!(count = list.len(), "fetched vacancies"),
        None => debug!(url, "no vacancy list in response"),
    }
    Ok(vacancies)
}

/// Archive flag of the vacancy behind `url` (its `url_api`).
///
/// `None` when the vacancy could not be fetched.
pub fn get_status(fetcher: &Fetcher, url: &str) -> Option<bool> {
    let doc = fetcher.get_json(url);
    if doc.as_object().is_none_or(|o| o.is_empty()) {
        return None;
    }
    doc.get("archived").and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_server::{local_fetcher, serve_once};
    use serde_json::json;

    fn item(salary: Value, logos: Value) -> Value {
        json!({
            "id": "15880433",
            "name": "Python developer",
            "area": {"id": "1", "name": "Москва"},
            "alternate_url": "https://hh.ru/vacancy/15880433",
            "url": "https://api.hh.ru/vacancies/15880433?host=hh.ru",
            "employer": {"name": "Acme", "logo_urls": logos},
            "salary": salary,
            "published_at": "2016-03-02T12:30:00+0300",
            "archived": false
        })
    }

    #[test]
    fn parse_full_item() {
        let doc = json!({"items": [item(
            json!({"from": 100000, "to": 150000, "currency": "RUR"}),
            json!({"90": "https://hh.ru/logo90.png", "240": "https://hh.ru/logo240.png"}),
        )]});

        let list = parse_list(&doc).unwrap().unwrap();

        assert_eq!(list.len(), 1);
        let v = &list[0];
        assert_eq!(v.src_id, "15880433");
        assert_eq!(v.src_place_name, "Москва");
        assert_eq!(v.src_place_id, "1");
        assert_eq!(v.title, "Python developer");
        assert_eq!(v.url_site, "https://hh.ru/vacancy/15880433");
        assert_eq!(v.url_api, "https://api.hh.ru/vacancies/15880433?host=hh.ru");
        assert_eq!(v.url_logo.as_deref(), Some("https://hh.ru/logo90.png"));
        assert_eq!(v.employer_name, "Acme");
        assert_eq!(v.salary_from, Some(100000));
        assert_eq!(v.salary_till, Some(150000));
        assert_eq!(v.salary_currency, "RUR");
        assert_eq!(v.time_published.to_rfc3339(), "2016-03-02T12:30:00+03:00");
        assert!(!v.archived);
    }

    #[test]
    fn parse_item_without_salary_or_logo() {
        let doc = json!({"items": [item(Value::Null, Value::Null)]});

        let v = &parse_list(&doc).unwrap().unwrap()[0];

        assert_eq!(v.url_logo, None);
        assert_eq!(v.salary_from, None);
        assert_eq!(v.salary_till, None);
        assert_eq!(v.salary_currency, "");
    }

    #[test]
    fn zero_salary_bounds_are_absent() {
        let doc = json!({"items": [item(
            json!({"from": 0, "to": null, "currency": "USD"}),
            Value::Null,
        )]});

        let v = &parse_list(&doc).unwrap().unwrap()[0];

        assert_eq!(v.salary_from, None);
        assert_eq!(v.salary_till, None);
        assert_eq!(v.salary_currency, "USD");
    }

    #[test]
    fn rfc3339_timestamps_accepted() {
        let mut raw = item(Value::Null, Value::Null);
        raw["published_at"] = json!("2016-03-02T12:30:00+03:00");
        let v = &parse_list(&json!({"items": [raw]})).unwrap().unwrap()[0];
        assert_eq!(v.time_published.to_rfc3339(), "2016-03-02T12:30:00+03:00");
    }

    #[test]
    fn missing_items_is_none() {
        assert!(parse_list(&json!({})).unwrap().is_none());
        assert!(parse_list(&json!({"errors": []})).unwrap().is_none());
    }

    #[test]
    fn empty_items_is_empty_list() {
        assert_eq!(parse_list(&json!({"items": []})).unwrap(), Some(vec![]));
    }

    #[test]
    fn malformed_item_is_an_error() {
        let doc = json!({"items": [{"id": "1"}]});
        assert!(matches!(parse_list(&doc), Err(IntegrationError::Layout(_))));
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let mut raw = item(Value::Null, Value::Null);
        raw["published_at"] = json!("yesterday");
        assert!(matches!(
            parse_list(&json!({"items": [raw]})),
            Err(IntegrationError::Timestamp { .. })
        ));
    }

    #[test]
    fn fetch_list_over_http() {
        let body = json!({"items": [item(Value::Null, Value::Null)]}).to_string();
        let (base, server) = serve_once("200 OK", "application/json", body.as_bytes());

        let list = fetch_list_from(&local_fetcher(), &format!("{base}/vacancies/"))
            .unwrap()
            .unwrap();

        assert_eq!(list.len(), 1);
        server.join().unwrap();
    }

    #[test]
    fn fetch_list_service_down_is_none() {
        let (base, server) = serve_once("503 Service Unavailable", "text/plain", b"");
        assert!(fetch_list_from(&local_fetcher(), &base).unwrap().is_none());
        server.join().unwrap();
    }

    #[test]
    fn status_archived() {
        let (base, server) = serve_once("200 OK", "application/json", br#"{"id": "1", "archived": true}"#);
        assert_eq!(get_status(&local_fetcher(), &base), Some(true));
        server.join().unwrap();
    }

    #[test]
    fn status_unknown_when_request_fails() {
        let (base, server) = serve_once("404 Not Found", "text/plain", b"");
        assert_eq!(get_status(&local_fetcher(), &base), None);
        server.join().unwrap();
    }
}
