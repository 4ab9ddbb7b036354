use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Response of `GET {endpoint}`: the repository's refs.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiRoot {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// A document envelope. `D` selects which part of `data` is kept; fields
/// not named by `D` are dropped during deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document<D> {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "publication_date::deserialize")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "publication_date::deserialize")]
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: D,
}

/// Response of `GET {endpoint}/documents/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<D> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub results_size: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Opaque cursor URL of the next page, `None` on the last page.
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<Document<D>>,
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub mod publication_date {
    use super::*;
    use serde::de::Error;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| {
            parse(&value).ok_or_else(|| D::Error::custom(format!("invalid date: {}", value)))
        })
        .transpose()
    }

    /// Accepts RFC 3339, the API's `2021-03-25T19:25:28+0000` form and bare dates.
    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(date) = DateTime::parse_from_rfc3339(value) {
            return Some(date.with_timezone(&Utc));
        }

        if let Ok(date) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
            return Some(date.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc())
    }
}
