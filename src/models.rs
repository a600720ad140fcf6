use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Resources of the OpenAQ v2 API used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Countries,
    Parameters,
    Locations,
    Averages,
}

impl Endpoint {
    /// Path segment appended to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Countries => "countries",
            Endpoint::Parameters => "parameters",
            Endpoint::Locations => "locations",
            Endpoint::Averages => "averages",
        }
    }

    /// Prefix of the files written for this resource.
    /// Averaged series are stored under the `measurements` stem.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Endpoint::Averages => "measurements",
            other => other.path(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Int(i64),
    Date(NaiveDate),
    Str(String),
}

impl QueryValue {
    /// Rendering used on the wire. Dates are `YYYY-MM-DD`.
    pub fn to_query_param(&self) -> String {
        match self {
            QueryValue::Int(i) => i.to_string(),
            QueryValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            QueryValue::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<i64> for QueryValue {
    fn from(i: i64) -> Self {
        QueryValue::Int(i)
    }
}

impl From<u32> for QueryValue {
    fn from(i: u32) -> Self {
        QueryValue::Int(i64::from(i))
    }
}

impl From<NaiveDate> for QueryValue {
    fn from(d: NaiveDate) -> Self {
        QueryValue::Date(d)
    }
}

/// Immutable set of query parameters. Builders return a new filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    params: BTreeMap<String, QueryValue>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this filter with `name` set to `value` (replacing any previous value).
    pub fn with(&self, name: &str, value: impl Into<QueryValue>) -> Self {
        let mut params = self.params.clone();
        params.insert(name.to_string(), value.into());
        Self { params }
    }

    /// Copy of this filter overlaid with every entry of `other`.
    pub fn merged(&self, other: &QueryFilter) -> Self {
        let mut params = self.params.clone();
        for (k, v) in &other.params {
            params.insert(k.clone(), v.clone());
        }
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.params.get(name)
    }

    /// `(name, value)` pairs in key order, ready for a query string.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_param()))
            .collect()
    }
}

/// `meta` section of a response. Only `found` is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    /// The API has served `found` both as a number and as a numeric string.
    #[serde(deserialize_with = "de_u64_from_string_or_number")]
    pub found: u64,
}

impl PageMeta {
    /// Read `meta.found` out of a full response body.
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let meta = body
            .get("meta")
            .filter(|m| m.is_object())
            .ok_or_else(|| "missing or invalid `meta` object".to_string())?;
        serde_json::from_value(meta.clone()).map_err(|e| format!("meta.found: {e}"))
    }
}

/// Serde helper: parse `u64` from either a JSON integer or a string of digits.
fn de_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U64Visitor;

    impl<'de> Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative count")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(|_| E::custom("negative value for a count"))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u64>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}

/// One paginated download: executed once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub endpoint: Endpoint,
    pub filter: QueryFilter,
    pub page_size: u32,
    /// Filter dimension encoded in file names (e.g. the temporal granularity).
    pub label: String,
}

impl FetchJob {
    /// File name for page `page`, e.g. `measurements_day_3.json`.
    pub fn page_file_name(&self, page: u32) -> String {
        if self.label.is_empty() {
            format!("{}_{}.json", self.endpoint.file_stem(), page)
        } else {
            format!("{}_{}_{}.json", self.endpoint.file_stem(), self.label, page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn found_accepts_number_and_numeric_string() {
        let m = PageMeta::from_response(&json!({"meta": {"found": 250}})).unwrap();
        assert_eq!(m.found, 250);
        let m = PageMeta::from_response(&json!({"meta": {"found": " 42 "}})).unwrap();
        assert_eq!(m.found, 42);
    }

    #[test]
    fn found_rejects_bad_shapes() {
        for body in [
            json!({}),
            json!({"meta": {}}),
            json!({"meta": {"found": -1}}),
            json!({"meta": {"found": ">10000"}}),
            json!({"meta": {"found": 1.5}}),
            json!({"meta": {"found": null}}),
            json!({"meta": [250]}),
            json!({"meta": "250"}),
        ] {
            assert!(PageMeta::from_response(&body).is_err(), "{body}");
        }
    }

    #[test]
    fn filter_overrides_and_orders_keys() {
        let base = QueryFilter::new().with("limit", 1u32).with("city", "Lleida");
        let f = base.with("limit", 100u32);
        assert_eq!(base.get("limit"), Some(&QueryValue::Int(1)));
        assert_eq!(
            f.to_pairs(),
            vec![
                ("city".to_string(), "Lleida".to_string()),
                ("limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn dates_render_iso() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(QueryValue::from(d).to_query_param(), "2020-01-01");
    }

    #[test]
    fn page_file_names() {
        let mut job = FetchJob {
            endpoint: Endpoint::Averages,
            filter: QueryFilter::new(),
            page_size: 100,
            label: "day".into(),
        };
        assert_eq!(job.page_file_name(3), "measurements_day_3.json");
        job.label.clear();
        assert_eq!(job.page_file_name(1), "measurements_1.json");
    }
}
