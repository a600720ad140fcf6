//! End-to-end run: catalog resources, locations, then per-location averages.

use crate::api::Remote;
use crate::config::Settings;
use crate::error::{FetchError, Stage};
use crate::fetcher::PaginatedFetcher;
use crate::models::{Endpoint, FetchJob, QueryFilter};
use crate::storage;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Files written by a run, in the order they were written.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files: Vec<PathBuf>,
    pub locations: Vec<String>,
}

pub struct Pipeline<'a, R> {
    settings: &'a Settings,
    fetcher: PaginatedFetcher<&'a R>,
    remote: &'a R,
}

impl<'a, R: Remote> Pipeline<'a, R> {
    pub fn new(settings: &'a Settings, remote: &'a R) -> Self {
        Self {
            settings,
            fetcher: PaginatedFetcher::new(
                remote,
                settings.output_dir.clone(),
                settings.probe_timeout,
                settings.bulk_timeout,
            ),
            remote,
        }
    }

    /// Reset the output directory and download everything.
    pub fn run(&self) -> Result<RunSummary, FetchError> {
        storage::prepare_workspace(&self.settings.output_dir)?;
        let mut summary = RunSummary::default();

        summary.files.push(self.fetch_countries()?);
        log::info!("countries saved");
        summary.files.push(self.fetch_parameters()?);
        log::info!("parameters saved");

        let (path, body) = self.fetch_locations()?;
        summary.files.push(path);
        summary.locations = location_names(&body)?;
        log::info!(
            "{} location(s) in {}/{}",
            summary.locations.len(),
            self.settings.country_id,
            self.settings.city
        );

        for job in self.location_jobs(&summary.locations) {
            summary.files.extend(self.fetcher.fetch_all(&job)?);
        }
        log::info!("average measurements saved");
        Ok(summary)
    }

    fn single(
        &self,
        endpoint: Endpoint,
        query: &QueryFilter,
        timeout: Duration,
        file_name: &str,
    ) -> Result<(PathBuf, Value), FetchError> {
        let body = self
            .remote
            .get_json(endpoint, query, timeout)
            .map_err(|source| FetchError::RemoteFetchFailed {
                endpoint: endpoint.to_string(),
                stage: Stage::Single,
                source,
            })?;
        let path = storage::save_json(&self.settings.output_dir, file_name, &body)?;
        Ok((path, body))
    }

    pub fn fetch_countries(&self) -> Result<PathBuf, FetchError> {
        let query = QueryFilter::new()
            .with("limit", 200u32)
            .with("order_by", "country")
            .with("sort", "asc");
        self.single(
            Endpoint::Countries,
            &query,
            self.settings.catalog_timeout,
            "countries.json",
        )
        .map(|(p, _)| p)
    }

    pub fn fetch_parameters(&self) -> Result<PathBuf, FetchError> {
        let query = QueryFilter::new().with("limit", 100u32).with("sort", "asc");
        self.single(
            Endpoint::Parameters,
            &query,
            self.settings.catalog_timeout,
            "parameters.json",
        )
        .map(|(p, _)| p)
    }

    /// Locations of the configured city. Returns the saved file and the body.
    pub fn fetch_locations(&self) -> Result<(PathBuf, Value), FetchError> {
        let s = self.settings;
        let query = QueryFilter::new()
            .with("limit", 1000u32)
            .with("page", 1u32)
            .with("country_id", s.country_id.as_str())
            .with("city", s.city.as_str());
        let name = format!("locations_{}_{}.json", s.country_id, slug(&s.city));
        self.single(Endpoint::Locations, &query, s.locations_timeout, &name)
    }

    /// One averages job per location, in the order given.
    pub fn location_jobs<'n>(
        &self,
        names: &'n [String],
    ) -> impl Iterator<Item = FetchJob> + use<'a, 'n, R> {
        let s = self.settings;
        let base = QueryFilter::new()
            .with("country_id", s.country_id.as_str())
            .with("city", s.city.as_str())
            .with("date_from", s.date_from)
            .with("date_to", s.date_to)
            .with("spatial", s.spatial.as_str())
            .with("temporal", s.temporal.as_str());
        names
            .iter()
            .zip(unique_slugs(names))
            .map(move |(name, slug)| FetchJob {
                endpoint: Endpoint::Averages,
                filter: base.with("location", name.as_str()),
                page_size: s.page_size,
                label: format!("{}_{}", slug, s.temporal),
            })
    }
}

/// Distinct `results[*].name` strings, first occurrence first.
pub fn location_names(body: &Value) -> Result<Vec<String>, FetchError> {
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::InvalidResponseShape {
            endpoint: Endpoint::Locations.to_string(),
            detail: "missing `results` array".into(),
        })?;
    let mut names: Vec<String> = Vec::new();
    for name in results.iter().filter_map(|r| r.get("name").and_then(Value::as_str)) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// File-name safe form: ASCII alphanumerics, `-` and `_` kept, the rest become `_`.
pub fn slug(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// One slug per name. A slug already handed out gets `_2`, `_3`, ... appended,
/// so distinct names never share page files.
pub fn unique_slugs(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    names
        .iter()
        .map(|name| {
            let base = slug(name);
            let mut candidate = base.clone();
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}
