//! Paginated bulk download.
//!
//! A probe request with `limit=1` reads `meta.found`, which fixes the number of
//! pages. Pages `1..=n` are then requested in order and each body is written to
//! disk before the next request goes out. The first failure ends the job.

use crate::api::Remote;
use crate::error::{FetchError, Stage};
use crate::models::{FetchJob, PageMeta, QueryFilter};
use crate::storage;
use std::path::PathBuf;
use std::time::Duration;

/// Number of pages of `page_size` records needed to cover `found` records.
pub fn page_count(found: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    found.div_ceil(u64::from(page_size))
}

#[derive(Debug)]
pub struct PaginatedFetcher<R> {
    remote: R,
    output_dir: PathBuf,
    probe_timeout: Duration,
    bulk_timeout: Duration,
}

impl<R: Remote> PaginatedFetcher<R> {
    pub fn new(
        remote: R,
        output_dir: impl Into<PathBuf>,
        probe_timeout: Duration,
        bulk_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            output_dir: output_dir.into(),
            probe_timeout,
            bulk_timeout,
        }
    }

    /// Read the total record count for `filter` with a single-record request.
    pub fn probe(&self, job: &FetchJob) -> Result<u64, FetchError> {
        let query = job
            .filter
            .merged(&QueryFilter::new().with("page", 1u32).with("limit", 1u32));
        let body = self
            .remote
            .get_json(job.endpoint, &query, self.probe_timeout)
            .map_err(|source| FetchError::RemoteFetchFailed {
                endpoint: job.endpoint.to_string(),
                stage: Stage::Probe,
                source,
            })?;
        let meta = PageMeta::from_response(&body).map_err(|detail| {
            FetchError::InvalidResponseShape {
                endpoint: job.endpoint.to_string(),
                detail,
            }
        })?;
        Ok(meta.found)
    }

    /// Download and persist every page of `job`. Returns the written files in page order.
    pub fn fetch_all(&self, job: &FetchJob) -> Result<Vec<PathBuf>, FetchError> {
        if job.page_size == 0 {
            return Err(FetchError::InvalidConfiguration(format!(
                "page size for {} must be positive",
                job.endpoint
            )));
        }

        let found = self.probe(job)?;
        let pages = page_count(found, job.page_size);
        log::info!(
            "{} [{}]: {} records, {} page(s) of {}",
            job.endpoint,
            job.label,
            found,
            pages,
            job.page_size
        );

        let mut written = Vec::new();
        // Page indices travel as u32.
        let last = u32::try_from(pages).map_err(|_| {
            FetchError::InvalidConfiguration(format!(
                "{pages} pages needed for {}; raise the page size",
                job.endpoint
            ))
        })?;
        for page in 1..=last {
            let query = job.filter.merged(
                &QueryFilter::new()
                    .with("page", page)
                    .with("limit", job.page_size),
            );
            let body = self
                .remote
                .get_json(job.endpoint, &query, self.bulk_timeout)
                .map_err(|source| FetchError::RemoteFetchFailed {
                    endpoint: job.endpoint.to_string(),
                    stage: Stage::Page(page),
                    source,
                })?;
            let path = storage::save_json(&self.output_dir, &job.page_file_name(page), &body)?;
            log::info!("{} page {}/{} -> {}", job.endpoint, page, last, path.display());
            written.push(path);
        }
        Ok(written)
    }
}
