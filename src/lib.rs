//! openaq_fetch
//!
//! A small Rust library for downloading air-quality data from the OpenAQ v2 API
//! and storing every response as canonical JSON. Pairs with the `openaq-fetch` CLI.
//!
//! ### Features
//! - Fetch the `countries`, `parameters` and `locations` resources
//! - Page through `averages` per location: probe `meta.found`, then fetch every page
//! - Write sorted-key, 4-space-indented JSON so identical input gives identical files
//!
//! ### Example
//! ```no_run
//! use openaq_fetch::{Client, Pipeline, Settings};
//!
//! let settings = Settings::from_env(Some("data/raw".into()), false);
//! let client = Client::new(settings.base_url.clone())?;
//! let summary = Pipeline::new(&settings, &client).run()?;
//! println!("{} files written", summary.files.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use api::{Client, Remote};
pub use config::Settings;
pub use error::{FetchError, Stage, TransportError};
pub use fetcher::{PaginatedFetcher, page_count};
pub use models::{Endpoint, FetchJob, PageMeta, QueryFilter, QueryValue};
pub use pipeline::{Pipeline, RunSummary};
