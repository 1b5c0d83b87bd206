//! # fwdlink-fetch: Page Fetch Collaborator
//!
//! The verification pipeline never talks to the network directly. It is
//! handed a [`PageFetcher`], constructed once by the caller and shared via
//! `Arc` across concurrent fetches.
//!
//! - [`HttpPageFetcher`]: `reqwest` client with a per-request timeout,
//!   bounded body size, and exponential-backoff retry on connection
//!   failures only.
//! - `MemoryFetcher`: canned responses keyed by URL, for tests. Built
//!   only with the `test-util` feature.
//!
//! ## Response Classification
//!
//! Fetchers return the raw `(status, content_type, body)` triple.
//! [`FetchedPage::into_text()`] is the single place where a non-2xx status
//! or a non-text content type becomes a [`FetchError`].

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod retry;

pub use config::{FetchConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_USER_AGENT};
pub use error::FetchError;
pub use fetcher::{FetchedPage, PageFetcher};
pub use http::HttpPageFetcher;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MemoryFetcher, MockPage};
