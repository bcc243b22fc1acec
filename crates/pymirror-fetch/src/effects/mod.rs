//! Effects layer: network and filesystem I/O behind the [`HttpClient`] seam.

pub mod fetcher;
pub mod http;
pub mod scheduler;

pub use fetcher::{Fetcher, staging_path};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use http::{BodyStream, BoxStream, HttpClient, PIP_USER_AGENT};
pub use scheduler::DownloadScheduler;
