use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// User agent presented to mirrors; several reject unknown clients.
pub const PIP_USER_AGENT: &str = "pip/24.0 (python 3.12.0)";

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Body stream returned by [`HttpClient::stream`].
pub type BodyStream<E> = BoxStream<'static, std::result::Result<Bytes, E>>;

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and map non-success statuses to errors;
/// a call that returns `Ok` always carries a 2xx body. Timeouts are applied
/// by callers.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - Scripted clients in tests
pub trait HttpClient: Send + Sync + 'static {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a GET request and return the response body as a stream.
    ///
    /// Resolves once response headers are received.
    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<BodyStream<Self::Error>, Self::Error>> + Send;

    /// GET the whole body, used for small JSON documents.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<Bytes, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Client with the pip-compatible user agent.
        pub fn new() -> reqwest::Result<Self> {
            let client = reqwest::Client::builder().user_agent(PIP_USER_AGENT).build()?;
            Ok(Self { client })
        }

        /// Wrap an already configured client.
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }

        fn request(&self, url: &str, headers: &[(String, String)]) -> reqwest::RequestBuilder {
            headers
                .iter()
                .fold(self.client.get(url), |request, (key, value)| request.header(key, value))
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<BodyStream<Self::Error>, Self::Error> {
            let response = self.request(url, headers).send().await?.error_for_status()?;
            Ok(Box::pin(response.bytes_stream()))
        }

        async fn get(&self, url: &str, headers: &[(String, String)]) -> std::result::Result<Bytes, Self::Error> {
            let response = self.request(url, headers).send().await?.error_for_status()?;
            response.bytes().await
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
