use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for outbound calls.
///
/// [`super::execute`] builds a fully-formed request and hands it to an
/// implementation of this trait; tests substitute a fake that records the
/// request and answers with a canned response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
