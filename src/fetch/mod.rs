mod basic;
mod client;
mod error;
mod request;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::RequestError;
pub use request::{Method, RequestDescriptor};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::debug;

use crate::credentials::Credential;

/// Sends `descriptor` through `client` with `credential` attached as a bearer
/// token and returns the response body.
///
/// A JSON body, when present, is sent with `Content-Type: application/json`.
/// Any non-2xx status is an error; the body is kept on the error and never
/// returned as a success value.
#[tracing::instrument(skip(client, credential, descriptor), fields(method = %descriptor.method(), url = %descriptor.url()))]
pub async fn execute<C: HttpClient + ?Sized>(
    client: &C,
    credential: &Credential,
    descriptor: &RequestDescriptor,
) -> Result<String, RequestError> {
    let url = descriptor
        .url()
        .parse()
        .map_err(|source| RequestError::InvalidUrl {
            url: descriptor.url().to_string(),
            source,
        })?;

    let mut req = reqwest::Request::new(descriptor.method().into(), url);
    req.headers_mut()
        .insert(AUTHORIZATION, bearer_header(credential)?);

    if let Some(body) = descriptor.body() {
        let bytes = serde_json::to_vec(body)?;
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(bytes.into());
    }

    let resp = client.execute(req).await?;
    let status = resp.status();
    let body = resp.text().await?;
    debug!(%status, bytes = body.len(), "Response received");

    if !status.is_success() {
        return Err(RequestError::Status { status, body });
    }
    Ok(body)
}

fn bearer_header(credential: &Credential) -> Result<HeaderValue, RequestError> {
    if credential.token().trim().is_empty() {
        return Err(RequestError::InvalidCredential("token is empty".to_string()));
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.token()))
        .map_err(|e| RequestError::InvalidCredential(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
