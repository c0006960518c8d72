use reqwest::{Method, RequestBuilder, Response, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::{ApiError, ErrorKind},
    session::SessionStore,
};

/// Header used to correlate a client call with the backend's logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The error body the backend sends; only `message` matters to the client.
#[derive(Deserialize)]
struct ServerErrorBody {
    message: Option<String>,
}

/// ApiGateway
///
/// The single authenticated HTTP accessor. Every call:
/// - carries the live identity's token as `Authorization: Bearer ...` (when signed in),
/// - carries a fresh `x-request-id`,
/// - comes back as `Ok(body)` or a normalized `ApiError`.
///
/// The gateway never retries, never times out and never clears the identity on a 401;
/// that decision belongs to the caller.
#[derive(Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiGateway {
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, session: SessionStore) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, body).await?;
        decode(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::PUT, path, Some(body)).await?;
        decode(response).await
    }

    /// DELETE whose response body, if any, is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// DELETE whose response body is decoded.
    pub async fn delete_with<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::DELETE, path, None::<&()>).await?;
        decode(response).await
    }

    /// execute
    ///
    /// Sends one request and returns the response if its status is a success. Network
    /// failures and non-success statuses are normalized here.
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %path,
            req_id = %request_id,
        );

        async move {
            let url = format!("{}{}", self.base_url, path);
            let mut request = self
                .http
                .request(method, url)
                .header(REQUEST_ID_HEADER, request_id.to_string());
            request = self.authorize(request);
            if let Some(body) = body {
                request = request.json(body);
            }

            let started = Instant::now();
            let response = request.send().await.map_err(|error| {
                tracing::warn!(%error, "no response");
                ApiError::network(error.to_string())
            })?;

            let status = response.status();
            tracing::debug!(
                status = status.as_u16(),
                latency_ms = started.elapsed().as_millis() as u64,
                "response"
            );

            if status.is_success() {
                return Ok(response);
            }

            let error = normalize_failure(response).await;
            tracing::warn!(status = status.as_u16(), message = %error.message, "request failed");
            Err(error)
        }
        .instrument(span)
        .await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }
}

// Prefers the server's `message` field; a body that is not JSON (or has no message) falls
// back to the generic status text.
async fn normalize_failure(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let server_message = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ServerErrorBody>(&bytes).ok())
        .and_then(|body| body.message);
    ApiError::from_status(status, server_message)
}

// An empty success body decodes as JSON `null`, so `()` and `Option<_>` targets accept it.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ApiError::network(error.to_string()))?;
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };

    serde_json::from_slice(bytes).map_err(|error| ApiError {
        kind: ErrorKind::ServerError,
        http_status: Some(status),
        message: format!("invalid response body: {error}"),
    })
}
