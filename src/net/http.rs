//! Authenticated HTTP pipeline in front of `reqwest`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every REST call goes through [`ApiClient`]. On the way out it attaches the
//! session's bearer token; on the way back it classifies failures into
//! [`ApiError`]. A 401 clears the session and asks the router to show the
//! login route before the error reaches the caller. The login endpoint is
//! the exception: its 401 rejects the credentials and leaves the current
//! session alone.
//!
//! There is no retry anywhere in this module; one call is one request.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::messages::Locale;
use crate::routes::Redirect;
use crate::state::session::SessionStore;

use super::api::LOGIN_ENDPOINT;
use super::download::BinaryResponse;
use super::error::{ApiError, ErrorBody};

const ACCEPT_JSON: &str = "application/json, application/octet-stream";
const ACCEPT_BINARY: &str = "application/octet-stream";

/// How a response body is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Binary,
}

impl ResponseKind {
    fn accept(self) -> HeaderValue {
        match self {
            Self::Json => HeaderValue::from_static(ACCEPT_JSON),
            Self::Binary => HeaderValue::from_static(ACCEPT_BINARY),
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<SessionStore>,
    redirect: Arc<dyn Redirect>,
}

impl ApiClient {
    /// Build a client bound to `session` and `redirect`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionStore>,
        redirect: Arc<dyn Redirect>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config, session, redirect })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // =========================================================================
    // JSON
    // =========================================================================

    /// `GET path`, decoding the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path);
        self.send_json(&Method::GET, path, builder).await
    }

    /// `GET path?query`, decoding the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, path).query(query);
        self.send_json(&Method::GET, path, builder).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send_json(&Method::POST, path, builder).await
    }

    /// `POST path` without a body.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path);
        self.send_json(&Method::POST, path, builder).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        self.send_json(&Method::PUT, path, builder).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::DELETE, path);
        self.send_json(&Method::DELETE, path, builder).await
    }

    /// `POST path` with a multipart form, decoding the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] for any failure.
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).multipart(form);
        self.send_json(&Method::POST, path, builder).await
    }

    // =========================================================================
    // BINARY
    // =========================================================================

    /// `GET path` as a download. The response is returned with its headers
    /// so the caller can pick a filename.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`]; error bodies are decoded from the
    /// blob when they hold JSON.
    pub async fn download(&self, path: &str) -> Result<BinaryResponse, ApiError> {
        let builder = self.request(Method::GET, path);
        let response = self.execute(&Method::GET, path, builder, ResponseKind::Binary).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = read_body(&Method::GET, path, response).await?;
        Ok(BinaryResponse { status, headers, body })
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, path, builder, ResponseKind::Json).await?;
        let body = read_body(method, path, response).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(%method, path, error = %e, "response body did not match expected shape");
            ApiError::Decode(e.to_string())
        })
    }

    /// Attach auth, send, and classify. Returns the response only for 2xx.
    async fn execute(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
        kind: ResponseKind,
    ) -> Result<Response, ApiError> {
        let builder = self.authorize(builder).header(ACCEPT, kind.accept());
        tracing::debug!(%method, path, ?kind, "sending request");

        let response = builder.send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "request failed without a response");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(%method, path, status = status.as_u16(), error = %e, "failed to read error body");
                Vec::new()
            }
        };
        let body = ErrorBody::decode(bytes);
        Err(self.classify(method, path, status.as_u16(), body))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn classify(&self, method: &Method, path: &str, status: u16, body: ErrorBody) -> ApiError {
        match status {
            401 if path == LOGIN_ENDPOINT => {
                tracing::warn!(%method, path, server_message = body.message(), "credentials rejected");
                ApiError::RequestFailed { status, body }
            }
            401 => {
                let cleared = self.session.logout();
                tracing::warn!(%method, path, cleared, "unauthorized response; session expired");
                self.redirect.redirect_to_login();
                ApiError::SessionExpired
            }
            403 => {
                tracing::warn!(%method, path, server_message = body.message(), "forbidden");
                ApiError::Forbidden { body }
            }
            _ => {
                tracing::warn!(%method, path, status, server_message = body.message(), "request failed");
                ApiError::RequestFailed { status, body }
            }
        }
    }
}

async fn read_body(method: &Method, path: &str, response: Response) -> Result<Vec<u8>, ApiError> {
    response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
        tracing::error!(%method, path, error = %e, "failed to read response body");
        ApiError::Network(e.to_string())
    })
}
