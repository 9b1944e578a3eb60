use super::resilient_http::{Credentials, DEFAULT_RETRY_AFTER, HttpCall, parse_retry_after, resilient_send};
use super::{ApiRequest, Throttler, Transport};
use crate::Result;
use core::time::Duration;
use futures::FutureExt;
use futures::future::BoxFuture;
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::Url;

const LOG_TARGET: &str = "    http";

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
}

/// Talks to the management REST API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
    throttler: Arc<Throttler>,
    request_timeout: Duration,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("telstats/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .into_app_err("creating HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            credentials: settings.username.as_ref().map(|username| Credentials {
                username: username.clone(),
                password: settings.password.clone(),
            }),
            throttler: Throttler::new(settings.max_concurrent_requests),
            request_timeout: settings.request_timeout,
        })
    }

    async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value> {
        let url = self
            .base_url
            .join(request.path().trim_start_matches('/'))
            .into_app_err_with(|| format!("building URL for '{}'", request.path()))?;

        let call = HttpCall {
            method: request.method(),
            url: url.to_string(),
            body: request.body().map(ToString::to_string),
            credentials: self.credentials.clone(),
        };

        let _permit = self.throttler.acquire().await;
        log::debug!(target: LOG_TARGET, "{} {url}", request.method());

        let response = resilient_send(&self.client, call, self.request_timeout).await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let delay = parse_retry_after(response.headers()).unwrap_or(DEFAULT_RETRY_AFTER);
            if self.throttler.pause_for(delay) {
                log::info!(target: LOG_TARGET, "Device is rate limiting requests, pausing for {}s", delay.as_secs());
            }
        }

        if !status.is_success() {
            bail!("{} {} returned HTTP {status}", request.method(), request.path());
        }

        response
            .json::<serde_json::Value>()
            .await
            .into_app_err_with(|| format!("decoding response of {} {}", request.method(), request.path()))
    }
}

impl Transport for HttpTransport {
    fn request<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<serde_json::Value>> {
        self.send(request).boxed()
    }
}
