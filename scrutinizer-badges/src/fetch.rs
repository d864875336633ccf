// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Retrieval of raw repository reports.
//!
//! The badge pipeline depends only on [`ReportSource`]. [`HttpReportSource`]
//! is the production implementation talking to the Scrutinizer API.

use std::{future::Future, time::Duration};

use reqwest::{Client, StatusCode, header::ACCEPT};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::ServiceConfig,
    error::Error,
    retry::{RetryConfig, retry_with_backoff},
    route::Vcs,
};

/// Provider of raw report documents for a repository.
pub trait ReportSource
{
    /// Fetches the report document for `slug` hosted on `vcs`.
    fn fetch(&self, vcs: Vcs, slug: &str,) -> impl Future<Output = Result<Value, Error,>,> + Send;
}

/// Report source backed by the Scrutinizer HTTP API.
#[derive(Debug, Clone,)]
pub struct HttpReportSource
{
    client:   Client,
    base_url: String,
    retry:    RetryConfig,
}

impl HttpReportSource
{
    /// Builds a source from validated service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the HTTP client cannot be
    /// initialised.
    pub fn new(config: &ServiceConfig,) -> Result<Self, Error,>
    {
        let client = Client::builder()
            .user_agent(config.user_agent.clone(),)
            .timeout(Duration::from_secs(config.timeout_secs,),)
            .build()
            .map_err(|source| Error::Transport {
                url: config.base_url.clone(),
                source,
            },)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/',).to_owned(),
            retry: config.retry.clone(),
        },)
    }

    /// URL of the report for `slug` on `vcs`.
    ///
    /// Each slug segment is percent-encoded; the slashes between segments
    /// are kept.
    pub fn report_url(&self, vcs: Vcs, slug: &str,) -> String
    {
        let encoded = slug
            .split('/',)
            .map(|segment| urlencoding::encode(segment,).into_owned(),)
            .collect::<Vec<_,>>()
            .join("/",);
        format!("{}/{}/{}", self.base_url, vcs.code(), encoded)
    }

    async fn fetch_once(&self, url: &str,) -> Result<Value, Error,>
    {
        let transport = |source| Error::Transport {
            url: url.to_owned(),
            source,
        };

        let response = self
            .client
            .get(url,)
            .header(ACCEPT, "application/json",)
            .send()
            .await
            .map_err(transport,)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, url, "upstream rejected report request");
            return Err(Error::Upstream {
                status:  status.as_u16(),
                message: upstream_message(status,),
            },);
        }

        let body = response.bytes().await.map_err(transport,)?;
        serde_json::from_slice(&body,).map_err(|source| Error::Decode {
            source,
        },)
    }
}

impl ReportSource for HttpReportSource
{
    async fn fetch(&self, vcs: Vcs, slug: &str,) -> Result<Value, Error,>
    {
        let url = self.report_url(vcs, slug,);
        let url = url.as_str();
        info!("Fetching report {}", url);

        retry_with_backoff(&self.retry, url, move || self.fetch_once(url,),).await
    }
}

fn upstream_message(status: StatusCode,) -> String
{
    match status {
        StatusCode::UNAUTHORIZED => "not authorized to access project".to_owned(),
        StatusCode::NOT_FOUND => "project not found".to_owned(),
        other if other.is_server_error() => "inaccessible".to_owned(),
        other => format!("unexpected status {}", other.as_u16()),
    }
}
