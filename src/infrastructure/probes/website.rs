//! Website URL timings probe.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::{Cardinality, Datatype, Message, MessageDescription};
use crate::domain::models::status::Status;
use crate::domain::models::subject::{Subject, SubjectKind, WebUrl, Website};
use crate::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};

/// Fetches every configured URL and records its response time.
pub struct UrlsProbe {
    client: reqwest::Client,
}

impl UrlsProbe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Milliseconds to a successful response, or a description of the failure.
    async fn fetch(&self, site: &Website, url: &WebUrl) -> Result<u64, String> {
        let mut request = self.client.get(&url.url);
        let user = url.http_user.as_ref().or(site.http_user.as_ref());
        if let Some(user) = user {
            let password = url.http_password.as_ref().or(site.http_password.as_ref());
            request = request.basic_auth(user, password);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| e.to_string())?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status();
        debug!(url = %url.url, status = status.as_u16(), elapsed_ms, "Fetched");
        if status.is_success() {
            Ok(elapsed_ms)
        } else {
            Err(format!("HTTP {status}"))
        }
    }
}

impl Default for UrlsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeAction for UrlsProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let site = subject
            .as_website()
            .with_context(|| format!("{} is not a website", subject.id()))?;
        if site.urls.is_empty() {
            return Ok(Measurement::not_applicable());
        }
        if context.simulate {
            return Ok(Measurement::good());
        }

        let mut result = Measurement::good();
        for url in &site.urls {
            let key = url.label.as_deref().unwrap_or(&url.url);
            match self.fetch(site, url).await {
                Ok(ms) => {
                    let ms = i64::try_from(ms).unwrap_or(i64::MAX);
                    result.add_message(Message::value("url", ms).with_parameter(key));
                }
                Err(e) => {
                    result.add_message(Message::error("url", e).with_parameter(key));
                    if url.required {
                        result.status = Status::Failed;
                    }
                }
            }
        }
        Ok(result)
    }
}

pub fn urls_probe() -> Probe {
    Probe::new(
        ProbeMeta::new(
            "urls",
            "URL timings",
            "Measure the response, server code and response time for each URL",
            SubjectKind::Website,
        )
        .with_message(
            MessageDescription::new("url", "Response time", "Time to a successful response", Datatype::Integer)
                .with_unit("ms")
                .with_cardinality(Cardinality::Keyed),
        ),
        Arc::new(UrlsProbe::new()),
    )
}
