//! HTTP side of the remote simulation contract.

use anyhow::Context;
use async_trait::async_trait;
use lifeview_core::{Command, ExchangeError, ReportSummary, SimulationSnapshot};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;

const API_PREFIX: &str = "/api/simulation";

/// The remote simulation as seen by the client: one-way commands plus two queries.
#[async_trait]
pub trait SimulationApi: Send + Sync + 'static {
    /// Delivers `command`; any response body is ignored.
    async fn send_command(&self, command: Command) -> Result<(), ExchangeError>;

    async fn fetch_status(&self) -> Result<SimulationSnapshot, ExchangeError>;

    async fn fetch_report(&self) -> Result<ReportSummary, ExchangeError>;
}

/// [`SimulationApi`] over REST.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    initial_food: Option<u32>,
    report_games: Option<u32>,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim().to_string(),
            initial_food: config.initial_food,
            report_games: config.report_games,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, &format!("{API_PREFIX}/{endpoint}"))
    }

    fn command_query(&self, command: Command) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some((key, value)) = command.query() {
            query.push((key, value.to_string()));
        }
        if let (Command::Start, Some(food)) = (command, self.initial_food) {
            query.push(("initialFood", food.to_string()));
        }
        query
    }
}

#[async_trait]
impl SimulationApi for RestClient {
    async fn send_command(&self, command: Command) -> Result<(), ExchangeError> {
        let response = self
            .http
            .post(self.url(command.endpoint()))
            .query(&self.command_query(command))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(drop)
    }

    async fn fetch_status(&self) -> Result<SimulationSnapshot, ExchangeError> {
        let response = self
            .http
            .get(self.url("status"))
            .send()
            .await
            .map_err(transport)?;
        parse_response(response).await
    }

    async fn fetch_report(&self) -> Result<ReportSummary, ExchangeError> {
        let mut request = self.http.get(self.url("ai/summary"));
        if let Some(games) = self.report_games {
            request = request.query(&[("lastNgames", games)]);
        }
        let response = request.send().await.map_err(transport)?;
        parse_response(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ExchangeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unavailable>".to_string());
    Err(ExchangeError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn parse_response<T>(response: Response) -> Result<T, ExchangeError>
where
    T: DeserializeOwned,
{
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|err| ExchangeError::Decode(err.to_string()))
}

fn transport(err: reqwest::Error) -> ExchangeError {
    ExchangeError::Transport(err.to_string())
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
