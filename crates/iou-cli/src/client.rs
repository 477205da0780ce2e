//! Thin HTTP client for the node API.

use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Which node and party a command talks to.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:10007")]
    pub endpoint: String,

    /// Organisation name of the hosted party to act as.
    #[arg(short, long)]
    pub party: String,
}

impl Target {
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.party,
            path
        )
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Reply to a mutating command.
#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    pub message: String,
    #[serde(default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub linear_id: Option<String>,
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    match resp.json::<ErrorResponse>().await {
        Ok(err) => anyhow::bail!("{} (HTTP {})", err.error, status),
        Err(_) => anyhow::bail!("request failed (HTTP {})", status),
    }
}

fn unreachable_hint(target: &Target, e: reqwest::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "could not reach node at {}: {}\nIs the node running? Start it with: iou-node",
        target.endpoint,
        e
    )
}

pub async fn get<T: DeserializeOwned>(target: &Target, path: &str) -> anyhow::Result<T> {
    let resp = reqwest::get(target.url(path))
        .await
        .map_err(|e| unreachable_hint(target, e))?;
    decode(resp).await
}

pub async fn post<B: Serialize>(target: &Target, path: &str, body: &B) -> anyhow::Result<CommandResponse> {
    let resp = reqwest::Client::new()
        .post(target.url(path))
        .json(body)
        .send()
        .await
        .map_err(|e| unreachable_hint(target, e))?;
    decode(resp).await
}

pub fn print_response(resp: &CommandResponse) {
    println!("{}", resp.message);
    if let Some(tx_id) = &resp.tx_id {
        println!("  Tx:       {}", tx_id);
    }
    if let Some(linear_id) = &resp.linear_id {
        println!("  IOU id:   {}", linear_id);
    }
}
