//! CLI command execution.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::db::{doc_path, open_store};
use crate::models::{is_session_id, SessionDocument};
use crate::server::{self, Credentials};
use crate::session::provision_session;

use super::args::{Cli, Commands};

/// Response body returned by the webhook.
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(rename = "Response")]
    response: String,
}

/// Execute a parsed command line.
pub async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Provision { count } => provision(&config, count),
        Commands::Show { id } => show(&config, &id),
        Commands::Send { from, url, body } => {
            send(&config, &from, url.as_deref(), &body.join(" ")).await
        }
    }
}

async fn serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let store = open_store(&config)?;
    server::start_server(&config, store).await
}

fn provision(config: &Config, count: usize) -> Result<()> {
    let store = open_store(config)?;
    for _ in 0..count {
        let id = provision_session(store.as_ref(), &config.session.sessions_collection)
            .context("Failed to provision session")?;
        println!("{id}");
    }
    Ok(())
}

fn show(config: &Config, id: &str) -> Result<()> {
    if !is_session_id(id) {
        bail!("Session identifiers are six characters: {id}");
    }

    let store = open_store(config)?;
    let path = doc_path(&config.session.sessions_collection, id);
    let fields = store
        .get(&path)
        .with_context(|| format!("Failed to load session {id}"))?;
    // Validate before printing so corrupt documents are reported as such.
    SessionDocument::from_fields(&fields)?;

    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

async fn send(config: &Config, from: &str, url: Option<&str>, body: &str) -> Result<()> {
    if body.is_empty() {
        bail!("Message body is required for send command");
    }

    let base = url.map_or_else(|| format!("http://{}", config.bind), ToString::to_string);
    let url = format!("{}/sms", base.trim_end_matches('/'));
    debug!(url = %url, "Posting message");

    let mut request = reqwest::Client::new()
        .post(&url)
        .form(&[("From", from), ("Body", body)]);
    if let Some(creds) = config.webhook_auth.as_deref().and_then(Credentials::parse) {
        request = request.header(reqwest::header::AUTHORIZATION, creds.header_value());
    }

    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    let status = resp.status();
    let reply: WebhookResponse = resp.json().await.context("Failed to parse response")?;

    println!("{} {}", status.as_u16(), reply.response);
    if !status.is_success() {
        bail!("Server returned {status}");
    }
    Ok(())
}
