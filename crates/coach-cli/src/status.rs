//! `coach status` — show configuration, credential pools and retry settings.
//!
//! Builds the same dispatcher a real call would, so the endpoint, proxy and
//! pools shown are the effective ones (normalized, blanks dropped).

use anyhow::{Context, Result};
use colored::Colorize;

use coach_core::config::{get_config_path, load_config, ProviderConfig};
use coach_core::types::CallPurpose;
use coach_providers::{create_dispatcher, Dispatcher, RetryPolicy};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();
    let dispatcher = create_dispatcher(&config).context("failed to build the dispatcher")?;

    println!();
    println!("{}", "Interview Coach Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!("  {:<18} {}", "Endpoint:".bold(), dispatcher.endpoint());
    println!("  {:<18} {}", "Proxy:".bold(), proxy_line(&dispatcher));
    println!(
        "  {:<18} {} | max_tokens: {} | document: {}",
        "Parameters:".bold(),
        format!("temp: {}", config.generation.temperature).dimmed(),
        config.generation.max_tokens,
        config.generation.document_max_tokens,
    );

    println!();
    println!("  {}", "Credential pools:".bold());
    for purpose in [CallPurpose::Chat, CallPurpose::Document] {
        let pool = dispatcher.pool(purpose);
        let status = if pool.is_empty() {
            format!("{}", "· not configured".dimmed())
        } else {
            format!("{} {} key(s)", "✓".green(), pool.len())
        };
        println!("    {:<20} {}", purpose.to_string(), status);
        for key in pool.masked_keys() {
            println!("      {}", key.dimmed());
        }
    }

    println!();
    println!("  {:<18} {}", "Retry:".bold(), retry_line(dispatcher.policy()));
    if let Some(hint) = setup_hint(&config.provider) {
        println!();
        println!("  {} {}", "!".yellow(), hint);
    }
    println!();

    Ok(())
}

/// What to do next when no call could succeed with this configuration.
fn setup_hint(provider: &ProviderConfig) -> Option<&'static str> {
    if provider.is_configured() {
        return None;
    }
    let has_proxy = provider
        .proxy_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    Some(if has_proxy {
        "no chat API key: only the proxy will be tried"
    } else {
        "no chat API key or proxy: set COACH_PROVIDER__API_KEY or run `coach onboard`"
    })
}

fn proxy_line(dispatcher: &Dispatcher) -> String {
    match dispatcher.proxy_url() {
        Some(url) => url.to_string(),
        None => "· disabled (direct calls only)".dimmed().to_string(),
    }
}

fn retry_line(policy: &RetryPolicy) -> String {
    format!(
        "proxy {}x / {}ms, quota {}x, network {}x / {}ms, hint margin {}ms (max hint {}ms)",
        policy.proxy_attempts,
        policy.proxy_base_delay.as_millis(),
        policy.quota_attempts,
        policy.network_attempts,
        policy.direct_base_delay.as_millis(),
        policy.hint_margin.as_millis(),
        policy.max_hint.as_millis(),
    )
}
