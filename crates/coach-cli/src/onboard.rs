//! `coach onboard` — initialize configuration and data directories.
//!
//! - Creates `~/.coach/config.json` with defaults
//! - Creates `~/.coach/sessions/` and `~/.coach/history/`

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use coach_core::config::{load_config, save_config, Config};
use coach_core::utils::get_data_path;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Interview Coach — Setup".cyan().bold());
    println!();

    let data_dir = get_data_path();
    let configured = initialize(&data_dir)?;

    println!();
    if configured {
        println!(
            "{}",
            "  Setup complete! Run `coach interview --role <role>` to start.".green()
        );
    } else {
        println!(
            "  {} no API key yet: add one to {} or set {}",
            "!".yellow(),
            "provider.apiKeys".bold(),
            "COACH_PROVIDER__API_KEY".bold()
        );
    }
    println!();

    Ok(())
}

/// Write the config (if missing) and create the data directories under
/// `data_dir`. Returns whether a chat credential is configured.
fn initialize(data_dir: &Path) -> Result<bool> {
    let config_path = data_dir.join("config.json");

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        save_config(&Config::default(), Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    for dir in ["sessions", "history"] {
        let path = data_dir.join(dir);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        println!("  {} {} dir at {}", "✓".green(), dir, path.display());
    }

    Ok(load_config(Some(&config_path)).provider.is_configured())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
