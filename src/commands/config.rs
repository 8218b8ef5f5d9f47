// Config commands - show and initialize configuration

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{
    Config, ENV_API_URL, ENV_BOT_TOKEN, ENV_CHANNEL_ID, ENV_ENABLED, ENV_REPORT_DIR,
    ENV_WEBHOOK_URL,
};

fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("not set")
}

pub fn handle_config(config: &Config, source: Option<&Path>) -> Result<()> {
    let notify = &config.notify;

    println!("Current configuration:");
    match source {
        Some(path) => println!("  Loaded from: {}", path.display()),
        None => println!("  No configuration file loaded"),
    }
    println!();
    println!("  Enabled: {}", notify.enabled);
    println!("  Webhook URL: {}", or_unset(notify.webhook_url.as_deref()));
    println!(
        "  Bot token: {}",
        if notify.bot_token.is_some() {
            "set (hidden)"
        } else {
            "not set"
        }
    );
    println!("  Channel ID: {}", or_unset(notify.channel_id.as_deref()));
    println!("  Report directory: {}", notify.report_dir.display());
    println!("  API base: {}", notify.api_base);
    println!(
        "  Reporter active: {}",
        if notify.reporter_enabled() { "yes" } else { "no" }
    );

    println!("\n  Environment variables:");
    for key in [
        ENV_ENABLED,
        ENV_WEBHOOK_URL,
        ENV_BOT_TOKEN,
        ENV_CHANNEL_ID,
        ENV_REPORT_DIR,
        ENV_API_URL,
    ] {
        let state = if std::env::var_os(key).is_some() {
            "set"
        } else {
            "not set"
        };
        println!("    {}: {}", key, state);
    }

    print_precedence();
    Ok(())
}

pub fn handle_init_config(path: &Path) -> Result<()> {
    let toml_content = Config::default().to_toml();
    std::fs::write(path, toml_content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created: {}", path.display());
    println!("\nYou can now edit the file to customize your settings.");
    print_precedence();
    Ok(())
}

fn print_precedence() {
    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Environment variables");
    println!("  3. Configuration file");
    println!("  4. Built-in defaults (lowest)");
}
