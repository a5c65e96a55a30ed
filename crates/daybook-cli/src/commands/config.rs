use std::path::Path;

use daybook_core::config::ClientConfig;
use daybook_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ConfigReport {
    pub path: String,
    pub api_base_url: Option<String>,
    pub access_token: Option<&'static str>,
    pub page_size: u32,
    pub list_max_age_secs: u64,
    pub recent_max_age_secs: u64,
    pub request_timeout_secs: u64,
}

/// Settings given to `config init`; `None` keeps the stored value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub page_size: Option<u32>,
    pub list_max_age_secs: Option<u64>,
    pub recent_max_age_secs: Option<u64>,
}

pub fn run_config(
    command: ConfigCommands,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show { json } => {
            let report = config_report(config, config_path);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in format_config_lines(&report) {
                    println!("{line}");
                }
            }
        }
        ConfigCommands::Path => println!("{}", config_path.display()),
        ConfigCommands::Init {
            api_url,
            token,
            page_size,
            list_max_age_secs,
            recent_max_age_secs,
        } => {
            let update = ConfigUpdate {
                api_base_url: api_url,
                access_token: token,
                page_size,
                list_max_age_secs,
                recent_max_age_secs,
            };
            write_config(config_path, update)?;
            println!("Configuration saved to {}", config_path.display());
        }
    }
    Ok(())
}

/// Merge `update` into the stored file (not the environment overlay) and
/// write it back.
pub fn write_config(config_path: &Path, update: ConfigUpdate) -> Result<ClientConfig, CliError> {
    let mut stored = ClientConfig::load_from_path(config_path)?;
    if let Some(url) = normalize_text_option(update.api_base_url) {
        stored.api_base_url = Some(url);
    }
    if let Some(token) = normalize_text_option(update.access_token) {
        stored.access_token = Some(token);
    }
    if let Some(page_size) = update.page_size {
        stored.page_size = page_size;
    }
    if let Some(secs) = update.list_max_age_secs {
        stored.list_max_age_secs = secs;
    }
    if let Some(secs) = update.recent_max_age_secs {
        stored.recent_max_age_secs = secs;
    }
    stored.validate()?;
    stored.save_to_path(config_path)?;
    tracing::debug!("Wrote configuration to {}", config_path.display());
    Ok(stored)
}

pub fn config_report(config: &ClientConfig, config_path: &Path) -> ConfigReport {
    ConfigReport {
        path: config_path.display().to_string(),
        api_base_url: config.api_base_url.clone(),
        access_token: config.access_token.as_ref().map(|_| "[REDACTED]"),
        page_size: config.page_size,
        list_max_age_secs: config.list_max_age_secs,
        recent_max_age_secs: config.recent_max_age_secs,
        request_timeout_secs: config.request_timeout_secs,
    }
}

pub fn format_config_lines(report: &ConfigReport) -> Vec<String> {
    vec![
        format!("config file:     {}", report.path),
        format!(
            "api base url:    {}",
            report.api_base_url.as_deref().unwrap_or("(not set)")
        ),
        format!(
            "access token:    {}",
            report.access_token.unwrap_or("(not set)")
        ),
        format!("page size:       {}", report.page_size),
        format!("list max age:    {}s", report.list_max_age_secs),
        format!("recent max age:  {}s", report.recent_max_age_secs),
        format!("request timeout: {}s", report.request_timeout_secs),
    ]
}
