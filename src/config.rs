use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

const DEFAULT_CONFIG_PATH: &str = ".taskdeck/config.toml";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TOKEN_ENV: &str = "TASKDECK_TOKEN";
const DEFAULT_USER_ENV: &str = "TASKDECK_USER_ID";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub token_env: Option<String>,
    pub user_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token_env: String,
    pub user_env: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load config: explicit `--config` must exist; the default path is
    /// optional and missing means defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config {
            Some(ref path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Ok(merge(file_config, cli))
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref url) = config.api_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::ConfigValidation(format!(
                "api_url must start with http:// or https://: {url}"
            )));
        }
    }
    if let Some(timeout) = config.timeout_secs
        && timeout == 0
    {
        return Err(Error::ConfigValidation(
            "timeout_secs must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    let api_url = cli
        .api_url
        .clone()
        .or(file.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    Config {
        // Trailing slash would double up against the leading-slash paths.
        api_url: api_url.trim_end_matches('/').to_string(),
        token_env: cli
            .token_env
            .clone()
            .or(file.token_env)
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        user_env: cli
            .user_env
            .clone()
            .or(file.user_env)
            .unwrap_or_else(|| DEFAULT_USER_ENV.to_string()),
        timeout_secs: file.timeout_secs.unwrap_or(30),
    }
}
