use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_PORT: u16 = 3001;
pub const STORAGE_FILE_NAME: &str = "wubble-quicktune-storage.json";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GENERATE_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
    pub server_port: u16,
    pub generate_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_url = std::env::var("QUICKTUNE_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&api_url)?;

        let storage_path = match std::env::var("QUICKTUNE_STORAGE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_storage_path(),
        };

        let request_timeout = Duration::from_secs(parse_var(
            "QUICKTUNE_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        let server_port = parse_var("QUICKTUNE_PORT", DEFAULT_PORT)?;

        let generate_delay = Duration::from_millis(parse_var(
            "QUICKTUNE_GENERATE_DELAY_MS",
            DEFAULT_GENERATE_DELAY_MS,
        )?);

        Ok(Self {
            api_url,
            storage_path,
            request_timeout,
            server_port,
            generate_delay,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            storage_path: default_storage_path(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            server_port: DEFAULT_PORT,
            generate_delay: Duration::from_millis(DEFAULT_GENERATE_DELAY_MS),
        }
    }
}

/// Parses the API base URL, rejecting anything that is not http(s).
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("QUICKTUNE_API_URL is invalid: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "QUICKTUNE_API_URL must be http or https, got {}",
            other
        ))),
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quicktune")
        .join(STORAGE_FILE_NAME)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} is not a valid number: {}", name, value))),
        Err(_) => Ok(default),
    }
}
