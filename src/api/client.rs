use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::TrackApi;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{GenerateRequest, HealthStatus, Track};

pub struct TrackClient {
    http_client: Client,
    base_url: Url,
}

impl TrackClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        debug!("GET {}", url);

        let response = self.http_client.get(&url).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Track API request failed ({}): {}", status, error_text);
            return Err(AppError::Api(format!("{}: {}", status, error_text)));
        }

        Ok(response.json().await?)
    }

    /// Saves the full track under `dir` and returns the written path.
    pub async fn download(&self, track: &Track, dir: &Path) -> Result<PathBuf> {
        let response = self.http_client.get(&track.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Api(format!(
                "Failed to download {}: {}",
                track.title, status
            )));
        }

        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(track.download_file_name());
        tokio::fs::write(&path, &bytes).await?;

        info!("Downloaded {} ({} bytes) to {}", track.title, bytes.len(), path.display());

        Ok(path)
    }
}

impl TrackApi for TrackClient {
    async fn get_moods(&self) -> Result<Vec<String>> {
        self.get_json("moods").await
    }

    async fn get_genres(&self) -> Result<Vec<String>> {
        self.get_json("genres").await
    }

    async fn generate_track(&self, mood: &str, genre: &str) -> Result<Track> {
        let url = self.endpoint("generate");
        let request = GenerateRequest {
            mood: mood.to_string(),
            genre: genre.to_string(),
        };

        debug!("POST {} ({} / {})", url, mood, genre);

        let response = self.http_client.post(&url).json(&request).send().await?;
        let track: Track = Self::parse(response).await?;

        info!("Generated track {} ({})", track.title, track.id);

        Ok(track)
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        self.get_json("health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> TrackClient {
        TrackClient::new(Url::parse(base).unwrap(), Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            client("http://localhost:3001/api").endpoint("moods"),
            "http://localhost:3001/api/moods"
        );
        assert_eq!(
            client("http://localhost:3001/api/").endpoint("generate"),
            "http://localhost:3001/api/generate"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client(&format!("http://127.0.0.1:{}/api", port));
        let result = client.generate_track("Happy", "Pop").await;
        assert!(matches!(result, Err(AppError::Http(_))));
    }
}
