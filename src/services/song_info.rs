use crate::error::{AppError, Result};
use crate::models::SongInfo;
use reqwest::{Client, StatusCode};

/// Client for the external song info API (`GET {base}/info?group=&song=`).
#[derive(Debug, Clone)]
pub struct SongInfoClient {
    base_url: String,
    client: Client,
}

impl SongInfoClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub async fn fetch_details(&self, group: &str, song: &str) -> Result<SongInfo> {
        let url = format!("{}/info", self.base_url);

        tracing::debug!("Fetching song info from {} for {} - {}", url, group, song);

        let response = self
            .client
            .get(&url)
            .query(&[("group", group), ("song", song)])
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Error making request to external API: {}", e)))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Song info API error: {} - {}", status, body);
            return Err(AppError::ExternalApi(format!(
                "External API returned status {}",
                status.as_u16()
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to read external API response: {}", e)))?;

        serde_json::from_str(&response_text).map_err(|e| {
            AppError::ExternalApi(format!("Error parsing external API response: {}", e))
        })
    }
}
