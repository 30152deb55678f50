//! HTTP client for the upstream song-info service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use songbook_api_types::SongInfoResponse;
use time::UtcOffset;
use tracing::debug;
use url::Url;

use crate::application::info::{InfoError, SongInfo, SongInfoProvider};

use super::error::InfraError;

#[derive(Clone)]
pub struct HttpSongInfoClient {
    client: reqwest::Client,
    info_url: Url,
}

impl HttpSongInfoClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, InfraError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let info_url = base
            .join("info")
            .map_err(|err| InfraError::configuration(format!("invalid info service url: {err}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build http client: {err}"))
            })?;

        Ok(Self { client, info_url })
    }

    pub fn info_url(&self) -> &Url {
        &self.info_url
    }
}

#[async_trait]
impl SongInfoProvider for HttpSongInfoClient {
    async fn lookup(&self, group_name: &str, song_name: &str) -> Result<SongInfo, InfoError> {
        let mut url = self.info_url.clone();
        url.query_pairs_mut()
            .append_pair("group_name", group_name)
            .append_pair("song_name", song_name);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| InfoError::Unreachable(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| InfoError::Unreachable(err.to_string()))?;

        if status != StatusCode::OK {
            let message = serde_json::from_str::<SongInfoResponse>(&body)
                .ok()
                .and_then(|payload| payload.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            debug!(
                target = "songbook::info_client",
                status = status.as_u16(),
                message = %message,
                "song info lookup rejected"
            );
            return Err(InfoError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let payload: SongInfoResponse =
            serde_json::from_str(&body).map_err(|err| InfoError::Decode(err.to_string()))?;

        Ok(SongInfo {
            text: payload.text,
            release_date: payload
                .release_date
                .map(|moment| moment.to_offset(UtcOffset::UTC).date()),
            link: payload.link,
        })
    }
}
