//! Forecast API transport.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use sargassum_common::time::format_iso_date;
use sargassum_common::{ViewerError, ViewerResult};

use crate::error::{transport_error, FetchError, FetchResult};

/// Source of raw forecast response bodies.
#[async_trait]
pub trait ForecastTransport: Send + Sync {
    /// Volume series body for an EEZ, for the forecast issued on `date`.
    ///
    /// Must return [`FetchError::Cancelled`] promptly once `cancel` fires.
    async fn fetch_volume(
        &self,
        date: &DateTime<Utc>,
        eez: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<String>;

    /// Point-sample GeoJSON body for `date`.
    async fn fetch_samples(&self, date: &DateTime<Utc>) -> ViewerResult<String>;
}

/// reqwest-backed transport for the forecast API.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> ViewerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ViewerError::Config(format!("invalid API base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ViewerError::Config(format!(
                "API base URL cannot take path segments: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(transport_error)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{YYYY-MM-DD}[/segments...]`, each segment percent-encoded.
    pub fn endpoint(&self, date: &DateTime<Utc>, segments: &[&str]) -> ViewerResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ViewerError::Config(format!("unusable base URL {}", self.base_url)))?;
            path.pop_if_empty();
            path.push(&format_iso_date(date));
            path.extend(segments);
        }
        Ok(url)
    }

    pub fn volume_url(&self, date: &DateTime<Utc>, eez: &str) -> ViewerResult<Url> {
        self.endpoint(date, &["volume", eez])
    }

    pub fn samples_url(&self, date: &DateTime<Utc>) -> ViewerResult<Url> {
        self.endpoint(date, &[])
    }

    async fn get_text(&self, url: Url) -> ViewerResult<String> {
        debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(transport_error)
    }
}

#[async_trait]
impl ForecastTransport for HttpTransport {
    #[instrument(skip(self, cancel, date), fields(date = %format_iso_date(date)))]
    async fn fetch_volume(
        &self,
        date: &DateTime<Utc>,
        eez: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<String> {
        let url = self.volume_url(date, eez)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            body = self.get_text(url) => Ok(body?),
        }
    }

    #[instrument(skip(self, date), fields(date = %format_iso_date(date)))]
    async fn fetch_samples(&self, date: &DateTime<Utc>) -> ViewerResult<String> {
        let url = self.samples_url(date)?;
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_volume_url_encodes_eez_segment() {
        let date = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let t = transport("https://api.example.org/forecast");
        let url = t
            .volume_url(&date, "French Exclusive Economic Zone (Guadeloupe)")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.org/forecast/2025-05-01/volume/French%20Exclusive%20Economic%20Zone%20(Guadeloupe)"
        );
    }

    #[test]
    fn test_samples_url_with_trailing_slash() {
        let date = Utc.with_ymd_and_hms(2025, 12, 31, 12, 0, 0).unwrap();
        let t = transport("https://api.example.org/forecast/");
        assert_eq!(
            t.samples_url(&date).unwrap().as_str(),
            "https://api.example.org/forecast/2025-12-31"
        );
    }

    #[test]
    fn test_slash_in_eez_name_stays_in_one_segment() {
        let date = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let url = transport("https://api.example.org/forecast")
            .volume_url(&date, "A/B")
            .unwrap();
        assert!(url.as_str().ends_with("/volume/A%2FB"));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url", Duration::from_secs(1)),
            Err(ViewerError::Config(_))
        ));
        assert!(matches!(
            HttpTransport::new("mailto:someone@example.org", Duration::from_secs(1)),
            Err(ViewerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_volume_request_is_not_sent() {
        let date = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        // Unroutable; the biased select resolves on the token first.
        let t = transport("http://127.0.0.1:9/forecast");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = t.fetch_volume(&date, "X", &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
