//! Badge service: fetches the rendered badge image and writes it to disk.

use crate::domain::{BadgeSpec, CoverageValue};
use crate::error::{BadgeError, BadgeResult};
use std::path::Path;

/// Downloads badges from a shields-style badge service
#[derive(Debug, Clone)]
pub struct BadgeService {
    client: reqwest::Client,
    endpoint: String,
}

impl BadgeService {
    /// Create a badge service for the given base URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Base URL of the badge service
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of the badge for a coverage value
    pub fn badge_url(&self, spec: &BadgeSpec, coverage: CoverageValue) -> String {
        spec.url(&self.endpoint, coverage)
    }

    /// Fetch the badge image and write it to `path`. No retries.
    pub async fn download(
        &self,
        spec: &BadgeSpec,
        coverage: CoverageValue,
        path: &Path,
    ) -> BadgeResult<()> {
        let url = self.badge_url(spec, coverage);
        tracing::debug!("Fetching badge from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BadgeError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BadgeError::Status { url, status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| BadgeError::Request {
                url: url.clone(),
                source,
            })?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| BadgeError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!("Wrote {} byte badge to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BadgeStyle;
    use tempfile::TempDir;

    #[test]
    fn test_badge_url_uses_endpoint() {
        let service = BadgeService::new("https://img.shields.io/badge");
        let spec = BadgeSpec::new("Go", BadgeStyle::FlatSquare);

        assert_eq!(
            service.badge_url(&spec, CoverageValue::new(100.0)),
            "https://img.shields.io/badge/Go-100%25-brightgreen.png?style=flat-square"
        );
    }

    #[tokio::test]
    async fn test_download_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("coverage_badge.png");
        // Port 9 on loopback is the discard port; nothing should be listening
        let service = BadgeService::new("http://127.0.0.1:9/badge");
        let spec = BadgeSpec::new("Go", BadgeStyle::Flat);

        let err = service
            .download(&spec, CoverageValue::new(50.0), &path)
            .await
            .unwrap_err();

        assert!(matches!(err, BadgeError::Request { .. }));
        assert!(!path.exists());
    }
}
