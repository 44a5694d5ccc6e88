//! Input asset download over HTTP.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Normalize a client-supplied asset URL.
///
/// Protocol-relative URLs (`//cdn.example.com/a.jpg`) get `https:`; only
/// `http` and `https` are accepted.
pub fn normalize_asset_url(raw: &str) -> MediaResult<String> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };

    let parsed = Url::parse(&candidate).map_err(|e| MediaError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(MediaError::InvalidUrl(format!(
                "{raw}: unsupported scheme {other}"
            )))
        }
    }
    if parsed.host_str().is_none() {
        return Err(MediaError::InvalidUrl(format!("{raw}: missing host")));
    }

    Ok(parsed.to_string())
}

/// Download `url` into `dest`, returning the number of bytes written.
pub async fn download_asset(
    client: &reqwest::Client,
    url: &str,
    dest: impl AsRef<Path>,
    timeout: Duration,
) -> MediaResult<u64> {
    let dest = dest.as_ref();
    debug!(url = %url, dest = ?dest, "Downloading asset");

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                MediaError::Timeout(timeout.as_secs())
            } else {
                MediaError::download_failed(format!("{url}: {e}"))
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!("{url}: HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MediaError::download_failed(format!("{url}: {e}")))?;
    if bytes.is_empty() {
        return Err(MediaError::download_failed(format!("{url}: empty body")));
    }

    tokio::fs::write(dest, &bytes).await?;

    info!(url = %url, bytes = bytes.len(), "Downloaded asset");
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_protocol_relative_url_gets_https() {
        assert_eq!(
            normalize_asset_url("//cdn.example.com/img/a.jpg").unwrap(),
            "https://cdn.example.com/img/a.jpg"
        );
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        assert_eq!(
            normalize_asset_url(" http://example.com/a.mp3 ").unwrap(),
            "http://example.com/a.mp3"
        );
    }

    #[test]
    fn test_bad_urls_rejected() {
        assert!(matches!(normalize_asset_url("file:///etc/passwd"), Err(MediaError::InvalidUrl(_))));
        assert!(normalize_asset_url("not a url").is_err());
        assert!(normalize_asset_url("").is_err());
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.mp3");
        let written = download_asset(
            &reqwest::Client::new(),
            &format!("{}/a.mp3", server.uri()),
            &dest,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(written, 2048);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 2048);
    }

    #[tokio::test]
    async fn test_download_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = download_asset(
            &reqwest::Client::new(),
            &format!("{}/missing.jpg", server.uri()),
            dir.path().join("missing.jpg"),
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(MediaError::DownloadFailed { .. })));
    }

    #[tokio::test]
    async fn test_download_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = download_asset(
            &reqwest::Client::new(),
            &server.uri(),
            dir.path().join("x"),
            Duration::from_secs(5),
        )
        .await;

        tokio_test::assert_err!(result);
    }
}
