//! Wolfram|Alpha full-results API: text answers and plots

use super::{GraphService, QueryService, ServiceError};
use crate::state_machine::action::ImageRef;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_URL: &str = "https://api.wolframalpha.com/v2/query";

/// Plots older than this are deleted when the next one is saved. The
/// transport reads the file after the reply, so it cannot be removed at once.
const PLOT_RETENTION: Duration = Duration::from_secs(10 * 60);

pub struct WolframAlpha {
    client: Client,
    app_id: String,
    base_url: String,
    /// Downloaded plots land here as `<uuid>.jpg`
    graphs_dir: PathBuf,
    retention: Duration,
}

impl WolframAlpha {
    pub fn new(app_id: String, graphs_dir: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            app_id,
            base_url: API_URL.to_string(),
            graphs_dir: graphs_dir.into(),
            retention: PLOT_RETENTION,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<QueryResult, ServiceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("appid", self.app_id.as_str()), ("output", "json")])
            .query(params)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::network(format!("HTTP {status}: {body}")));
        }

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| ServiceError::parse(format!("Failed to parse response: {e}")))?;
        Ok(envelope.queryresult)
    }
}

fn classify_request_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ServiceError::network(format!("Connection failed: {e}"))
    } else {
        ServiceError::network(format!("Request failed: {e}"))
    }
}

/// Pod holding the plot for a given number of variables
fn plot_pod(var_count: u8) -> &'static str {
    if var_count >= 2 {
        "3DPlot"
    } else {
        "Plot"
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    queryresult: QueryResult,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pods: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    subpods: Vec<Subpod>,
}

#[derive(Debug, Deserialize)]
struct Subpod {
    plaintext: Option<String>,
    img: Option<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    src: String,
}

impl QueryResult {
    /// Plaintext of every subpod, one per line
    fn plaintext(&self) -> String {
        self.pods
            .iter()
            .flat_map(|p| &p.subpods)
            .filter_map(|s| s.plaintext.as_deref())
            .filter(|t| !t.trim().is_empty())
            .fold(String::new(), |mut acc, t| {
                acc.push_str(t);
                acc.push('\n');
                acc
            })
    }

    fn first_image(&self) -> Option<&str> {
        self.pods
            .iter()
            .flat_map(|p| &p.subpods)
            .find_map(|s| s.img.as_ref())
            .map(|i| i.src.as_str())
    }
}

#[async_trait]
impl QueryService for WolframAlpha {
    async fn ask(&self, query: &str) -> Result<String, ServiceError> {
        let result = self.get_json(&[("input", query), ("format", "plaintext")]).await?;
        if !result.success {
            return Ok(String::new());
        }
        Ok(result.plaintext())
    }
}

#[async_trait]
impl GraphService for WolframAlpha {
    async fn plot(&self, expression: &str, var_count: u8) -> Result<ImageRef, ServiceError> {
        let input = format!("plot {expression}");
        let result = self
            .get_json(&[("input", input.as_str()), ("includepodid", plot_pod(var_count)), ("format", "image")])
            .await?;
        let src = result
            .first_image()
            .ok_or_else(|| ServiceError::empty(format!("No plot for {expression:?}")))?;

        let bytes = self
            .client
            .get(src)
            .send()
            .await
            .map_err(classify_request_error)?
            .error_for_status()
            .map_err(|e| ServiceError::network(format!("Plot download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| ServiceError::network(format!("Plot download failed: {e}")))?;

        tokio::fs::create_dir_all(&self.graphs_dir).await?;
        match prune_plots(&self.graphs_dir, self.retention).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Old plots deleted"),
            Err(e) => tracing::warn!(error = %e, dir = %self.graphs_dir.display(), "Failed to prune plots"),
        }
        let path = self.graphs_dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Plot saved");
        Ok(ImageRef::File(path))
    }
}

/// Delete `.jpg` files in `dir` last modified more than `retention` ago
async fn prune_plots(dir: &Path, retention: Duration) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
            continue;
        }
        let age = entry.metadata().await?.modified()?.elapsed().unwrap_or_default();
        if age >= retention {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "queryresult": {
            "success": true,
            "pods": [
                {"title": "Input", "subpods": [{"plaintext": "d/dx(x^2)"}]},
                {"title": "Result", "subpods": [{"plaintext": "2 x"}, {"plaintext": ""}]},
                {"title": "Plot", "subpods": [{"plaintext": null, "img": {"src": "https://example.org/p.gif"}}]}
            ]
        }
    }"#;

    #[test]
    fn test_plaintext_joins_subpods() {
        let envelope: Envelope = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(envelope.queryresult.plaintext(), "d/dx(x^2)\n2 x\n");
        assert_eq!(envelope.queryresult.first_image(), Some("https://example.org/p.gif"));
    }

    #[test]
    fn test_failed_query_has_no_pods() {
        let envelope: Envelope = serde_json::from_str(r#"{"queryresult": {"success": false}}"#).unwrap();
        assert!(!envelope.queryresult.success);
        assert!(envelope.queryresult.plaintext().is_empty());
    }

    #[test]
    fn test_plot_pod_by_dimension() {
        assert_eq!(plot_pod(1), "Plot");
        assert_eq!(plot_pod(2), "3DPlot");
    }

    #[tokio::test]
    async fn test_prune_removes_only_expired_plots() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.jpg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(prune_plots(dir.path(), Duration::from_secs(3600)).await.unwrap(), 0);
        assert!(dir.path().join("old.jpg").exists());

        assert_eq!(prune_plots(dir.path(), Duration::ZERO).await.unwrap(), 1);
        assert!(!dir.path().join("old.jpg").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = WolframAlpha::new("id".into(), dir.path())
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v2/query");
        let err = svc.ask("2+2").await.unwrap_err();
        assert_eq!(err.kind, crate::services::ServiceErrorKind::Network);
    }
}
