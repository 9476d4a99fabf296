//! HTTP access to the archive's per-snapshot group catalog endpoint.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_DISPOSITION;

use super::{Download, FieldSource};
use crate::config::{ArchiveConfig, Dataset, Snapshot};
use crate::error::{PipelineError, Result};
use crate::layout::Field;

/// Single-attempt archive client. No retries and no request timeout: a stalled
/// transfer blocks the run.
pub struct ArchiveClient {
    config: ArchiveConfig,
    client: Client,
}

impl ArchiveClient {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            log::warn!("no archive API key configured; requests will likely be rejected");
        }
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| PipelineError::network(&config.host, e.to_string()))?;
        Ok(Self { config, client })
    }
}

impl FieldSource for ArchiveClient {
    fn fetch(&self, dataset: Dataset, snapshot: Snapshot, field: Field) -> Result<Download> {
        let url = self.config.groupcat_url(dataset, snapshot);
        log::info!("GET {url}?Subhalo={}", field.name());

        let response = self
            .client
            .get(&url)
            .query(&[("Subhalo", field.name())])
            .header("api-key", &self.config.api_key)
            .send()
            .map_err(|e| PipelineError::network(&url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::network(&url, format!("HTTP {status}")));
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .ok_or_else(|| PipelineError::network(&url, "response has no content-disposition header"))?
            .to_str()
            .map_err(|_| PipelineError::network(&url, "content-disposition is not valid ASCII"))?
            .to_string();
        let filename = filename_from_content_disposition(&disposition).ok_or_else(|| {
            PipelineError::network(&url, format!("no usable filename in content-disposition '{disposition}'"))
        })?;

        let body = response
            .bytes()
            .map_err(|e| PipelineError::network(&url, e.to_string()))?;
        log::debug!("received {} bytes for {filename}", body.len());

        Ok(Download {
            filename,
            body: body.to_vec(),
        })
    }
}

/// Text following `filename=`, unquoted. Names that could escape the snapshot
/// directory are refused.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.to_string())
}
