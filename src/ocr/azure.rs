//! Azure Computer Vision Read API (v3.2) client.
//!
//! The Read API is asynchronous: `POST .../read/analyze` answers 202 with an
//! `Operation-Location` header, and that URL is polled until the status is
//! `succeeded` or `failed`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::provider::{
    OcrError, ReadOperation, ReadProvider, ReadStatus, RecognizedLine, RecognizedPage,
};
use super::retry::retry_on_rate_limit;
use crate::config::OcrSettings;

const ANALYZE_PATH: &str = "vision/v3.2/read/analyze";
const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadResultResponse {
    status: String,
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    read_results: Vec<PageResult>,
}

#[derive(Debug, Deserialize)]
struct PageResult {
    page: u32,
    #[serde(default)]
    lines: Vec<LineResult>,
}

#[derive(Debug, Deserialize)]
struct LineResult {
    text: String,
}

/// Read API client authenticated with a subscription key.
pub struct AzureReadClient {
    client: Client,
    analyze_url: Url,
    subscription_key: String,
}

impl AzureReadClient {
    pub fn new(settings: &OcrSettings) -> Result<Self, OcrError> {
        let endpoint = endpoint_base(&settings.endpoint)?;
        let analyze_url = endpoint
            .join(ANALYZE_PATH)
            .map_err(|e| OcrError::Permanent(format!("invalid OCR endpoint: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Permanent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            analyze_url,
            subscription_key: settings.subscription_key.clone(),
        })
    }

    /// Full URL of the analyze operation.
    pub fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }
}

#[async_trait]
impl ReadProvider for AzureReadClient {
    fn name(&self) -> &str {
        "azure-read"
    }

    async fn submit(&self, image_url: &str) -> Result<ReadOperation, OcrError> {
        let body = AnalyzeRequest { url: image_url };
        let response = retry_on_rate_limit(self.name(), || {
            self.client
                .post(self.analyze_url.clone())
                .header(SUBSCRIPTION_HEADER, &self.subscription_key)
                .json(&body)
                .send()
        })
        .await?;

        let response = check_status(response).await?;
        let location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                OcrError::InvalidResponse(format!(
                    "analyze response has no {OPERATION_LOCATION_HEADER} header"
                ))
            })?;

        debug!("azure-read: accepted {} -> {}", image_url, location);
        Ok(ReadOperation::new(location))
    }

    async fn poll(&self, operation: &ReadOperation) -> Result<ReadStatus, OcrError> {
        let response = retry_on_rate_limit(self.name(), || {
            self.client
                .get(&operation.location)
                .header(SUBSCRIPTION_HEADER, &self.subscription_key)
                .send()
        })
        .await?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| OcrError::Transient(format!("failed to read poll response: {e}")))?;

        parse_read_result(&body)
    }
}

/// Parse the endpoint and make sure relative joins land below it.
fn endpoint_base(endpoint: &str) -> Result<Url, OcrError> {
    let mut url = Url::parse(endpoint.trim())
        .map_err(|e| OcrError::Permanent(format!("invalid OCR endpoint {endpoint:?}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turn non-success statuses into errors.
async fn check_status(response: Response) -> Result<Response, OcrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// 400, 415 and 422 reject the image; 401 and 403 reject the key. Any other
/// status, including 404 on an expired operation, may clear up.
fn status_error(status: StatusCode, body: &str) -> OcrError {
    let message = format!("Azure Read API error ({status}): {body}");
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => OcrError::Permanent(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OcrError::Unauthorized(message),
        _ => OcrError::Transient(message),
    }
}

/// Interpret a poll response body.
fn parse_read_result(body: &str) -> Result<ReadStatus, OcrError> {
    let response: ReadResultResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::InvalidResponse(format!("failed to parse read result: {e}")))?;

    match response.status.as_str() {
        "notStarted" | "running" => Ok(ReadStatus::Pending),
        "failed" => Ok(ReadStatus::Failed),
        "succeeded" => {
            let pages = response
                .analyze_result
                .map(|r| r.read_results)
                .unwrap_or_default()
                .into_iter()
                .map(|p| RecognizedPage {
                    page: p.page,
                    lines: p
                        .lines
                        .into_iter()
                        .map(|l| RecognizedLine::new(l.text))
                        .collect(),
                })
                .collect();
            Ok(ReadStatus::Succeeded(pages))
        }
        other => Err(OcrError::InvalidResponse(format!(
            "unknown read status {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: &str) -> OcrSettings {
        OcrSettings {
            endpoint: endpoint.to_string(),
            subscription_key: "key".to_string(),
            ..OcrSettings::default()
        }
    }

    #[test]
    fn test_analyze_url_with_and_without_trailing_slash() {
        for endpoint in [
            "https://autoverify.cognitiveservices.azure.com",
            "https://autoverify.cognitiveservices.azure.com/",
        ] {
            let client = AzureReadClient::new(&settings(endpoint)).unwrap();
            assert_eq!(
                client.analyze_url().as_str(),
                "https://autoverify.cognitiveservices.azure.com/vision/v3.2/read/analyze"
            );
        }

        let client = AzureReadClient::new(&settings("https://proxy.local/cv")).unwrap();
        assert_eq!(
            client.analyze_url().as_str(),
            "https://proxy.local/cv/vision/v3.2/read/analyze"
        );
    }

    #[test]
    fn test_invalid_endpoint_is_permanent() {
        let err = AzureReadClient::new(&settings("not a url")).err().unwrap();
        assert!(matches!(err, OcrError::Permanent(_)));
    }

    #[test]
    fn test_pending_statuses() {
        assert_eq!(
            parse_read_result(r#"{"status":"notStarted"}"#).unwrap(),
            ReadStatus::Pending
        );
        assert_eq!(
            parse_read_result(r#"{"status":"running","createdDateTime":"2024-01-01T00:00:00Z"}"#)
                .unwrap(),
            ReadStatus::Pending
        );
    }

    #[test]
    fn test_failed_status() {
        assert_eq!(
            parse_read_result(r#"{"status":"failed"}"#).unwrap(),
            ReadStatus::Failed
        );
    }

    #[test]
    fn test_succeeded_pages_and_lines() {
        let body = r#"{
            "status": "succeeded",
            "analyzeResult": {
                "version": "3.2.0",
                "readResults": [
                    {"page": 1, "angle": 0.2, "width": 800, "height": 600, "unit": "pixel",
                     "lines": [
                        {"boundingBox": [0,0,1,1], "text": "ODO", "words": []},
                        {"boundingBox": [0,0,1,1], "text": "123456 km", "words": []}
                     ]},
                    {"page": 2, "lines": []}
                ]
            }
        }"#;

        let ReadStatus::Succeeded(pages) = parse_read_result(body).unwrap() else {
            panic!("expected succeeded status");
        };
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert_eq!(
            pages[0].lines,
            vec![RecognizedLine::new("ODO"), RecognizedLine::new("123456 km")]
        );
        assert!(pages[1].lines.is_empty());
    }

    #[test]
    fn test_succeeded_without_result_has_no_pages() {
        assert_eq!(
            parse_read_result(r#"{"status":"succeeded"}"#).unwrap(),
            ReadStatus::Succeeded(vec![])
        );
    }

    #[test]
    fn test_unexpected_bodies() {
        assert!(matches!(
            parse_read_result(r#"{"status":"exploded"}"#),
            Err(OcrError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_read_result("<html>"),
            Err(OcrError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_status_error_classification() {
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "InvalidImageUrl"),
            OcrError::Permanent(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, ""),
            OcrError::Permanent(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "InvalidImageSize"),
            OcrError::Permanent(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            OcrError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "quota"),
            OcrError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            OcrError::Transient(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            OcrError::Transient(_)
        ));
    }
}
