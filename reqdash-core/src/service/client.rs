//! Requirements Service Client
//!
//! Talks to the requirements service over HTTP with JSON bodies.

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::models::{ReviewStatus, UploadFile};
use crate::service::responses::{
    self, AnalyzeResponse, ClassifyResponse, StatsResponse, UploadResponse,
};
use crate::service::RequirementsService;

/// Errors from a single call to the requirements service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("Response is missing `{0}`")]
    MissingField(&'static str),
}

/// HTTP implementation of [`RequirementsService`]
#[derive(Debug, Clone)]
pub struct HttpRequirementsService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRequirementsService {
    /// Create a client for the service named in `config`
    pub fn new(config: &DashboardConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, &config.service_url))
    }

    /// Create a service around an existing HTTP client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Reads the body of a response, turning non-2xx statuses into errors
    async fn read_body(response: reqwest::Response) -> Result<String, ServiceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: responses::error_message(&body),
            });
        }

        Ok(body)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(path);
        debug!("POST {} ({})", url, operation);

        let response = self.client.post(&url).json(&payload).send().await?;
        let body = Self::read_body(response).await?;
        responses::parse_response(operation, &body)
    }
}

#[async_trait]
impl RequirementsService for HttpRequirementsService {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ServiceError> {
        let url = self.endpoint("upload");
        debug!("POST {} ({}, {} bytes)", url, file.name, file.bytes.len());

        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let body = Self::read_body(response).await?;
        responses::parse_response("upload", &body)
    }

    async fn analyze(&self, filename: &str) -> Result<AnalyzeResponse, ServiceError> {
        self.post_json("analyze", "analyze", json!({ "filename": filename }))
            .await
    }

    async fn classify(&self, text: &str) -> Result<ClassifyResponse, ServiceError> {
        self.post_json("classify", "classify", json!({ "text": text }))
            .await
    }

    async fn update_status(&self, id: &str, status: ReviewStatus) -> Result<(), ServiceError> {
        let url = self.endpoint("update_status");
        debug!("POST {} ({} -> {})", url, id, status);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "id": id, "status": status.as_str() }))
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StatsResponse, ServiceError> {
        let url = self.endpoint("stats");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let body = Self::read_body(response).await?;
        responses::parse_response("stats", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// What the client put on the wire
    struct CapturedRequest {
        head: String,
        body: Vec<u8>,
    }

    impl CapturedRequest {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
            })
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }

        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Answers a single request on a local port with a canned response
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (HttpRequirementsService, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        (HttpRequirementsService::with_client(client, &base_url), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(request) = complete_request(&buf) {
                return request;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-request");
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn complete_request(buf: &[u8]) -> Option<CapturedRequest> {
        let split = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        let request = CapturedRequest {
            head: String::from_utf8_lossy(&buf[..split]).into_owned(),
            body: buf[split + 4..].to_vec(),
        };

        let complete = match request.header("content-length") {
            Some(len) => request.body.len() >= len.parse::<usize>().unwrap(),
            None if request.header("transfer-encoding") == Some("chunked") => {
                request.body.ends_with(b"0\r\n\r\n")
            }
            None => true,
        };
        complete.then_some(request)
    }

    #[test]
    fn test_endpoint_joining() {
        let service = HttpRequirementsService::with_client(
            reqwest::Client::new(),
            "http://localhost:5000/",
        );
        assert_eq!(service.base_url(), "http://localhost:5000");
        assert_eq!(service.endpoint("stats"), "http://localhost:5000/stats");
        assert_eq!(
            service.endpoint("/update_status"),
            "http://localhost:5000/update_status"
        );
    }

    #[test]
    fn test_new_from_config() {
        let config = DashboardConfig {
            service_url: "http://analysis:9000".into(),
            request_timeout_secs: 5,
            ..Default::default()
        };
        let service = HttpRequirementsService::new(&config).unwrap();
        assert_eq!(service.base_url(), "http://analysis:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let config = DashboardConfig {
            service_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let service = HttpRequirementsService::new(&config).unwrap();
        assert!(service.stats().await.is_err());
    }

    #[test]
    fn test_status_error_display() {
        let err = ServiceError::Status {
            status: 404,
            message: "File not found".into(),
        };
        assert_eq!(err.to_string(), "Service returned 404: File not found");
        assert_eq!(
            ServiceError::MissingField("filename").to_string(),
            "Response is missing `filename`"
        );
    }

    #[tokio::test]
    async fn test_update_status_accepts_any_success_status() {
        let (service, server) = serve_once("201 Created", "").await;

        service
            .update_status("42", ReviewStatus::Approved)
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert_eq!(request.request_line(), "POST /update_status HTTP/1.1");
        assert_eq!(
            request.json(),
            serde_json::json!({ "id": "42", "status": "Approved" })
        );
    }

    #[tokio::test]
    async fn test_error_status_carries_service_message() {
        let (service, server) =
            serve_once("500 Internal Server Error", r#"{"error": "boom"}"#).await;

        let err = service.analyze("reqs.txt").await.unwrap_err();
        assert!(matches!(
            &err,
            ServiceError::Status { status: 500, message } if message == "boom"
        ));
        assert_eq!(err.to_string(), "Service returned 500: boom");

        let request = server.await.unwrap();
        assert_eq!(request.request_line(), "POST /analyze HTTP/1.1");
        assert_eq!(request.json(), serde_json::json!({ "filename": "reqs.txt" }));
    }

    #[tokio::test]
    async fn test_update_status_rejection_is_an_error() {
        let (service, _server) =
            serve_once("404 Not Found", r#"{"error": "Requirement not found"}"#).await;

        let err = service
            .update_status("missing", ReviewStatus::Disapproved)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Service returned 404: Requirement not found");
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file_field() {
        let (service, server) = serve_once(
            "200 OK",
            r#"{"message": "File uploaded successfully", "filename": "reqs.txt"}"#,
        )
        .await;

        let file = UploadFile::new("reqs.txt", b"The system shall export CSV".to_vec());
        let response = service.upload(&file).await.unwrap();
        assert_eq!(response.filename(), Some("reqs.txt"));

        let request = server.await.unwrap();
        assert_eq!(request.request_line(), "POST /upload HTTP/1.1");
        assert!(request
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        let body = request.body_text();
        assert!(body.contains(r#"name="file"; filename="reqs.txt""#));
        assert!(body.contains("The system shall export CSV"));
    }

    #[tokio::test]
    async fn test_analyze_sends_filename_and_parses_records() {
        let (service, server) = serve_once(
            "200 OK",
            r#"{"requirements": [{"id": "1", "requirement": "Log errors", "categories": "Reliability", "status": "Review"}]}"#,
        )
        .await;

        let records = service.analyze("reqs.docx").await.unwrap().into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Log errors");

        let request = server.await.unwrap();
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.json(), serde_json::json!({ "filename": "reqs.docx" }));
    }

    #[tokio::test]
    async fn test_classify_sends_text() {
        let (service, server) =
            serve_once("200 OK", r#"{"category": "Security", "id": "7"}"#).await;

        let response = service.classify("Passwords must be hashed").await.unwrap();
        assert_eq!(response.categories(), "Security");
        assert_eq!(response.id.as_deref(), Some("7"));

        let request = server.await.unwrap();
        assert_eq!(request.request_line(), "POST /classify HTTP/1.1");
        assert_eq!(
            request.json(),
            serde_json::json!({ "text": "Passwords must be hashed" })
        );
    }

    #[tokio::test]
    async fn test_stats_is_a_get() {
        let (service, server) =
            serve_once("200 OK", r#"{"total": 5, "approved": 2, "inReview": 1}"#).await;

        let stats = service.stats().await.unwrap();
        assert_eq!(
            stats,
            StatsResponse {
                total: 5,
                approved: 2,
                in_review: 1
            }
        );

        let request = server.await.unwrap();
        assert_eq!(request.request_line(), "GET /stats HTTP/1.1");
        assert!(request.body.is_empty());
    }
}
