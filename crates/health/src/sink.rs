use crate::LivenessReport;
use reqwest::Client;
use std::{future::Future, time::Duration};
use thiserror::Error;

/// Bound on a single push, connection included.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum SinkError {
    /// The request could not be sent or timed out
    #[error("Health sink request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Health sink returned status {0}")]
    Status(u16),
}

/// Destination for liveness reports.
pub trait HealthSink: Send + Sync {
    fn push(&self, report: &LivenessReport) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Posts reports as JSON to a health-check URL.
pub struct HttpHealthSink {
    client: Client,
    url: String,
}

impl HttpHealthSink {
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = Client::builder().timeout(PUSH_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HealthSink for HttpHealthSink {
    async fn push(&self, report: &LivenessReport) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(report).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use alloy_primitives::Address;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    fn report() -> LivenessReport {
        LivenessReport {
            relayer_id: Address::repeat_byte(0x11),
            status: Status::Operational,
            timestamp: 1_700_000_000,
            last_source_block: 42,
            pending_transactions: 1,
        }
    }

    /// Answer a single request with `status_line` and hand back the raw request.
    async fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/health", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            // headers, then the JSON body up to its closing brace
            while !request.ends_with(b"}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response =
                format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8(request).unwrap()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // nothing listens on port 9 (discard)
        let sink = HttpHealthSink::new("http://127.0.0.1:9/health").unwrap();

        let result = sink.push(&report()).await;
        assert!(matches!(result, Err(SinkError::Request(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once("503 Service Unavailable").await;
        let sink = HttpHealthSink::new(url).unwrap();

        let result = sink.push(&report()).await;

        assert!(matches!(result, Err(SinkError::Status(503))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_report_posted_as_json() {
        let (url, server) = serve_once("200 OK").await;
        let sink = HttpHealthSink::new(url).unwrap();

        sink.push(&report()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /health HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));

        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["status"], "OPERATIONAL");
        assert_eq!(json["lastSourceBlock"], 42);
        assert_eq!(json["pendingTransactions"], 1);
    }
}
