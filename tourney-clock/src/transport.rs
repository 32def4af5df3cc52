// HTTP transport to the clock server.
//
// The engine only sees the `Transport` trait so tests can substitute an
// in-memory fake. `HttpTransport` is the reqwest implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::protocol::{CommandRequest, ContentBatch, ListenRequest, Snapshot};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const LISTEN_PATH: &str = "/api/tournament-listen";
const CONTENT_PATH: &str = "/api/footerPlugs";
const COMMAND_PATH: &str = "/api/keyboard-control";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("gave up after {after_ms}ms")]
    TimedOut { after_ms: u64 },
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Request/response contract with the server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hold a change-notification request open until the server has a newer
    /// snapshot (`Some`) or gives up waiting (`None`).
    async fn listen(&self, request: ListenRequest) -> Result<Option<Snapshot>, TransportError>;

    /// Fetch a batch of footer texts.
    async fn fetch_content(&self, id: i64) -> Result<ContentBatch, TransportError>;

    /// Send a command. Any resulting state change arrives via `listen`.
    async fn send_command(&self, request: CommandRequest) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        HttpTransport {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server.base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn listen(&self, request: ListenRequest) -> Result<Option<Snapshot>, TransportError> {
        let url = self.url(LISTEN_PATH);
        debug!(version = request.version, "opening long poll");
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.clone(),
                source,
            })?;

        if is_no_change(response.status()) {
            return Ok(None);
        }
        let response = check_status(&url, response)?;
        let snapshot = response
            .json::<Snapshot>()
            .await
            .map_err(|source| TransportError::Http { url, source })?;
        Ok(Some(snapshot))
    }

    async fn fetch_content(&self, id: i64) -> Result<ContentBatch, TransportError> {
        let url = self.url(&format!("{CONTENT_PATH}/{id}"));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.clone(),
                source,
            })?;
        let response = check_status(&url, response)?;
        response
            .json::<ContentBatch>()
            .await
            .map_err(|source| TransportError::Http { url, source })
    }

    async fn send_command(&self, request: CommandRequest) -> Result<(), TransportError> {
        let url = self.url(COMMAND_PATH);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.clone(),
                source,
            })?;
        check_status(&url, response)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Statuses the server uses to say "nothing new before my own timeout".
pub(crate) fn is_no_change(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT
    )
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a local port and return the
    /// base URL plus a handle yielding the raw request text.
    async fn one_shot_server(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn no_change_statuses() {
        assert!(is_no_change(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_no_change(StatusCode::REQUEST_TIMEOUT));
        assert!(is_no_change(StatusCode::NO_CONTENT));
        assert!(!is_no_change(StatusCode::OK));
        assert!(!is_no_change(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let t = HttpTransport::new("http://clock.local/");
        assert_eq!(t.url(LISTEN_PATH), "http://clock.local/api/tournament-listen");
    }

    #[tokio::test]
    async fn listen_gateway_timeout_means_no_change() {
        let (base, server) = one_shot_server(concat!(
            "HTTP/1.1 504 Gateway Timeout\r\n",
            "Content-Length: 0\r\n",
            "Connection: close\r\n",
            "\r\n",
        ))
        .await;

        let transport = HttpTransport::new(base);
        let result = transport
            .listen(ListenRequest {
                tournament_id: 3,
                version: 12,
                protocol_version: 13,
            })
            .await
            .unwrap();
        assert!(result.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/tournament-listen"));
    }

    #[tokio::test]
    async fn fetch_content_decodes_batch() {
        let (base, server) = one_shot_server(concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 51\r\n",
            "Connection: close\r\n",
            "\r\n",
            "{\"FooterPlugsID\":4,\"TextPlugs\":[\"SHUFFLE UP\",\"GL\"]}",
        ))
        .await;

        let transport = HttpTransport::new(base);
        let batch = transport.fetch_content(4).await.unwrap();
        assert_eq!(batch.id, 4);
        assert_eq!(batch.text_plugs, vec!["SHUFFLE UP", "GL"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/footerPlugs/4"));
    }

    #[tokio::test]
    async fn command_error_status_is_reported() {
        let (base, _server) = one_shot_server(concat!(
            "HTTP/1.1 401 Unauthorized\r\n",
            "Content-Length: 0\r\n",
            "Connection: close\r\n",
            "\r\n",
        ))
        .await;

        let transport = HttpTransport::new(base);
        let err = transport
            .send_command(CommandRequest {
                event: crate::protocol::Command::SkipLevel,
                tournament_id: 1,
                shift: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 401, .. }));
    }
}
