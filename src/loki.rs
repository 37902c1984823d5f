use crate::types::{PodRecord, TailResponse};
use crate::utils::format_latency;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};
use url::Url;

const TAIL_PATH: &str = "/loki/api/v1/tail";
const TENANT_HEADER: &str = "X-Scope-OrgID";

/// Why a probe did not confirm a pod. Every variant is retried the same way, by
/// re-discovery on the next poll; they differ only in what gets logged.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid Loki address {0:?}")]
    InvalidAddress(String),
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
    #[error("pod start time cannot be expressed in nanoseconds")]
    StartOutOfRange,
    #[error("websocket connect failed: {0}")]
    Connect(#[source] Box<WsError>),
    #[error("websocket receive failed: {0}")]
    Receive(#[source] Box<WsError>),
    #[error("malformed tail response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("connection closed before a tail response arrived")]
    Closed,
    #[error("no logs found for pod {0}")]
    NoLogs(String),
    #[error("no tail response within {0:?}")]
    Timeout(Duration),
}

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// Time between the pod starting and its first log line being observed.
    pub latency: chrono::TimeDelta,
    pub entries: usize,
}

#[async_trait]
pub trait TailProber {
    /// One tail attempt for `record`. Never loops waiting for further frames.
    async fn probe(&self, record: &PodRecord) -> Result<Confirmation, ProbeError>;
}

/// Probes Loki's websocket tail endpoint.
#[derive(Debug, Clone)]
pub struct LokiTailProber {
    query_address: String,
    websocket_address: String,
    delay_for: u64,
    timeout: Duration,
}

impl LokiTailProber {
    pub fn new(
        query_address: impl Into<String>,
        websocket_address: impl Into<String>,
        delay_for: u64,
        timeout: Duration,
    ) -> Self {
        install_crypto_provider();
        Self {
            query_address: query_address.into(),
            websocket_address: websocket_address.into(),
            delay_for,
            timeout,
        }
    }

    fn tail_request(&self, record: &PodRecord) -> Result<Request, ProbeError> {
        let url = build_tail_url(&self.websocket_address, record, self.delay_for)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|_| ProbeError::InvalidAddress(self.websocket_address.clone()))?;

        let headers = request.headers_mut();
        let tenant = HeaderValue::from_str(&record.namespace)
            .map_err(|_| ProbeError::InvalidHeader(TENANT_HEADER))?;
        headers.insert(TENANT_HEADER, tenant);
        if !self.query_address.is_empty() {
            let origin = HeaderValue::from_str(&self.query_address)
                .map_err(|_| ProbeError::InvalidHeader("Origin"))?;
            headers.insert("Origin", origin);
        }
        Ok(request)
    }
}

#[async_trait]
impl TailProber for LokiTailProber {
    async fn probe(&self, record: &PodRecord) -> Result<Confirmation, ProbeError> {
        let request = self.tail_request(record)?;
        debug!("Tailing {} for pod {}", request.uri(), record.key());

        let response = tokio::time::timeout(self.timeout, tail_once(request))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        for dropped in &response.dropped_entries {
            debug!(
                "Loki dropped entry at {} for {:?} while tailing pod {}",
                dropped.timestamp,
                dropped.labels,
                record.key()
            );
        }

        if response.streams.is_empty() {
            return Err(ProbeError::NoLogs(record.pod_name.clone()));
        }

        let latency = chrono::Utc::now().signed_duration_since(record.start_time);
        let entries = response.streams.iter().map(|s| s.values.len()).sum();
        debug!("Matched stream labels: {:?}", response.streams[0].stream);
        info!(
            "First log line for pod {} in namespace {}: (Time difference: {})",
            record.pod_name,
            record.namespace,
            format_latency(latency)
        );
        Ok(Confirmation { latency, entries })
    }
}

// kube and tokio-tungstenite share one rustls; `wss://` needs a process-wide provider
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// `<base>/loki/api/v1/tail?query={pod_name="<pod>"}&start=<ns>&delay_for=<s>`
pub fn build_tail_url(base: &str, record: &PodRecord, delay_for: u64) -> Result<Url, ProbeError> {
    let invalid = || ProbeError::InvalidAddress(base.to_string());
    let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), TAIL_PATH))
        .map_err(|_| invalid())?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid());
    }

    let start = record
        .start_time
        .timestamp_nanos_opt()
        .ok_or(ProbeError::StartOutOfRange)?;
    url.query_pairs_mut()
        .append_pair("query", &format!("{{pod_name=\"{}\"}}", record.pod_name))
        .append_pair("start", &start.to_string())
        .append_pair("delay_for", &delay_for.to_string());
    Ok(url)
}

async fn tail_once(request: Request) -> Result<TailResponse, ProbeError> {
    let (mut ws, _) = connect_async(request)
        .await
        .map_err(|e| ProbeError::Connect(Box::new(e)))?;
    let outcome = receive_response(&mut ws).await;
    if let Err(e) = ws.close(None).await {
        debug!("Error closing tail websocket: {}", e);
    }
    outcome
}

async fn receive_response(
    ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
) -> Result<TailResponse, ProbeError> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
            Some(Ok(Message::Binary(bytes))) => return Ok(serde_json::from_slice(&bytes)?),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(_))) | None => return Err(ProbeError::Closed),
            Some(Err(e)) => return Err(ProbeError::Receive(Box::new(e))),
        }
    }
}
