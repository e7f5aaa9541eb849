use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::protocol::{Transport, TransportError, TransportFactory, TransportReply};

const MESSAGE_TYPE_HEADER: &str = "Message-Type";
const CBOR_CONTENT_TYPE: &str = "application/cbor";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_REPLY_BYTES: usize = 1024 * 1024;

/// Builds one reqwest client per candidate URL.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    request_timeout: Duration,
    max_reply_bytes: usize,
}

impl Default for HttpTransportFactory {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
        }
    }
}

impl HttpTransportFactory {
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..Self::default()
        }
    }

    /// Caps the body size accepted from the owner for a single reply.
    pub fn max_reply_bytes(mut self, limit: usize) -> Self {
        self.max_reply_bytes = limit;
        self
    }
}

impl TransportFactory for HttpTransportFactory {
    fn connect(&self, url: &Url, insecure_tls: bool) -> Result<Box<dyn Transport>, TransportError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        if insecure_tls {
            tracing::warn!(base_url = %url, "tls certificate verification disabled");
        }
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure_tls)
            .timeout(self.request_timeout)
            .build()?;
        Ok(Box::new(HttpTransport {
            client,
            base_url: url.clone(),
            authorization: Mutex::new(None),
            max_reply_bytes: self.max_reply_bytes,
        }))
    }
}

struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    authorization: Mutex<Option<String>>,
    max_reply_bytes: usize,
}

impl HttpTransport {
    fn message_url(&self, message_type: u8) -> Result<Url, TransportError> {
        let raw = format!(
            "{}/fdo/101/msg/{message_type}",
            self.base_url.as_str().trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|_| TransportError::InvalidUrl(raw))
    }

    fn stored_authorization(&self) -> Option<String> {
        match self.authorization.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn remember_authorization(&self, value: String) {
        let mut guard = match self.authorization.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(value);
    }

    /// Reads the reply body chunk by chunk, refusing anything over the cap.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let limit = self.max_reply_bytes;
        if response
            .content_length()
            .is_some_and(|length| length > limit as u64)
        {
            return Err(TransportError::ReplyTooLarge { limit });
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(TransportError::ReplyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, message_type: u8, body: Vec<u8>) -> Result<TransportReply, TransportError> {
        let url = self.message_url(message_type)?;
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, CBOR_CONTENT_TYPE)
            .body(body);
        if let Some(token) = self.stored_authorization() {
            request = request.header(AUTHORIZATION, token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message_type,
            });
        }
        if let Some(token) = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        {
            self.remember_authorization(token.to_string());
        }
        let reply_type = response
            .headers()
            .get(MESSAGE_TYPE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u8>().ok())
            .ok_or_else(|| {
                TransportError::MalformedReply(format!(
                    "missing or invalid {MESSAGE_TYPE_HEADER} header"
                ))
            })?;
        let body = self.read_body(response).await?;
        tracing::debug!(base_url = %self.base_url, message_type, reply_type, bytes = body.len(), "transport exchange");
        Ok(TransportReply {
            message_type: reply_type,
            body,
        })
    }
}
