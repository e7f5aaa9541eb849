use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use onboard_core::{
    DeviceCredential, DeviceKeyType, DeviceKeys, DeviceSigner, LoadedCredential, RendezvousBlob,
    RendezvousDirective, SecretBytes,
};
use url::Url;

use crate::protocol::{
    OnboardingProtocol, ProtocolError, TransferConfig, Transport, TransportError,
    TransportFactory, TransportReply,
};

pub(crate) fn url(raw: &str) -> Url {
    Url::parse(raw).expect("test url")
}

struct NullSigner;

impl DeviceSigner for NullSigner {
    fn key_type(&self) -> DeviceKeyType {
        DeviceKeyType::Ec384
    }

    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, String> {
        Ok(vec![0; 8])
    }
}

pub(crate) fn sample_keys() -> DeviceKeys {
    DeviceKeys {
        hmac_sha256: SecretBytes::new(vec![1; 32]),
        hmac_sha384: SecretBytes::new(vec![2; 48]),
        signer: Arc::new(NullSigner),
    }
}

pub(crate) fn sample_credential(rendezvous: Vec<RendezvousDirective>) -> DeviceCredential {
    DeviceCredential {
        guid: "0b5cc2ae-71a3-4b52-8a9b-6f3e0a1e9b10".to_string(),
        device_info: "test-device".to_string(),
        rendezvous,
        owner_key_hash: vec![7; 48],
    }
}

pub(crate) fn loaded(rendezvous: Vec<RendezvousDirective>) -> LoadedCredential {
    LoadedCredential::new(sample_credential(rendezvous), sample_keys())
}

struct StubTransport {
    url: Url,
}

#[async_trait]
impl Transport for StubTransport {
    fn base_url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, message_type: u8, _body: Vec<u8>) -> Result<TransportReply, TransportError> {
        Ok(TransportReply {
            message_type,
            body: Vec::new(),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingTransports {
    pub(crate) connected: Mutex<Vec<(Url, bool)>>,
    refused: BTreeSet<String>,
}

impl RecordingTransports {
    pub(crate) fn refusing(urls: &[&str]) -> Self {
        Self {
            connected: Mutex::new(Vec::new()),
            refused: urls.iter().map(|raw| url(raw).to_string()).collect(),
        }
    }

    pub(crate) fn connected_urls(&self) -> Vec<String> {
        self.connected
            .lock()
            .expect("connected lock")
            .iter()
            .map(|(url, _)| url.to_string())
            .collect()
    }
}

impl TransportFactory for RecordingTransports {
    fn connect(&self, url: &Url, insecure_tls: bool) -> Result<Box<dyn Transport>, TransportError> {
        self.connected
            .lock()
            .expect("connected lock")
            .push((url.clone(), insecure_tls));
        if self.refused.contains(url.as_str()) {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        Ok(Box::new(StubTransport { url: url.clone() }))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Script<T> {
    Succeed(T),
    Fail(String),
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Rendezvous(String),
    Transfer {
        url: String,
        had_blob: bool,
        modules: Vec<&'static str>,
    },
}

/// Protocol double answering per base URL; unscripted URLs fail.
#[derive(Default)]
pub(crate) struct ScriptedProtocol {
    rendezvous: HashMap<String, Script<RendezvousBlob>>,
    transfer: HashMap<String, Script<Option<DeviceCredential>>>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl ScriptedProtocol {
    pub(crate) fn on_rendezvous(mut self, raw: &str, script: Script<RendezvousBlob>) -> Self {
        self.rendezvous.insert(url(raw).to_string(), script);
        self
    }

    pub(crate) fn on_transfer(mut self, raw: &str, script: Script<Option<DeviceCredential>>) -> Self {
        self.transfer.insert(url(raw).to_string(), script);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn transfer_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Transfer { url, .. } => Some(url),
                Call::Rendezvous(_) => None,
            })
            .collect()
    }

    pub(crate) fn rendezvous_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Rendezvous(url) => Some(url),
                Call::Transfer { .. } => None,
            })
            .collect()
    }
}

async fn play<T: Clone>(script: Option<&Script<T>>) -> Result<T, ProtocolError> {
    match script {
        Some(Script::Succeed(value)) => Ok(value.clone()),
        Some(Script::Fail(message)) => Err(ProtocolError::Rejected(message.clone())),
        Some(Script::Hang) => std::future::pending().await,
        None => Err(ProtocolError::Rejected("unreachable".to_string())),
    }
}

#[async_trait]
impl OnboardingProtocol for ScriptedProtocol {
    async fn rendezvous(
        &self,
        transport: &dyn Transport,
        _credential: &DeviceCredential,
        _keys: &DeviceKeys,
    ) -> Result<RendezvousBlob, ProtocolError> {
        let key = transport.base_url().to_string();
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Rendezvous(key.clone()));
        play(self.rendezvous.get(&key)).await
    }

    async fn transfer(
        &self,
        transport: &dyn Transport,
        rendezvous: Option<&RendezvousBlob>,
        config: TransferConfig,
    ) -> Result<Option<DeviceCredential>, ProtocolError> {
        let key = transport.base_url().to_string();
        self.calls.lock().expect("calls lock").push(Call::Transfer {
            url: key.clone(),
            had_blob: rendezvous.is_some(),
            modules: config.capabilities.names(),
        });
        play(self.transfer.get(&key)).await
    }
}
