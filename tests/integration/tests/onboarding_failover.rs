use std::{collections::VecDeque, fs, sync::Arc, time::Duration};

use async_trait::async_trait;
use onboard_core::{
    CancellationToken, DeviceCredential, DeviceKeyType, DeviceKeys, DeviceSigner,
    LoadedCredential, RendezvousBlob, RendezvousDirective, SecretBytes, SessionConfig,
    TransferAddress, TransportProtocol,
};
use onboard_runtime::{
    HttpTransportFactory, NoChangeReason, OnboardingFailure, OnboardingOutcome,
    OnboardingProtocol, Orchestrator, ProtocolError, StaticResolver, TransferConfig, Transport,
    TransportError, TransportFactory, TransportReply,
};
use onboard_vfs::VirtualFs;
use sha2::{Digest, Sha384};
use tempfile::tempdir;
use tokio::sync::Mutex as AsyncMutex;
use url::Url;

struct NullSigner;

impl DeviceSigner for NullSigner {
    fn key_type(&self) -> DeviceKeyType {
        DeviceKeyType::Ec256
    }

    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, String> {
        Ok(vec![0; 64])
    }
}

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("test url")
}

fn loaded(rendezvous: Vec<RendezvousDirective>) -> LoadedCredential {
    LoadedCredential::new(
        DeviceCredential {
            guid: "5b7b9b1c-2f63-4c0e-a5d4-0d4f3c1e6e21".to_string(),
            device_info: "edge-gateway".to_string(),
            rendezvous,
            owner_key_hash: vec![3; 48],
        },
        DeviceKeys {
            hmac_sha256: SecretBytes::new(vec![1; 32]),
            hmac_sha384: SecretBytes::new(vec![2; 48]),
            signer: Arc::new(NullSigner),
        },
    )
}

fn owner_blob() -> RendezvousBlob {
    RendezvousBlob {
        owner_addresses: vec![
            TransferAddress::dns("owner.example", TransportProtocol::Https).with_port(8443),
            TransferAddress::ip([198, 51, 100, 7].into(), TransportProtocol::Http).with_port(8080),
        ],
        signed_payload: vec![0xd2; 32],
    }
}

struct LoopbackTransport {
    url: Url,
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn base_url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, message_type: u8, body: Vec<u8>) -> Result<TransportReply, TransportError> {
        Ok(TransportReply {
            message_type: message_type.wrapping_add(1),
            body,
        })
    }
}

struct LoopbackTransports;

impl TransportFactory for LoopbackTransports {
    fn connect(&self, url: &Url, _insecure_tls: bool) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(LoopbackTransport { url: url.clone() }))
    }
}

type TransferHook = Box<dyn Fn(&TransferConfig) + Send + Sync>;

/// Replays queued phase results in order and records every base URL it saw.
struct ScriptedProtocol {
    rendezvous: AsyncMutex<VecDeque<Result<RendezvousBlob, String>>>,
    transfer: AsyncMutex<VecDeque<Result<Option<DeviceCredential>, String>>>,
    rendezvous_requests: AsyncMutex<Vec<String>>,
    transfer_requests: AsyncMutex<Vec<String>>,
    on_transfer: Option<TransferHook>,
}

impl ScriptedProtocol {
    fn new(
        rendezvous: Vec<Result<RendezvousBlob, String>>,
        transfer: Vec<Result<Option<DeviceCredential>, String>>,
    ) -> Self {
        Self {
            rendezvous: AsyncMutex::new(VecDeque::from(rendezvous)),
            transfer: AsyncMutex::new(VecDeque::from(transfer)),
            rendezvous_requests: AsyncMutex::new(Vec::new()),
            transfer_requests: AsyncMutex::new(Vec::new()),
            on_transfer: None,
        }
    }

    fn with_transfer_hook(mut self, hook: TransferHook) -> Self {
        self.on_transfer = Some(hook);
        self
    }

    async fn rendezvous_requests(&self) -> Vec<String> {
        self.rendezvous_requests.lock().await.clone()
    }

    async fn transfer_requests(&self) -> Vec<String> {
        self.transfer_requests.lock().await.clone()
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
        self.rendezvous_requests
            .lock()
            .await
            .push(transport.base_url().to_string());
        self.rendezvous
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err("rendezvous queue exhausted".to_string()))
            .map_err(ProtocolError::Rejected)
    }

    async fn transfer(
        &self,
        transport: &dyn Transport,
        _rendezvous: Option<&RendezvousBlob>,
        config: TransferConfig,
    ) -> Result<Option<DeviceCredential>, ProtocolError> {
        self.transfer_requests
            .lock()
            .await
            .push(transport.base_url().to_string());
        if let Some(hook) = &self.on_transfer {
            hook(&config);
        }
        self.transfer
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err("transfer queue exhausted".to_string()))
            .map_err(ProtocolError::Rejected)
    }
}

fn orchestrator(session: SessionConfig, protocol: Arc<ScriptedProtocol>) -> Orchestrator {
    Orchestrator::new(
        session,
        protocol,
        Arc::new(LoopbackTransports),
        Arc::new(StaticResolver::new(["owner.example"])),
    )
    .expect("orchestrator")
}

#[tokio::test]
async fn integration_rendezvous_only_bypass_directive_attempts_no_transfer() {
    let protocol = Arc::new(ScriptedProtocol::new(Vec::new(), Vec::new()));
    let credential = loaded(vec![RendezvousDirective::bypass(vec![
        url("https://unreachable.invalid:8443"),
        url("https://owner.example:8443"),
    ])]);
    let session = SessionConfig {
        rendezvous_only: true,
        ..SessionConfig::default()
    };

    let outcome = orchestrator(session, Arc::clone(&protocol))
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(
        outcome,
        OnboardingOutcome::NoChange(NoChangeReason::RendezvousOnly { rendezvous: None })
    );
    assert!(protocol.rendezvous_requests().await.is_empty());
    assert!(protocol.transfer_requests().await.is_empty());
}

#[tokio::test]
async fn integration_rendezvous_only_reports_blob_after_failing_over() {
    let protocol = Arc::new(ScriptedProtocol::new(
        vec![Err("connection refused".to_string()), Ok(owner_blob())],
        Vec::new(),
    ));
    let credential = loaded(vec![RendezvousDirective::new(vec![
        url("https://rv-primary.example:8041"),
        url("https://rv-secondary.example:8041"),
    ])]);
    let session = SessionConfig {
        rendezvous_only: true,
        ..SessionConfig::default()
    };

    let outcome = orchestrator(session, Arc::clone(&protocol))
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(
        outcome,
        OnboardingOutcome::NoChange(NoChangeReason::RendezvousOnly {
            rendezvous: Some(owner_blob()),
        })
    );
    assert_eq!(
        protocol.rendezvous_requests().await,
        vec!["https://rv-primary.example:8041/", "https://rv-secondary.example:8041/"]
    );
    assert!(protocol.transfer_requests().await.is_empty());
}

#[tokio::test]
async fn integration_transfer_fails_over_across_bypass_and_blob_candidates() {
    let replacement = DeviceCredential {
        guid: "replacement".to_string(),
        device_info: "edge-gateway".to_string(),
        rendezvous: Vec::new(),
        owner_key_hash: vec![9; 48],
    };
    let protocol = Arc::new(ScriptedProtocol::new(
        vec![Ok(owner_blob())],
        vec![
            Err("owner offline".to_string()),
            Ok(None),
            Ok(Some(replacement.clone())),
        ],
    ));
    let credential = loaded(vec![
        RendezvousDirective::new(vec![url("https://rv.example:8041")]),
        RendezvousDirective::bypass(vec![url("https://direct-owner.example:9443")]),
    ]);

    let outcome = orchestrator(SessionConfig::default(), Arc::clone(&protocol))
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(
        protocol.transfer_requests().await,
        vec![
            "https://direct-owner.example:9443/",
            "https://owner.example:8443/",
            "http://198.51.100.7:8080/",
        ]
    );
    assert_eq!(
        outcome,
        OnboardingOutcome::CredentialUpdated {
            credential: replacement,
            owner_url: url("http://198.51.100.7:8080"),
        }
    );
}

#[tokio::test]
async fn integration_exhaustion_is_reported_as_failure_outcome() {
    let protocol = Arc::new(ScriptedProtocol::new(
        vec![Err("rv down".to_string()), Err("rv down".to_string())],
        vec![Err("owner down".to_string())],
    ));
    let credential = loaded(vec![
        RendezvousDirective::new(vec![url("https://rv-a.example:8041")]),
        RendezvousDirective::new(vec![url("https://rv-b.example:8041")]),
        RendezvousDirective::bypass(vec![url("https://direct-owner.example:9443")]),
    ]);

    let outcome = orchestrator(SessionConfig::default(), Arc::clone(&protocol))
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    assert_eq!(
        outcome,
        OnboardingOutcome::Failed(OnboardingFailure::TransferExhausted {
            attempts: 1,
            rendezvous: None,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn integration_already_cancelled_token_skips_all_network_activity() {
    let protocol = Arc::new(ScriptedProtocol::new(vec![Ok(owner_blob())], Vec::new()));
    let credential = loaded(vec![
        RendezvousDirective::new(vec![url("https://rv.example:8041")])
            .with_delay(Duration::from_secs(30)),
        RendezvousDirective::bypass(vec![url("https://direct-owner.example:9443")]),
    ]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator(SessionConfig::default(), Arc::clone(&protocol))
        .run(&credential, &cancel)
        .await;

    assert!(matches!(result, Err(onboard_core::OnboardError::Cancelled)));
    assert!(protocol.rendezvous_requests().await.is_empty());
    assert!(protocol.transfer_requests().await.is_empty());
}

#[tokio::test]
async fn integration_owner_exercises_capability_modules_during_transfer() {
    let workspace = tempdir().expect("tempdir");
    let downloads = workspace.path().join("downloads");
    let logs = workspace.path().join("logs");
    fs::create_dir_all(&downloads).expect("downloads dir");
    fs::create_dir_all(&logs).expect("logs dir");
    fs::write(logs.join("boot.log"), "boot ok").expect("boot log");

    let session = SessionConfig {
        download_dir: Some(downloads.clone()),
        echo_commands: true,
        upload_paths: vec![logs.clone()],
        ..SessionConfig::default()
    };
    let served = Arc::new(std::sync::Mutex::new(Vec::<Vec<u8>>::new()));
    let served_by_hook = Arc::clone(&served);
    let protocol = Arc::new(
        ScriptedProtocol::new(Vec::new(), vec![Ok(None)]).with_transfer_hook(Box::new(
            move |config: &TransferConfig| {
                let download = config.capabilities.download().expect("download module");
                let mut staged = download
                    .begin(
                        "../../../etc/cron.d/job",
                        Some(5),
                        Some(Sha384::digest(b"hello").to_vec()),
                    )
                    .expect("begin download");
                staged.write_chunk(b"hello").expect("chunk");
                staged.commit().expect("commit");

                let upload = config.capabilities.upload().expect("upload module");
                let logical = format!("{}/boot.log", logs_logical_name(upload.vfs()));
                let payload = upload.read(&logical).expect("upload read");
                served_by_hook
                    .lock()
                    .expect("served lock")
                    .push(payload.contents);
                assert!(upload.read("etc/passwd").is_err());
                assert!(config.capabilities.command().is_some());
                assert!(config.capabilities.wget().is_none());
            },
        )),
    );
    let credential = loaded(vec![RendezvousDirective::bypass(vec![url(
        "https://owner.example:8443",
    )])]);

    let outcome = orchestrator(session, Arc::clone(&protocol))
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    assert!(outcome.is_failure());
    assert_eq!(
        fs::read_to_string(downloads.join("job")).expect("downloaded file"),
        "hello"
    );
    assert_eq!(
        served.lock().expect("served lock").as_slice(),
        &[b"boot ok".to_vec()]
    );
}

fn logs_logical_name(vfs: &VirtualFs) -> String {
    vfs.logical_names()
        .next()
        .expect("registered upload name")
        .to_string()
}

#[tokio::test]
async fn integration_http_transport_reaches_mock_owner() {
    use httpmock::prelude::*;

    struct HelloProtocol;

    #[async_trait]
    impl OnboardingProtocol for HelloProtocol {
        async fn rendezvous(
            &self,
            _transport: &dyn Transport,
            _credential: &DeviceCredential,
            _keys: &DeviceKeys,
        ) -> Result<RendezvousBlob, ProtocolError> {
            Err(ProtocolError::Rejected("unused".to_string()))
        }

        async fn transfer(
            &self,
            transport: &dyn Transport,
            _rendezvous: Option<&RendezvousBlob>,
            config: TransferConfig,
        ) -> Result<Option<DeviceCredential>, ProtocolError> {
            let reply = transport.send(60, b"hello-device".to_vec()).await?;
            if reply.message_type != 61 {
                return Err(ProtocolError::Malformed(format!(
                    "unexpected reply type {}",
                    reply.message_type
                )));
            }
            let mut credential = config.credential;
            credential.guid = String::from_utf8_lossy(&reply.body).into_owned();
            Ok(Some(credential))
        }
    }

    let server = MockServer::start();
    let hello = server.mock(|when, then| {
        when.method(POST).path("/fdo/101/msg/60");
        then.status(200).header("Message-Type", "61").body("new-guid");
    });
    let credential = loaded(vec![RendezvousDirective::bypass(vec![
        url("http://127.0.0.1:9"),
        url(&server.base_url()),
    ])]);
    let orchestrator = Orchestrator::new(
        SessionConfig::default(),
        Arc::new(HelloProtocol),
        Arc::new(HttpTransportFactory::with_request_timeout(Duration::from_secs(5))),
        Arc::new(StaticResolver::default()),
    )
    .expect("orchestrator");

    let outcome = orchestrator
        .run(&credential, &CancellationToken::new())
        .await
        .expect("run");

    hello.assert();
    assert_eq!(
        outcome.updated_credential().map(|credential| credential.guid.as_str()),
        Some("new-guid")
    );
}
