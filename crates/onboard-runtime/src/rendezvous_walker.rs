use std::{sync::Arc, time::Duration};

use onboard_core::{
    CancellationToken, DeviceCredential, DeviceKeys, RendezvousBlob, RendezvousDirective,
    MAX_DELAY_JITTER_FRACTION,
};
use rand::Rng;
use url::Url;

use crate::protocol::{OnboardingProtocol, TransportFactory};

/// Returns a sample in `[-1, 1]` used to stretch or shrink a delay.
pub type JitterFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Uniform samples from the thread-local RNG.
pub fn random_jitter_source() -> JitterFn {
    Arc::new(|| rand::thread_rng().gen_range(-1.0..=1.0))
}

/// Scales `delay` by `1 + 0.25 * sample`, clamping the sample into `[-1, 1]`.
pub fn jittered_delay(delay: Duration, sample: f64) -> Duration {
    let sample = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    delay.mul_f64(1.0 + MAX_DELAY_JITTER_FRACTION * sample)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendezvousStatus {
    Redirected { blob: RendezvousBlob, url: Url },
    /// No non-bypass directive was present.
    NotAttempted,
    Exhausted { attempts: usize },
    Cancelled,
}

/// Result of walking the directive list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendezvousWalk {
    /// Bypass URLs in directive order; always transfer candidates.
    pub bypass_urls: Vec<Url>,
    pub status: RendezvousStatus,
}

impl RendezvousWalk {
    pub fn blob(&self) -> Option<&RendezvousBlob> {
        match &self.status {
            RendezvousStatus::Redirected { blob, .. } => Some(blob),
            _ => None,
        }
    }

    pub fn into_blob(self) -> Option<RendezvousBlob> {
        match self.status {
            RendezvousStatus::Redirected { blob, .. } => Some(blob),
            _ => None,
        }
    }
}

/// Tries each rendezvous URL at most once, in directive order.
pub struct RendezvousWalker<'a> {
    protocol: &'a dyn OnboardingProtocol,
    transports: &'a dyn TransportFactory,
    insecure_tls: bool,
    jitter: Option<JitterFn>,
}

impl<'a> RendezvousWalker<'a> {
    pub fn new(
        protocol: &'a dyn OnboardingProtocol,
        transports: &'a dyn TransportFactory,
        insecure_tls: bool,
    ) -> Self {
        Self {
            protocol,
            transports,
            insecure_tls,
            jitter: None,
        }
    }

    pub fn with_jitter(mut self, jitter: Option<JitterFn>) -> Self {
        self.jitter = jitter;
        self
    }

    fn delay_for(&self, directive: &RendezvousDirective) -> Duration {
        match &self.jitter {
            Some(sample) => jittered_delay(directive.delay, sample()),
            None => directive.delay,
        }
    }

    pub async fn walk(
        &self,
        directives: &[RendezvousDirective],
        credential: &DeviceCredential,
        keys: &DeviceKeys,
        cancel: &CancellationToken,
    ) -> RendezvousWalk {
        let bypass_urls = directives
            .iter()
            .filter(|directive| directive.bypass)
            .flat_map(|directive| directive.urls.iter().cloned())
            .collect::<Vec<_>>();
        let status = self.walk_rounds(directives, credential, keys, cancel).await;
        RendezvousWalk {
            bypass_urls,
            status,
        }
    }

    async fn walk_rounds(
        &self,
        directives: &[RendezvousDirective],
        credential: &DeviceCredential,
        keys: &DeviceKeys,
        cancel: &CancellationToken,
    ) -> RendezvousStatus {
        let rounds = directives
            .iter()
            .filter(|directive| !directive.bypass)
            .collect::<Vec<_>>();
        if rounds.is_empty() {
            return RendezvousStatus::NotAttempted;
        }

        let mut attempts = 0usize;
        for (index, directive) in rounds.iter().enumerate() {
            for url in &directive.urls {
                if cancel.is_cancelled() {
                    return RendezvousStatus::Cancelled;
                }
                attempts += 1;
                let transport = match self.transports.connect(url, self.insecure_tls) {
                    Ok(transport) => transport,
                    Err(error) => {
                        tracing::error!(base_url = %url, error = %error, "rendezvous transport failed");
                        continue;
                    }
                };
                let round = self.protocol.rendezvous(transport.as_ref(), credential, keys);
                match cancel.run_until_cancelled(round).await {
                    None => return RendezvousStatus::Cancelled,
                    Some(Ok(blob)) => {
                        tracing::info!(base_url = %url, owners = blob.owner_addresses.len(), "rendezvous succeeded");
                        return RendezvousStatus::Redirected {
                            blob,
                            url: url.clone(),
                        };
                    }
                    Some(Err(error)) => {
                        tracing::error!(base_url = %url, error = %error, "rendezvous failed");
                    }
                }
            }

            let is_last = index + 1 == rounds.len();
            if is_last || directive.delay.is_zero() {
                continue;
            }
            let delay = self.delay_for(directive);
            tracing::debug!(delay_ms = delay.as_millis(), "waiting before next rendezvous directive");
            if cancel
                .run_until_cancelled(tokio::time::sleep(delay))
                .await
                .is_none()
            {
                return RendezvousStatus::Cancelled;
            }
        }

        tracing::warn!(attempts, "rendezvous directives exhausted");
        RendezvousStatus::Exhausted { attempts }
    }
}
