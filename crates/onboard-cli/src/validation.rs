use std::path::Path;

use anyhow::{bail, Result};
use onboard_core::{CipherSuite, DeviceKeyType, DeviceInfo, KexSuite, SessionConfig};

use crate::onboard_args::OnboardArgs;

/// Flags after validation, ready to drive one onboarding invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOnboard {
    pub session: SessionConfig,
    pub key_type: DeviceKeyType,
    pub json: bool,
}

fn is_valid_path(path: &Path) -> bool {
    let raw = path.as_os_str();
    !raw.is_empty() && !raw.as_encoded_bytes().contains(&0)
}

fn validate_directory(flag: &str, dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = dir {
        if !is_valid_path(dir) || !dir.exists() {
            bail!("invalid {flag} directory: {}", dir.display());
        }
    }
    Ok(())
}

/// Checks every flag before any device or network access.
pub fn validate_onboard_args(args: &OnboardArgs) -> Result<ValidatedOnboard> {
    let cipher_suite = args.cipher.parse::<CipherSuite>()?;
    validate_directory("download", args.download.as_deref())?;
    let Some(key_type) = DeviceKeyType::parse(&args.key) else {
        bail!(
            "unsupported key type: {} [options: {}]",
            args.key,
            DeviceKeyType::ALL
                .iter()
                .map(|key| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };
    let kex_suite = args.kex.parse::<KexSuite>()?;
    for path in &args.upload {
        if !is_valid_path(path) {
            bail!("invalid upload path: {}", path.display());
        }
        if !path.exists() {
            bail!("file doesn't exist: {}", path.display());
        }
    }
    validate_directory("wget", args.wget_dir.as_deref())?;

    Ok(ValidatedOnboard {
        session: SessionConfig {
            cipher_suite,
            kex_suite,
            rendezvous_only: args.rv_only,
            resale: args.resale,
            insecure_tls: args.insecure_tls,
            download_dir: args.download.clone(),
            echo_commands: args.echo_commands,
            upload_paths: args.upload.clone(),
            wget_dir: args.wget_dir.clone(),
            device_info: DeviceInfo::current(),
            delay_jitter: args.delay_jitter,
        },
        key_type,
        json: args.json,
    })
}
