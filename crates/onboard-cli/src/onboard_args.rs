use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "onboard", about = "Run rendezvous and ownership transfer onboarding")]
pub struct OnboardArgs {
    #[arg(
        long,
        env = "ONBOARD_CIPHER",
        default_value = "A128GCM",
        help = "Name of cipher suite to use for encryption"
    )]
    pub cipher: String,

    #[arg(
        long,
        env = "ONBOARD_KEX",
        help = "Name of suite to use for key exchange [options: DHKEXid14, DHKEXid15, ASYMKEX2048, ASYMKEX3072, ECDH256, ECDH384]"
    )]
    pub kex: String,

    #[arg(
        long,
        env = "ONBOARD_KEY",
        help = "Key type for device credential [options: ec256, ec384, rsa2048, rsa3072]"
    )]
    pub key: String,

    #[arg(
        long = "download",
        help = "Directory to download files into (module disabled if unset)"
    )]
    pub download: Option<PathBuf>,

    #[arg(
        long = "echo-commands",
        help = "Echo all commands received to stdout (module disabled if unset)"
    )]
    pub echo_commands: bool,

    #[arg(
        long = "upload",
        value_delimiter = ',',
        help = "Directories and files to upload from; comma-separated and/or repeated (module disabled if empty)"
    )]
    pub upload: Vec<PathBuf>,

    #[arg(
        long = "wget-dir",
        help = "Directory to fetch remote files into (module disabled if unset)"
    )]
    pub wget_dir: Option<PathBuf>,

    #[arg(long = "insecure-tls", help = "Skip TLS certificate verification")]
    pub insecure_tls: bool,

    #[arg(long = "rv-only", help = "Perform rendezvous then stop")]
    pub rv_only: bool,

    #[arg(long, help = "Perform resale")]
    pub resale: bool,

    #[arg(
        long = "delay-jitter",
        help = "Apply up to +/-25% jitter to rendezvous delays"
    )]
    pub delay_jitter: bool,

    #[arg(long, help = "Print the outcome as JSON instead of text")]
    pub json: bool,

    #[arg(long, env = "ONBOARD_DEBUG", help = "Enable debug logging")]
    pub debug: bool,
}
