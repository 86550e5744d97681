use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Remote Control System for IC-7100
#[derive(Debug, Clone, Parser)]
#[command(name = "rcs7100", version, about)]
pub struct Cli {
    /// The username of the client (generated when omitted)
    #[arg(long, default_value = "")]
    pub username: String,

    /// The password of the server
    #[arg(long, default_value = "")]
    pub password: String,

    /// Skip server certificate verification
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub insecure: bool,

    /// PEM encoded certificate and private key
    #[arg(long)]
    pub certificate: Option<PathBuf>,

    /// Channel to join by default
    #[arg(long, default_value = "root")]
    pub channel: String,

    /// Configuration file (extension optional)
    #[arg(long, default_value = "config")]
    pub config: String,
}
