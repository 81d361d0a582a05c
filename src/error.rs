//! Error types for the wallet adapter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} isn't installed")]
    ProviderNotInstalled(String),

    #[error("No accounts found")]
    NoAccounts,

    #[error("No public key found")]
    NoPublicKey,

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("PSBT error: {0}")]
    Psbt(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
