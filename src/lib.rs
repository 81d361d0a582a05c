//! Binance Web3 Wallet adapter
//!
//! Exposes the Bitcoin object injected by the Binance Web3 Wallet extension
//! through the uniform [`WalletProvider`] interface:
//! - Availability probing until the extension shows up
//! - Connect, network switching and balance queries
//! - Message and PSBT signing, with optional broadcast
//! - Account/network change events turned into reconnects or disconnects
//!
//! Connection state lives in a [`WalletStore`] shared by the providers and
//! the [`WalletClient`] that owns them.

pub mod client;
pub mod config;
pub mod providers;
pub mod psbt;
pub mod state;
pub mod version;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use client::WalletClient;
pub use config::{Config, Network, VersionSource};
pub use error::{Error, Result};
pub use providers::{
    BinanceNetwork, BinanceProvider, ProviderAction, ProviderType, SignMessageOptions,
    SignMessageProtocol, SignPsbtOptions, SignedPsbt, WalletProvider,
};
pub use state::{ConnectionState, WalletStore};
pub use version::fetch_package_version;
