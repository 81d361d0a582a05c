//! Uniform wallet-provider interface
//!
//! Every wallet adapter implements [`WalletProvider`]. Adapters never hold a
//! reference back to the client that owns them; event handlers instead return
//! a [`ProviderAction`] which the client applies.

pub mod binance;

pub use binance::{get_binance_network, get_network_for_binance, BinanceNetwork, BinanceProvider};

use crate::config::Network;
use crate::wallet::{EventReceiver, WalletEvent};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ECDSA: &str = "ecdsa";
pub const BIP322: &str = "bip322";
pub const BIP322_SIMPLE: &str = "bip322-simple";

/// Wallet identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Binance,
    Unisat,
    Xverse,
    Leather,
    MagicEden,
    Okx,
    Phantom,
    Wizz,
    Oyl,
    Orange,
}

impl ProviderType {
    pub const ALL: [ProviderType; 10] = [
        ProviderType::Binance,
        ProviderType::Unisat,
        ProviderType::Xverse,
        ProviderType::Leather,
        ProviderType::MagicEden,
        ProviderType::Okx,
        ProviderType::Phantom,
        ProviderType::Wizz,
        ProviderType::Oyl,
        ProviderType::Orange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::Binance => "binance",
            ProviderType::Unisat => "unisat",
            ProviderType::Xverse => "xverse",
            ProviderType::Leather => "leather",
            ProviderType::MagicEden => "magic_eden",
            ProviderType::Okx => "okx",
            ProviderType::Phantom => "phantom",
            ProviderType::Wizz => "wizz",
            ProviderType::Oyl => "oyl",
            ProviderType::Orange => "orange",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ProviderType::ALL
            .into_iter()
            .find(|provider| provider.name() == normalized)
            .ok_or_else(|| Error::UnsupportedProvider(s.to_string()))
    }
}

/// Message signing protocol requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMessageProtocol {
    Ecdsa,
    Bip322,
}

impl SignMessageProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignMessageProtocol::Ecdsa => ECDSA,
            SignMessageProtocol::Bip322 => BIP322,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageOptions {
    #[serde(default)]
    pub protocol: Option<SignMessageProtocol>,
    #[serde(default)]
    pub to_sign_address: Option<String>,
}

/// A PSBT input the wallet is asked to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputToSign {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sighash_types: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_tweak_signer: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPsbtOptions {
    pub psbt_hex: String,
    /// Ask the wallet to finalize inputs after signing
    #[serde(default)]
    pub finalize: Option<bool>,
    /// Push the finalized transaction (only honoured together with `finalize`)
    #[serde(default)]
    pub broadcast: Option<bool>,
    #[serde(default)]
    pub inputs_to_sign: Option<Vec<InputToSign>>,
}

impl SignPsbtOptions {
    pub fn new(psbt_hex: impl Into<String>) -> Self {
        Self {
            psbt_hex: psbt_hex.into(),
            ..Self::default()
        }
    }

    pub fn finalize(mut self, finalize: bool) -> Self {
        self.finalize = Some(finalize);
        self
    }

    pub fn broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    pub fn inputs_to_sign(mut self, inputs: Vec<InputToSign>) -> Self {
        self.inputs_to_sign = Some(inputs);
        self
    }

    pub fn should_broadcast(&self) -> bool {
        self.finalize.unwrap_or(false) && self.broadcast.unwrap_or(false)
    }
}

/// Result of a PSBT signing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPsbt {
    pub signed_psbt_hex: String,
    pub signed_psbt_base64: String,
    pub tx_id: Option<String>,
}

/// Follow-up requested by a provider after handling a wallet event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAction {
    None,
    Reconnect(ProviderType),
    Disconnect,
}

/// Trait implemented by every wallet adapter
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WalletProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Start watching for the wallet to become available
    fn initialize(&self);

    /// Stop any background work started by `initialize`
    fn dispose(&self);

    async fn connect(&self, provider: ProviderType) -> Result<()>;

    async fn request_accounts(&self) -> Result<Vec<String>>;

    async fn get_network(&self) -> Result<Network>;

    async fn switch_network(&self, network: Network) -> Result<()>;

    async fn get_public_key(&self) -> Result<Option<String>>;

    /// Total balance in satoshis
    async fn get_balance(&self) -> Result<u64>;

    async fn send_btc(&self, to: &str, amount: u64) -> Result<String>;

    async fn sign_message(&self, message: &str, options: SignMessageOptions) -> Result<String>;

    async fn sign_psbt(&self, options: SignPsbtOptions) -> Result<SignedPsbt>;

    /// Broadcast a finalized PSBT, returning the transaction id
    async fn push_psbt(&self, psbt_hex: &str) -> Result<String>;

    /// Subscribe to the wallet's account/network notifications
    fn add_listeners(&self) -> Result<EventReceiver>;

    async fn handle_event(&self, event: WalletEvent) -> Result<ProviderAction>;
}
