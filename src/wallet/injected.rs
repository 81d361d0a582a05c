//! Contract of the `binancew3w.bitcoin` object
//!
//! Method names and argument shapes follow what the extension exposes; the
//! adapter in `providers::binance` is the only caller.

use crate::providers::InputToSign;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Notifications emitted by the extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    NetworkChanged(String),
}

impl WalletEvent {
    /// Name of the extension event this notification arrives on
    pub fn event_name(&self) -> &'static str {
        match self {
            WalletEvent::AccountsChanged(_) => "accountsChanged",
            WalletEvent::NetworkChanged(_) => "networkChanged",
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<WalletEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<WalletEvent>;

/// Balance as reported by the extension, in satoshis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinanceBalance {
    #[serde(default)]
    pub confirmed: u64,
    #[serde(default)]
    pub unconfirmed: u64,
    pub total: u64,
}

/// Options object passed to `signPsbt`
///
/// Absent fields are left out of the serialized object entirely so the
/// extension applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceSignPsbtOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_finalized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_sign_inputs: Option<Vec<InputToSign>>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait BinanceBitcoinApi: Send + Sync {
    async fn switch_network(&self, network: &str) -> Result<()>;

    async fn switch_chain(&self, chain: &str) -> Result<()>;

    async fn request_accounts(&self) -> Result<Vec<String>>;

    async fn get_public_key(&self) -> Result<Option<String>>;

    async fn get_balance(&self) -> Result<BinanceBalance>;

    /// `protocol` is the extension's own name (`ecdsa`, `bip322-simple`)
    async fn sign_message(&self, message: &str, protocol: Option<&str>) -> Result<String>;

    /// Returns the signed PSBT as hex
    async fn sign_psbt(&self, psbt_hex: &str, options: BinanceSignPsbtOptions) -> Result<String>;

    /// Returns the broadcast transaction id
    async fn push_psbt(&self, psbt_hex: &str) -> Result<String>;

    /// Register for `accountsChanged` / `networkChanged`
    fn subscribe(&self) -> Result<EventReceiver>;
}
