//! In-memory stand-ins for the injected wallet and its environment

use super::{
    BinanceBalance, BinanceBitcoinApi, BinanceSignPsbtOptions, EventReceiver, EventSender,
    WalletEnvironment, WalletEvent,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Scriptable `binancew3w.bitcoin` object that records every call
#[derive(Default)]
pub(crate) struct MockBinanceWallet {
    pub accounts: Mutex<Vec<String>>,
    pub public_key: Mutex<Option<String>>,
    pub balance: Mutex<BinanceBalance>,
    /// Hex returned by `signPsbt`; the request hex is echoed when unset
    pub signed_psbt: Mutex<Option<String>>,
    pub txid: Mutex<String>,
    /// Error message returned by `signMessage`
    pub sign_message_error: Mutex<Option<String>>,
    /// Error message returned by `switchChain`
    pub switch_chain_error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
    pub last_sign_options: Mutex<Option<BinanceSignPsbtOptions>>,
    pub last_message_protocol: Mutex<Option<String>>,
    events: Mutex<Vec<EventSender>>,
}

impl MockBinanceWallet {
    pub fn with_account(address: &str, public_key: &str) -> Arc<Self> {
        let wallet = Self::default();
        *wallet.accounts.lock().unwrap() = vec![address.to_string()];
        *wallet.public_key.lock().unwrap() = Some(public_key.to_string());
        *wallet.txid.lock().unwrap() = "f".repeat(64);
        Arc::new(wallet)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }

    /// Deliver an event to every subscriber
    pub fn emit(&self, event: WalletEvent) {
        for sender in self.events.lock().unwrap().iter() {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop all subscriptions, closing the receivers
    pub fn close_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl BinanceBitcoinApi for MockBinanceWallet {
    async fn switch_network(&self, network: &str) -> Result<()> {
        self.record(format!("switchNetwork:{}", network));
        Ok(())
    }

    async fn switch_chain(&self, chain: &str) -> Result<()> {
        self.record(format!("switchChain:{}", chain));
        if let Some(err) = self.switch_chain_error.lock().unwrap().clone() {
            return Err(Error::Wallet(err));
        }
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        self.record("requestAccounts".to_string());
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn get_public_key(&self) -> Result<Option<String>> {
        self.record("getPublicKey".to_string());
        Ok(self.public_key.lock().unwrap().clone())
    }

    async fn get_balance(&self) -> Result<BinanceBalance> {
        self.record("getBalance".to_string());
        Ok(*self.balance.lock().unwrap())
    }

    async fn sign_message(&self, message: &str, protocol: Option<&str>) -> Result<String> {
        self.record(format!("signMessage:{}", message));
        *self.last_message_protocol.lock().unwrap() = protocol.map(str::to_string);
        if let Some(err) = self.sign_message_error.lock().unwrap().clone() {
            return Err(Error::Wallet(err));
        }
        Ok(format!("sig({})", message))
    }

    async fn sign_psbt(&self, psbt_hex: &str, options: BinanceSignPsbtOptions) -> Result<String> {
        self.record("signPsbt".to_string());
        *self.last_sign_options.lock().unwrap() = Some(options);
        Ok(self
            .signed_psbt
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| psbt_hex.to_string()))
    }

    async fn push_psbt(&self, psbt_hex: &str) -> Result<String> {
        self.record(format!("pushPsbt:{}", psbt_hex.len()));
        Ok(self.txid.lock().unwrap().clone())
    }

    fn subscribe(&self) -> Result<EventReceiver> {
        self.record("on".to_string());
        let (tx, rx) = mpsc::unbounded_channel();
        self.events.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Environment whose injected wallet can be installed and removed at will
#[derive(Default)]
pub(crate) struct MockEnvironment {
    wallet: Mutex<Option<Arc<MockBinanceWallet>>>,
    mobile: AtomicBool,
}

impl MockEnvironment {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_wallet(wallet: Arc<MockBinanceWallet>) -> Arc<Self> {
        let env = Self::default();
        *env.wallet.lock().unwrap() = Some(wallet);
        Arc::new(env)
    }

    pub fn install(&self, wallet: Arc<MockBinanceWallet>) {
        *self.wallet.lock().unwrap() = Some(wallet);
    }

    pub fn set_mobile(&self, mobile: bool) {
        self.mobile.store(mobile, Ordering::SeqCst);
    }
}

impl WalletEnvironment for MockEnvironment {
    fn binance(&self) -> Option<Arc<dyn BinanceBitcoinApi>> {
        self.wallet
            .lock()
            .unwrap()
            .clone()
            .map(|wallet| wallet as Arc<dyn BinanceBitcoinApi>)
    }

    fn is_mobile(&self) -> bool {
        self.mobile.load(Ordering::SeqCst)
    }
}
