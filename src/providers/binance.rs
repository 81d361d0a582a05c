//! Binance Web3 Wallet adapter
//!
//! Forwards the uniform provider operations to the `binancew3w.bitcoin`
//! object and translates network and signing vocabulary between the two
//! sides. The only non-forwarding logic is availability probing and the
//! reshaping of signed PSBTs.

use super::{
    ProviderAction, ProviderType, SignMessageOptions, SignMessageProtocol, SignPsbtOptions,
    SignedPsbt, WalletProvider, BIP322_SIMPLE,
};
use crate::config::{Config, Network};
use crate::psbt;
use crate::state::WalletStore;
use crate::wallet::{
    AvailabilityWatcher, BinanceBitcoinApi, BinanceSignPsbtOptions, Detector, EventReceiver,
    WalletEnvironment, WalletEvent,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const WALLET_NAME: &str = "Binance";
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(250);

/// Network names understood by the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinanceNetwork {
    Mainnet,
    Testnet,
}

impl BinanceNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinanceNetwork::Mainnet => "livenet",
            BinanceNetwork::Testnet => "testnet",
        }
    }
}

/// Map a library network onto the extension's vocabulary
///
/// The extension only distinguishes mainnet from test networks.
pub fn get_binance_network(network: Network) -> BinanceNetwork {
    match network {
        Network::Mainnet | Network::FractalMainnet => BinanceNetwork::Mainnet,
        Network::Testnet | Network::Testnet4 | Network::Signet | Network::FractalTestnet => {
            BinanceNetwork::Testnet
        }
    }
}

/// Map a network name reported by the extension back to a library network
pub fn get_network_for_binance(network: &str) -> Network {
    match network.trim().to_lowercase().as_str() {
        "livenet" | "mainnet" | "bitcoin" => Network::Mainnet,
        "testnet" => Network::Testnet,
        other => {
            tracing::warn!(network = %other, "Unknown Binance network, assuming mainnet");
            Network::Mainnet
        }
    }
}

/// Translate a signing protocol to the name the extension expects
fn binance_protocol(protocol: Option<SignMessageProtocol>) -> Option<&'static str> {
    protocol.map(|protocol| match protocol {
        SignMessageProtocol::Bip322 => BIP322_SIMPLE,
        other => other.as_str(),
    })
}

pub struct BinanceProvider {
    env: Arc<dyn WalletEnvironment>,
    store: WalletStore,
    probe_interval: Duration,
    watcher: Mutex<Option<AvailabilityWatcher>>,
}

impl BinanceProvider {
    pub fn new(env: Arc<dyn WalletEnvironment>, store: WalletStore) -> Self {
        Self {
            env,
            store,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            watcher: Mutex::new(None),
        }
    }

    /// Build a provider using the configured probe interval
    pub fn from_config(
        env: Arc<dyn WalletEnvironment>,
        store: WalletStore,
        config: &Config,
    ) -> Self {
        Self::new(env, store).with_probe_interval(config.probe_interval())
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// The injected object, or `ProviderNotInstalled` when it is missing
    fn library(&self) -> Result<Arc<dyn BinanceBitcoinApi>> {
        self.env
            .binance()
            .ok_or_else(|| Error::ProviderNotInstalled(WALLET_NAME.to_string()))
    }

    fn watcher_slot(&self) -> MutexGuard<'_, Option<AvailabilityWatcher>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the wallet can be used in this environment right now
    pub fn is_available(&self) -> bool {
        self.env.binance().is_some() || self.env.is_mobile()
    }

    async fn handle_network_changed(&self, network: &str) -> Result<ProviderAction> {
        let found = get_network_for_binance(network);
        if self.store.network().await != found {
            if let Err(e) = self.switch_network(found).await {
                tracing::warn!(
                    network = %found,
                    error = %e,
                    "Network switch after networkChanged failed"
                );
            }
        }
        Ok(ProviderAction::Reconnect(ProviderType::Binance))
    }

    async fn handle_accounts_changed(&self, accounts: Vec<String>) -> Result<ProviderAction> {
        let Some(first) = accounts.first().cloned() else {
            return Ok(ProviderAction::Disconnect);
        };

        if self.store.first_account().await.as_deref() == Some(first.as_str()) {
            return Ok(ProviderAction::None);
        }

        self.store.update(|state| state.accounts = accounts).await;
        Ok(ProviderAction::Reconnect(ProviderType::Binance))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WalletProvider for BinanceProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Binance
    }

    fn initialize(&self) {
        let env = self.env.clone();
        let detect: Detector = Arc::new(move || env.binance().is_some() || env.is_mobile());

        let watcher = AvailabilityWatcher::spawn(
            detect,
            self.store.clone(),
            ProviderType::Binance,
            self.probe_interval,
        );

        let mut slot = self.watcher_slot();
        if let Some(previous) = slot.take() {
            previous.stop();
        }
        *slot = watcher;
    }

    fn dispose(&self) {
        if let Some(watcher) = self.watcher_slot().take() {
            watcher.stop();
        }
    }

    async fn connect(&self, _provider: ProviderType) -> Result<()> {
        let library = self.library()?;
        library
            .switch_network(BinanceNetwork::Mainnet.as_str())
            .await?;

        let accounts = library.request_accounts().await?;
        if accounts.is_empty() {
            return Err(Error::NoAccounts);
        }

        let public_key = library
            .get_public_key()
            .await?
            .filter(|key| !key.is_empty())
            .ok_or(Error::NoPublicKey)?;

        tracing::info!(
            address = %accounts[0],
            accounts = accounts.len(),
            "Connected to Binance wallet"
        );
        self.store.record_connection(accounts, public_key).await;
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        self.library()?.request_accounts().await
    }

    async fn get_network(&self) -> Result<Network> {
        Ok(self.store.network().await)
    }

    async fn switch_network(&self, network: Network) -> Result<()> {
        let wanted = get_binance_network(network);
        self.library()?.switch_chain(wanted.as_str()).await?;
        self.store.set_network(network).await;
        tracing::debug!(network = %network, binance_network = wanted.as_str(), "Switched network");
        Ok(())
    }

    async fn get_public_key(&self) -> Result<Option<String>> {
        self.library()?.get_public_key().await
    }

    async fn get_balance(&self) -> Result<u64> {
        let balance = self.library()?.get_balance().await?;
        Ok(balance.total)
    }

    async fn send_btc(&self, _to: &str, _amount: u64) -> Result<String> {
        Err(Error::NotImplemented("send_btc".to_string()))
    }

    async fn sign_message(&self, message: &str, options: SignMessageOptions) -> Result<String> {
        let protocol = binance_protocol(options.protocol);
        self.library()?.sign_message(message, protocol).await
    }

    async fn sign_psbt(&self, options: SignPsbtOptions) -> Result<SignedPsbt> {
        let library = self.library()?;
        let should_broadcast = options.should_broadcast();

        let signed_hex = library
            .sign_psbt(
                &options.psbt_hex,
                BinanceSignPsbtOptions {
                    auto_finalized: options.finalize,
                    to_sign_inputs: options.inputs_to_sign,
                },
            )
            .await?;

        let encoded = psbt::reencode_hex(&signed_hex)?;

        let tx_id = if should_broadcast {
            Some(self.push_psbt(&signed_hex).await?)
        } else {
            None
        };

        Ok(SignedPsbt {
            signed_psbt_hex: encoded.hex,
            signed_psbt_base64: encoded.base64,
            tx_id,
        })
    }

    async fn push_psbt(&self, psbt_hex: &str) -> Result<String> {
        let tx_id = self.library()?.push_psbt(psbt_hex).await?;
        tracing::info!(tx_id = %tx_id, "Pushed PSBT");
        Ok(tx_id)
    }

    fn add_listeners(&self) -> Result<EventReceiver> {
        self.library()?.subscribe()
    }

    async fn handle_event(&self, event: WalletEvent) -> Result<ProviderAction> {
        tracing::debug!(event = event.event_name(), "Binance wallet event");
        match event {
            WalletEvent::NetworkChanged(network) => self.handle_network_changed(&network).await,
            WalletEvent::AccountsChanged(accounts) => self.handle_accounts_changed(accounts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InputToSign;
    use crate::psbt::fixtures;
    use crate::wallet::mock::{MockBinanceWallet, MockEnvironment};
    use crate::wallet::BinanceBalance;

    const ADDRESS: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";
    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn provider_with(wallet: Arc<MockBinanceWallet>) -> (BinanceProvider, WalletStore) {
        let store = WalletStore::default();
        let provider = BinanceProvider::new(MockEnvironment::with_wallet(wallet), store.clone());
        (provider, store)
    }

    #[tokio::test]
    async fn test_connect_without_extension_fails() {
        let provider = BinanceProvider::new(MockEnvironment::empty(), WalletStore::default());
        let err = provider.connect(ProviderType::Binance).await.unwrap_err();
        assert!(matches!(err, Error::ProviderNotInstalled(_)));
        assert_eq!(err.to_string(), "Binance isn't installed");
    }

    #[tokio::test]
    async fn test_connect_with_zero_accounts_fails() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        wallet.accounts.lock().unwrap().clear();
        let (provider, store) = provider_with(wallet);

        let err = provider.connect(ProviderType::Binance).await.unwrap_err();
        assert!(matches!(err, Error::NoAccounts));
        assert!(store.snapshot().await.address.is_empty());
    }

    #[tokio::test]
    async fn test_connect_without_public_key_fails() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        *wallet.public_key.lock().unwrap() = Some(String::new());
        let (provider, _store) = provider_with(wallet);

        let err = provider.connect(ProviderType::Binance).await.unwrap_err();
        assert!(matches!(err, Error::NoPublicKey));
    }

    #[tokio::test]
    async fn test_connect_populates_store() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, store) = provider_with(wallet.clone());

        provider.connect(ProviderType::Binance).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.accounts, vec![ADDRESS.to_string()]);
        assert_eq!(state.address, ADDRESS);
        assert_eq!(state.payment_address, ADDRESS);
        assert_eq!(state.public_key, PUBKEY);
        assert_eq!(state.payment_public_key, PUBKEY);
        assert_eq!(wallet.calls()[0], "switchNetwork:livenet");
    }

    #[tokio::test]
    async fn test_switch_network_translates_and_records() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, store) = provider_with(wallet.clone());

        provider.switch_network(Network::Signet).await.unwrap();

        assert!(wallet.called("switchChain:testnet"));
        assert_eq!(store.network().await, Network::Signet);
        assert_eq!(provider.get_network().await.unwrap(), Network::Signet);
    }

    #[tokio::test]
    async fn test_get_balance_returns_total() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        *wallet.balance.lock().unwrap() = BinanceBalance {
            confirmed: 1_000,
            unconfirmed: 500,
            total: 1_500,
        };
        let (provider, _store) = provider_with(wallet);

        assert_eq!(provider.get_balance().await.unwrap(), 1_500);
    }

    #[tokio::test]
    async fn test_send_btc_is_not_implemented() {
        let (provider, _store) = provider_with(MockBinanceWallet::with_account(ADDRESS, PUBKEY));
        let err = provider.send_btc(ADDRESS, 1_000).await.unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_sign_message_translates_bip322() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, _store) = provider_with(wallet.clone());

        let signature = provider
            .sign_message(
                "hello",
                SignMessageOptions {
                    protocol: Some(SignMessageProtocol::Bip322),
                    to_sign_address: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(signature, "sig(hello)");
        assert_eq!(
            wallet.last_message_protocol.lock().unwrap().as_deref(),
            Some("bip322-simple")
        );

        provider
            .sign_message("hello", SignMessageOptions::default())
            .await
            .unwrap();
        assert_eq!(*wallet.last_message_protocol.lock().unwrap(), None);

        provider
            .sign_message(
                "hello",
                SignMessageOptions {
                    protocol: Some(SignMessageProtocol::Ecdsa),
                    to_sign_address: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            wallet.last_message_protocol.lock().unwrap().as_deref(),
            Some("ecdsa")
        );
    }

    #[tokio::test]
    async fn test_sign_message_propagates_wallet_error() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        *wallet.sign_message_error.lock().unwrap() = Some("User rejected".to_string());
        let (provider, _store) = provider_with(wallet);

        let err = provider
            .sign_message("hello", SignMessageOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Wallet error: User rejected");
    }

    #[tokio::test]
    async fn test_sign_psbt_without_broadcast() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let signed = fixtures::unsigned_psbt_hex(2_000);
        *wallet.signed_psbt.lock().unwrap() = Some(signed.clone());
        let (provider, _store) = provider_with(wallet.clone());

        let input = InputToSign {
            index: 0,
            address: Some(ADDRESS.to_string()),
            public_key: None,
            sighash_types: None,
            disable_tweak_signer: None,
        };
        let result = provider
            .sign_psbt(
                SignPsbtOptions::new(fixtures::unsigned_psbt_hex(1_000))
                    .broadcast(true)
                    .inputs_to_sign(vec![input.clone()]),
            )
            .await
            .unwrap();

        assert_eq!(result.signed_psbt_hex, signed);
        assert_eq!(result.signed_psbt_base64, psbt::reencode_hex(&signed).unwrap().base64);
        assert_eq!(result.tx_id, None);
        assert!(!wallet.called("pushPsbt"));

        let options = wallet.last_sign_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.auto_finalized, None);
        assert_eq!(options.to_sign_inputs, Some(vec![input]));
    }

    #[tokio::test]
    async fn test_sign_psbt_finalize_and_broadcast_pushes() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, _store) = provider_with(wallet.clone());

        let result = provider
            .sign_psbt(
                SignPsbtOptions::new(fixtures::unsigned_psbt_hex(1_000))
                    .finalize(true)
                    .broadcast(true),
            )
            .await
            .unwrap();

        assert_eq!(result.tx_id, Some("f".repeat(64)));
        assert!(wallet.called("pushPsbt"));
        let options = wallet.last_sign_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.auto_finalized, Some(true));
    }

    #[tokio::test]
    async fn test_sign_psbt_rejects_garbage_response() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        *wallet.signed_psbt.lock().unwrap() = Some("not-hex".to_string());
        let (provider, _store) = provider_with(wallet.clone());

        let err = provider
            .sign_psbt(
                SignPsbtOptions::new(fixtures::unsigned_psbt_hex(1_000))
                    .finalize(true)
                    .broadcast(true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Psbt(_)));
        assert!(!wallet.called("pushPsbt"));
    }

    #[tokio::test]
    async fn test_pass_throughs_require_extension() {
        let provider = BinanceProvider::new(MockEnvironment::empty(), WalletStore::default());

        assert!(matches!(
            provider.request_accounts().await,
            Err(Error::ProviderNotInstalled(_))
        ));
        assert!(matches!(
            provider.get_balance().await,
            Err(Error::ProviderNotInstalled(_))
        ));
        assert!(matches!(
            provider.switch_network(Network::Testnet).await,
            Err(Error::ProviderNotInstalled(_))
        ));
        assert!(matches!(
            provider.add_listeners(),
            Err(Error::ProviderNotInstalled(_))
        ));
    }

    #[tokio::test]
    async fn test_accounts_changed_to_empty_disconnects() {
        let (provider, _store) = provider_with(MockBinanceWallet::with_account(ADDRESS, PUBKEY));
        let action = provider
            .handle_event(WalletEvent::AccountsChanged(vec![]))
            .await
            .unwrap();
        assert_eq!(action, ProviderAction::Disconnect);
    }

    #[tokio::test]
    async fn test_accounts_changed_same_first_account_is_ignored() {
        let (provider, store) = provider_with(MockBinanceWallet::with_account(ADDRESS, PUBKEY));
        provider.connect(ProviderType::Binance).await.unwrap();

        let action = provider
            .handle_event(WalletEvent::AccountsChanged(vec![ADDRESS.to_string()]))
            .await
            .unwrap();
        assert_eq!(action, ProviderAction::None);
        assert_eq!(store.snapshot().await.accounts, vec![ADDRESS.to_string()]);
    }

    #[tokio::test]
    async fn test_accounts_changed_new_account_reconnects() {
        let (provider, store) = provider_with(MockBinanceWallet::with_account(ADDRESS, PUBKEY));
        provider.connect(ProviderType::Binance).await.unwrap();

        let other = "bc1qother".to_string();
        let action = provider
            .handle_event(WalletEvent::AccountsChanged(vec![other.clone()]))
            .await
            .unwrap();
        assert_eq!(action, ProviderAction::Reconnect(ProviderType::Binance));
        assert_eq!(store.snapshot().await.accounts, vec![other]);
    }

    #[tokio::test]
    async fn test_network_changed_to_other_network_switches() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, store) = provider_with(wallet.clone());

        let action = provider
            .handle_event(WalletEvent::NetworkChanged("testnet".to_string()))
            .await
            .unwrap();

        assert_eq!(action, ProviderAction::Reconnect(ProviderType::Binance));
        assert!(wallet.called("switchChain:testnet"));
        assert_eq!(store.network().await, Network::Testnet);
    }

    #[tokio::test]
    async fn test_network_changed_to_same_network_only_reconnects() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        let (provider, _store) = provider_with(wallet.clone());

        let action = provider
            .handle_event(WalletEvent::NetworkChanged("livenet".to_string()))
            .await
            .unwrap();

        assert_eq!(action, ProviderAction::Reconnect(ProviderType::Binance));
        assert!(!wallet.called("switchChain"));
    }

    #[tokio::test]
    async fn test_network_changed_still_reconnects_when_switch_fails() {
        let wallet = MockBinanceWallet::with_account(ADDRESS, PUBKEY);
        *wallet.switch_chain_error.lock().unwrap() = Some("switchChain rejected".to_string());
        let (provider, store) = provider_with(wallet.clone());

        let action = provider
            .handle_event(WalletEvent::NetworkChanged("testnet".to_string()))
            .await
            .unwrap();

        assert_eq!(action, ProviderAction::Reconnect(ProviderType::Binance));
        assert!(wallet.called("switchChain:testnet"));
        assert_eq!(store.network().await, Network::Mainnet);
    }

    #[test]
    fn test_from_config_applies_probe_interval() {
        let config = Config {
            probe_interval_ms: 40,
            ..Config::default()
        };
        let provider =
            BinanceProvider::from_config(MockEnvironment::empty(), WalletStore::default(), &config);
        assert_eq!(provider.probe_interval, Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_initialize_recovers_poisoned_watcher_slot() {
        let store = WalletStore::default();
        let provider = BinanceProvider::new(MockEnvironment::empty(), store)
            .with_probe_interval(Duration::from_millis(5));

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _slot = provider.watcher.lock().unwrap();
            panic!("poison the watcher slot");
        }));
        assert!(poisoned.is_err());
        assert!(provider.watcher.is_poisoned());

        provider.initialize();
        assert!(provider.watcher_slot().is_some());

        provider.dispose();
        assert!(provider.watcher_slot().is_none());
    }

    #[tokio::test]
    async fn test_initialize_flags_provider_when_wallet_injected_later() {
        let env = MockEnvironment::empty();
        let store = WalletStore::default();
        let provider = BinanceProvider::new(env.clone(), store.clone())
            .with_probe_interval(Duration::from_millis(5));

        provider.initialize();
        assert!(!provider.is_available());

        env.install(MockBinanceWallet::with_account(ADDRESS, PUBKEY));
        tokio::time::timeout(Duration::from_secs(2), async {
            while !store.has_provider(ProviderType::Binance).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("wallet detected");

        provider.dispose();
    }

    #[tokio::test]
    async fn test_mobile_environment_counts_as_available() {
        let env = MockEnvironment::empty();
        env.set_mobile(true);
        let store = WalletStore::default();
        let provider = BinanceProvider::new(env, store.clone())
            .with_probe_interval(Duration::from_millis(5));

        assert!(provider.is_available());
        provider.initialize();
        tokio::time::timeout(Duration::from_secs(2), async {
            while !store.has_provider(ProviderType::Binance).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("mobile detected");
    }

    #[test]
    fn test_network_translation() {
        assert_eq!(get_binance_network(Network::Mainnet), BinanceNetwork::Mainnet);
        assert_eq!(get_binance_network(Network::Testnet4), BinanceNetwork::Testnet);
        assert_eq!(get_network_for_binance("livenet"), Network::Mainnet);
        assert_eq!(get_network_for_binance("TESTNET"), Network::Testnet);
        assert_eq!(get_network_for_binance("regtest"), Network::Mainnet);
    }
}
