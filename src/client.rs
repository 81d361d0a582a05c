//! Wallet client
//!
//! Owns the connection store and the registered providers. Providers report
//! follow-ups from wallet events as [`ProviderAction`]s, which the client
//! applies here.

use crate::config::{Config, Network};
use crate::providers::{
    BinanceProvider, ProviderAction, ProviderType, SignMessageOptions, SignPsbtOptions, SignedPsbt,
    WalletProvider,
};
use crate::state::WalletStore;
use crate::wallet::{WalletEnvironment, WalletEvent};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

pub struct WalletClient {
    store: WalletStore,
    providers: HashMap<ProviderType, Arc<dyn WalletProvider>>,
}

impl WalletClient {
    pub fn new(store: WalletStore) -> Self {
        Self {
            store,
            providers: HashMap::new(),
        }
    }

    /// Client on the configured network, with no providers registered
    pub fn from_config(config: &Config) -> Self {
        Self::new(WalletStore::from_config(config))
    }

    /// Client with the Binance provider registered against `env`
    pub fn binance(env: Arc<dyn WalletEnvironment>, config: &Config) -> Self {
        let client = Self::from_config(config);
        let provider = BinanceProvider::from_config(env, client.store.clone(), config);
        client.with_provider(Arc::new(provider))
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    /// Register a provider, replacing any previous one of the same type
    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.insert(provider.provider_type(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.register(provider);
        self
    }

    fn provider(&self, provider_type: ProviderType) -> Result<&Arc<dyn WalletProvider>> {
        self.providers
            .get(&provider_type)
            .ok_or_else(|| Error::UnsupportedProvider(provider_type.to_string()))
    }

    async fn active(&self) -> Result<&Arc<dyn WalletProvider>> {
        let snapshot = self.store.snapshot().await;
        match snapshot.provider {
            Some(provider_type) if snapshot.connected => self.provider(provider_type),
            _ => Err(Error::NotConnected),
        }
    }

    pub fn initialize(&self) {
        for provider in self.providers.values() {
            provider.initialize();
        }
    }

    pub fn dispose(&self) {
        for provider in self.providers.values() {
            provider.dispose();
        }
    }

    pub async fn connect(&self, provider_type: ProviderType) -> Result<()> {
        let provider = self.provider(provider_type)?;

        if let Err(e) = provider.connect(provider_type).await {
            tracing::warn!(provider = %provider_type, error = %e, "Wallet connection failed");
            self.store.reset().await;
            return Err(e);
        }

        let address = self
            .store
            .update(|state| {
                state.provider = Some(provider_type);
                state.connected = true;
                state.connected_at = Some(Utc::now());
                state.address.clone()
            })
            .await;
        tracing::info!(provider = %provider_type, address = %address, "Wallet connected");
        Ok(())
    }

    pub async fn disconnect(&self) {
        let previous = self.store.snapshot().await.provider;
        self.store.reset().await;
        if let Some(provider) = previous {
            tracing::info!(provider = %provider, "Wallet disconnected");
        }
    }

    pub async fn apply(&self, action: ProviderAction) -> Result<()> {
        match action {
            ProviderAction::None => Ok(()),
            ProviderAction::Reconnect(provider_type) => self.connect(provider_type).await,
            ProviderAction::Disconnect => {
                self.disconnect().await;
                Ok(())
            }
        }
    }

    pub async fn handle_event(&self, provider_type: ProviderType, event: WalletEvent) -> Result<()> {
        let action = self.provider(provider_type)?.handle_event(event).await?;
        self.apply(action).await
    }

    /// Process wallet events until the extension stops sending them
    ///
    /// A failing event is logged and does not end the loop.
    pub async fn listen(&self, provider_type: ProviderType) -> Result<()> {
        let mut events = self.provider(provider_type)?.add_listeners()?;

        while let Some(event) = events.recv().await {
            let name = event.event_name();
            if let Err(e) = self.handle_event(provider_type, event).await {
                tracing::warn!(provider = %provider_type, event = name, error = %e, "Wallet event failed");
            }
        }

        tracing::debug!(provider = %provider_type, "Wallet event stream closed");
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn_listener(
        self: Arc<Self>,
        provider_type: ProviderType,
    ) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.listen(provider_type).await })
    }

    pub async fn sign_message(&self, message: &str, options: SignMessageOptions) -> Result<String> {
        self.active().await?.sign_message(message, options).await
    }

    pub async fn sign_psbt(&self, options: SignPsbtOptions) -> Result<SignedPsbt> {
        self.active().await?.sign_psbt(options).await
    }

    /// Fetch the balance and remember it in the store
    pub async fn get_balance(&self) -> Result<u64> {
        let balance = self.active().await?.get_balance().await?;
        self.store
            .update(|state| state.balance = Some(balance))
            .await;
        Ok(balance)
    }

    pub async fn switch_network(&self, network: Network) -> Result<()> {
        self.active().await?.switch_network(network).await
    }
}
