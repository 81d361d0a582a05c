//! Connection store
//!
//! Holds the connected account record and the selected network. The store is
//! passed explicitly to providers and the client; clones share the same state.

use crate::config::{Config, Network};
use crate::providers::ProviderType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What the wallet extension last reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Provider the current connection was made through
    pub provider: Option<ProviderType>,
    pub connected: bool,
    pub accounts: Vec<String>,
    pub address: String,
    pub public_key: String,
    pub payment_address: String,
    pub payment_public_key: String,
    /// Last fetched balance in satoshis
    pub balance: Option<u64>,
    /// Which wallets have been detected in the environment
    pub has_provider: HashMap<ProviderType, bool>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    /// Clear the connection record, keeping availability flags
    fn clear_connection(&mut self) {
        let has_provider = std::mem::take(&mut self.has_provider);
        *self = Self {
            has_provider,
            ..Self::default()
        };
    }
}

/// Shared, cloneable handle to the connection state
#[derive(Clone, Debug)]
pub struct WalletStore {
    state: Arc<RwLock<ConnectionState>>,
    network: Arc<RwLock<Network>>,
}

impl WalletStore {
    pub fn new(network: Network) -> Self {
        Self {
            state: Arc::new(RwLock::new(ConnectionState::default())),
            network: Arc::new(RwLock::new(network)),
        }
    }

    /// Empty store on the configured starting network
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.network)
    }

    /// Copy of the current connection record
    pub async fn snapshot(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    pub async fn network(&self) -> Network {
        *self.network.read().await
    }

    pub async fn set_network(&self, network: Network) {
        *self.network.write().await = network;
    }

    /// Mutate the connection record in place
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ConnectionState) -> R,
    {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    pub async fn set_has_provider(&self, provider: ProviderType, available: bool) {
        self.update(|state| {
            state.has_provider.insert(provider, available);
        })
        .await;
    }

    pub async fn has_provider(&self, provider: ProviderType) -> bool {
        self.state
            .read()
            .await
            .has_provider
            .get(&provider)
            .copied()
            .unwrap_or(false)
    }

    pub async fn first_account(&self) -> Option<String> {
        self.state.read().await.accounts.first().cloned()
    }

    /// Record the accounts and key a wallet returned on connect
    ///
    /// The first account doubles as the payment address.
    pub async fn record_connection(&self, accounts: Vec<String>, public_key: String) {
        self.update(|state| {
            let primary = accounts.first().cloned().unwrap_or_default();
            state.accounts = accounts;
            state.address = primary.clone();
            state.payment_address = primary;
            state.public_key = public_key.clone();
            state.payment_public_key = public_key;
        })
        .await;
    }

    /// Forget the connected account, keeping detected providers and network
    pub async fn reset(&self) {
        self.update(ConnectionState::clear_connection).await;
    }
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new(Network::default())
    }
}
