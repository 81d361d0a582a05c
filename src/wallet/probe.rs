//! Wallet availability probing
//!
//! Extensions inject their object some time after the page starts, so
//! availability is probed on an interval until the wallet shows up (or the
//! environment looks like a mobile in-app browser, where the object is
//! provided on demand).

use super::BinanceBitcoinApi;
use crate::providers::ProviderType;
use crate::state::WalletStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The environment a provider runs in
pub trait WalletEnvironment: Send + Sync {
    /// The injected Binance bitcoin object, if present
    fn binance(&self) -> Option<Arc<dyn BinanceBitcoinApi>>;

    /// Mobile heuristic
    fn is_mobile(&self) -> bool;
}

pub type Detector = Arc<dyn Fn() -> bool + Send + Sync>;

/// Run a single availability check, flagging the provider when it passes
pub async fn probe_once(
    detect: &(dyn Fn() -> bool + Send + Sync),
    store: &WalletStore,
    provider: ProviderType,
) -> bool {
    if !detect() {
        return false;
    }
    store.set_has_provider(provider, true).await;
    true
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(interval: Duration) {
    tokio::time::sleep(interval).await;
}

#[cfg(target_arch = "wasm32")]
async fn pause(interval: Duration) {
    gloo_timers::future::sleep(interval).await;
}

/// Background probe that stops after the first successful check
pub struct AvailabilityWatcher {
    stopped: Arc<AtomicBool>,
    #[cfg(not(target_arch = "wasm32"))]
    handle: tokio::task::JoinHandle<()>,
}

impl AvailabilityWatcher {
    /// Start probing every `interval`
    ///
    /// Returns `None` when there is no runtime to run the probe on.
    pub fn spawn(
        detect: Detector,
        store: WalletStore,
        provider: ProviderType,
        interval: Duration,
    ) -> Option<Self> {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();

        let task = async move {
            while !flag.load(Ordering::SeqCst) {
                if probe_once(detect.as_ref(), &store, provider).await {
                    tracing::debug!(provider = %provider, "Wallet detected");
                    flag.store(true, Ordering::SeqCst);
                    break;
                }
                pause(interval).await;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let runtime = match tokio::runtime::Handle::try_current() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(provider = %provider, error = %e, "No runtime, wallet probe not started");
                    return None;
                }
            };
            let handle = runtime.spawn(task);
            Some(Self { stopped, handle })
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(task);
            Some(Self { stopped })
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        #[cfg(not(target_arch = "wasm32"))]
        self.handle.abort();
    }

    /// True once the wallet was found or `stop` was called
    pub fn is_finished(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for AvailabilityWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
