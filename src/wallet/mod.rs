//! Injected wallet access
//!
//! This module defines the contract expected from the wallet object an
//! extension injects into the page, and how its presence is detected.
//! The browser bindings live in `web` and only exist on wasm32.

mod injected;
mod probe;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod mock;

pub use injected::{
    BinanceBalance, BinanceBitcoinApi, BinanceSignPsbtOptions, EventReceiver, EventSender,
    WalletEvent,
};
pub use probe::{probe_once, AvailabilityWatcher, Detector, WalletEnvironment};
