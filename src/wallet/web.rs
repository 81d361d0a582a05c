//! Browser bindings for the injected Binance wallet
//!
//! The extension exposes `window.binancew3w.bitcoin`. Every call looks the
//! object up again, so a wallet injected after startup is picked up without
//! rebuilding anything.

use super::{
    BinanceBalance, BinanceBitcoinApi, BinanceSignPsbtOptions, EventReceiver, EventSender,
    WalletEnvironment, WalletEvent,
};
use crate::{Error, Result};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use std::sync::Arc;
use tokio::sync::mpsc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

const INJECTION_KEY: &str = "binancew3w";
const BITCOIN_KEY: &str = "bitcoin";
const MOBILE_MARKERS: [&str; 5] = ["Android", "iPhone", "iPad", "iPod", "Mobile"];

fn lookup(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn bitcoin_object() -> Option<JsValue> {
    let window = web_sys::window()?;
    let binance = lookup(&window, INJECTION_KEY)?;
    lookup(&binance, BITCOIN_KEY)
}

/// Environment backed by the page's `window`
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserEnvironment;

impl BrowserEnvironment {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl WalletEnvironment for BrowserEnvironment {
    fn binance(&self) -> Option<Arc<dyn BinanceBitcoinApi>> {
        bitcoin_object().map(|_| Arc::new(InjectedBinanceWallet) as Arc<dyn BinanceBitcoinApi>)
    }

    fn is_mobile(&self) -> bool {
        web_sys::window()
            .and_then(|window| window.navigator().user_agent().ok())
            .map(|agent| MOBILE_MARKERS.iter().any(|marker| agent.contains(marker)))
            .unwrap_or(false)
    }
}

/// Handle to `window.binancew3w.bitcoin`
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectedBinanceWallet;

impl InjectedBinanceWallet {
    fn object(&self) -> Result<JsValue> {
        bitcoin_object().ok_or_else(|| Error::ProviderNotInstalled("Binance".to_string()))
    }

    fn function(&self, target: &JsValue, method: &str) -> Result<Function> {
        let value = Reflect::get(target, &JsValue::from_str(method))
            .map_err(|e| Error::Wallet(format!("Method {method} not found: {e:?}")))?;
        value
            .dyn_into::<Function>()
            .map_err(|_| Error::Wallet(format!("Method {method} is not a function")))
    }

    async fn call_method(&self, method: &str, args: &[JsValue]) -> Result<JsValue> {
        let target = self.object()?;
        let function = self.function(&target, method)?;

        let result = function
            .apply(&target, &Array::from_iter(args.iter()))
            .map_err(|e| Error::Wallet(format!("{method} failed: {e:?}")))?;

        if result.has_type::<Promise>() {
            let promise: Promise = result.unchecked_into();
            JsFuture::from(promise)
                .await
                .map_err(|e| Error::Wallet(format!("{method} rejected: {e:?}")))
        } else {
            Ok(result)
        }
    }

    async fn call_string(&self, method: &str, args: &[JsValue]) -> Result<String> {
        self.call_method(method, args)
            .await?
            .as_string()
            .ok_or_else(|| Error::Wallet(format!("{method} returned a non-string value")))
    }

    fn listen<F>(
        &self,
        target: &JsValue,
        event: &str,
        sender: EventSender,
        convert: F,
    ) -> Result<()>
    where
        F: Fn(JsValue) -> Option<WalletEvent> + 'static,
    {
        let on = self.function(target, "on")?;
        let handler = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if let Some(event) = convert(value) {
                let _ = sender.send(event);
            }
        });
        on.call2(target, &JsValue::from_str(event), handler.as_ref())
            .map_err(|e| Error::Wallet(format!("on({event}) failed: {e:?}")))?;
        // Owned by the extension for the lifetime of the page.
        handler.forget();
        Ok(())
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| Error::Wallet(format!("serialize: {e}")))
}

#[async_trait(?Send)]
impl BinanceBitcoinApi for InjectedBinanceWallet {
    async fn switch_network(&self, network: &str) -> Result<()> {
        self.call_method("switchNetwork", &[JsValue::from_str(network)])
            .await
            .map(|_| ())
    }

    async fn switch_chain(&self, chain: &str) -> Result<()> {
        self.call_method("switchChain", &[JsValue::from_str(chain)])
            .await
            .map(|_| ())
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        let accounts = self.call_method("requestAccounts", &[]).await?;
        serde_wasm_bindgen::from_value(accounts)
            .map_err(|e| Error::Wallet(format!("Invalid accounts response: {e}")))
    }

    async fn get_public_key(&self) -> Result<Option<String>> {
        Ok(self.call_method("getPublicKey", &[]).await?.as_string())
    }

    async fn get_balance(&self) -> Result<BinanceBalance> {
        let balance = self.call_method("getBalance", &[]).await?;
        serde_wasm_bindgen::from_value(balance)
            .map_err(|e| Error::Wallet(format!("Invalid balance response: {e}")))
    }

    async fn sign_message(&self, message: &str, protocol: Option<&str>) -> Result<String> {
        let protocol = protocol.map(JsValue::from_str).unwrap_or(JsValue::UNDEFINED);
        self.call_string("signMessage", &[JsValue::from_str(message), protocol])
            .await
    }

    async fn sign_psbt(&self, psbt_hex: &str, options: BinanceSignPsbtOptions) -> Result<String> {
        self.call_string("signPsbt", &[JsValue::from_str(psbt_hex), to_js(&options)?])
            .await
    }

    async fn push_psbt(&self, psbt_hex: &str) -> Result<String> {
        self.call_string("pushPsbt", &[JsValue::from_str(psbt_hex)])
            .await
    }

    fn subscribe(&self) -> Result<EventReceiver> {
        let target = self.object()?;
        let (tx, rx) = mpsc::unbounded_channel();

        self.listen(&target, "accountsChanged", tx.clone(), |value| {
            serde_wasm_bindgen::from_value::<Vec<String>>(value)
                .ok()
                .map(WalletEvent::AccountsChanged)
        })?;
        self.listen(&target, "networkChanged", tx, |value| {
            value.as_string().map(WalletEvent::NetworkChanged)
        })?;

        Ok(rx)
    }
}
