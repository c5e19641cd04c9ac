//! Bindings to the extension APIs: `chrome.storage` areas and runtime URLs.

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{js_message, ExtError, StoreError};
use crate::kv::{AreaKind, KeyValueStore, StorageArea};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL, catch)]
    fn runtime_get_url(path: &str) -> Result<String, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get, catch)]
    async fn sync_get(keys: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set, catch)]
    async fn sync_set(items: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get, catch)]
    async fn local_get(keys: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set, catch)]
    async fn local_set(items: JsValue) -> Result<JsValue, JsValue>;
}

/// One of the `chrome.storage` areas.
pub struct ChromeArea {
    kind: AreaKind,
}

impl ChromeArea {
    pub fn new(kind: AreaKind) -> Self {
        Self { kind }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            AreaKind::Sync => "sync",
            AreaKind::Local => "local",
        }
    }

    fn js_error(&self, err: JsValue) -> StoreError {
        StoreError::Js {
            area: self.kind,
            message: js_message(&err),
        }
    }
}

impl StorageArea for ChromeArea {
    fn kind(&self) -> AreaKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        let lookup = || -> Result<JsValue, JsValue> {
            let chrome = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
            let storage = js_sys::Reflect::get(&chrome, &JsValue::from_str("storage"))?;
            js_sys::Reflect::get(&storage, &JsValue::from_str(self.name()))
        };
        matches!(lookup(), Ok(area) if area.is_object())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if !self.is_available() {
            return Err(StoreError::Unavailable(self.kind));
        }
        let keys = JsValue::from_str(key);
        let items = match self.kind {
            AreaKind::Sync => sync_get(keys).await,
            AreaKind::Local => local_get(keys).await,
        }
        .map_err(|e| self.js_error(e))?;

        let raw = js_sys::Reflect::get(&items, &JsValue::from_str(key))
            .map_err(|e| self.js_error(e))?;
        if raw.is_undefined() || raw.is_null() {
            return Ok(None);
        }
        serde_wasm_bindgen::from_value(raw)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if !self.is_available() {
            return Err(StoreError::Unavailable(self.kind));
        }
        // Plain objects rather than `Map`s, so the stored records stay readable.
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let encoded = value.serialize(&serializer).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let items = js_sys::Object::new();
        js_sys::Reflect::set(&items, &JsValue::from_str(key), &encoded)
            .map_err(|e| self.js_error(e))?;

        match self.kind {
            AreaKind::Sync => sync_set(items.into()).await,
            AreaKind::Local => local_set(items.into()).await,
        }
        .map(|_| ())
        .map_err(|e| self.js_error(e))
    }
}

/// Synced area first, local area as fallback.
pub fn chrome_store() -> KeyValueStore<ChromeArea> {
    KeyValueStore::new(
        ChromeArea::new(AreaKind::Sync),
        ChromeArea::new(AreaKind::Local),
    )
}

/// Fetches an extension-relative resource as text.
pub async fn fetch_resource(resource: &str) -> Result<String, ExtError> {
    let to_fetch_error = |message: String| ExtError::MarkupFetch {
        resource: resource.to_string(),
        message,
    };
    let url = runtime_get_url(resource).map_err(|e| to_fetch_error(js_message(&e)))?;
    let window = web_sys::window().ok_or_else(|| ExtError::MissingElement("window".to_string()))?;

    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|e| to_fetch_error(js_message(&e)))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|e| to_fetch_error(js_message(&e)))?;
    if !response.ok() {
        return Err(to_fetch_error(format!("HTTP {}", response.status())));
    }
    let text = response.text().map_err(|e| to_fetch_error(js_message(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| to_fetch_error(js_message(&e)))?;
    text.as_string()
        .ok_or_else(|| to_fetch_error("response body is not text".to_string()))
}
