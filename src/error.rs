use thiserror::Error;

use crate::kv::AreaKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage area {0:?} is unavailable")]
    Unavailable(AreaKind),
    #[error("storage area {area:?} failed: {message}")]
    Js { area: AreaKind, message: String },
    #[error("stored value under `{key}` does not decode: {message}")]
    Decode { key: String, message: String },
    #[error("value for `{key}` does not encode: {message}")]
    Encode { key: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to load markup `{resource}`: {message}")]
    MarkupFetch { resource: String, message: String },
    #[error("element not found: {0}")]
    MissingElement(String),
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<wasm_bindgen::JsValue> for ExtError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ExtError::Js(js_message(&value))
    }
}

/// Best-effort readable text for a thrown JS value.
pub fn js_message(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
