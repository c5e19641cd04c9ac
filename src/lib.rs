//! FORAS notes content script.
//!
//! Captures selected text into a note store kept in `chrome.storage` and
//! re-inserts saved notes into the chat input of the host page. The UI
//! anchors are kept alive by a debounced reconciler, since the host's own
//! framework keeps rewriting the DOM around them.

pub mod capture;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod keys;
pub mod kv;
pub mod note;
pub mod reconcile;
pub mod search;
pub mod store;
pub mod text_edit;

mod app;
mod chrome;
mod composer;
mod fab;
mod insert;
mod panel;
mod timer;
mod web_dom;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_bindgen_futures::spawn_local(app::boot());
}

/// Removes every listener and injected element, e.g. before re-injection.
#[wasm_bindgen]
pub fn stop() {
    app::stop();
}
