use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlElement, Window};

use crate::capture::{FabPosition, Rect};
use crate::error::ExtError;

/// The floating "save selection" button.
pub struct Fab {
    el: HtmlElement,
}

impl Fab {
    /// Creates the hidden button on the document element, outside the host's body.
    pub fn create(document: &Document, label: &str) -> Result<Self, ExtError> {
        let el: HtmlElement = document
            .create_element("button")?
            .dyn_into()
            .map_err(|_| ExtError::MissingElement("button".to_string()))?;
        el.set_class_name("foras-fab");
        el.set_text_content(Some(label));
        el.style().set_property("display", "none")?;
        el.style().set_property("position", "absolute")?;
        el.style().set_property("z-index", "2147483001")?;
        let root = document
            .document_element()
            .ok_or_else(|| ExtError::MissingElement("documentElement".to_string()))?;
        root.append_child(&el)?;

        // Keep the page selection alive when the button is pressed.
        let keep_selection = Closure::<dyn FnMut(Event)>::new(|ev: Event| ev.prevent_default());
        el.add_event_listener_with_callback("mousedown", keep_selection.as_ref().unchecked_ref())?;
        keep_selection.forget();

        Ok(Self { el })
    }

    pub fn on_click(&self, handler: impl Fn() + 'static) -> Result<(), ExtError> {
        let closure = Closure::<dyn FnMut(Event)>::new(move |_: Event| handler());
        self.el
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    pub fn show_at(&self, pos: FabPosition) {
        let style = self.el.style();
        let _ = style.set_property("top", &format!("{}px", pos.top));
        let _ = style.set_property("left", &format!("{}px", pos.left));
        let _ = style.set_property("display", "block");
    }

    pub fn hide(&self) {
        let _ = self.el.style().set_property("display", "none");
    }

    pub fn remove(&self) {
        self.el.remove();
    }
}

/// Trimmed text of the current page selection.
pub fn selection_text(window: &Window) -> String {
    window
        .get_selection()
        .ok()
        .flatten()
        .map(|sel| String::from(sel.to_string()).trim().to_string())
        .unwrap_or_default()
}

/// Bounding rectangle of the first non-collapsed selection range.
pub fn selection_rect(window: &Window) -> Option<Rect> {
    let sel = window.get_selection().ok().flatten()?;
    if sel.range_count() == 0 {
        return None;
    }
    let range = sel.get_range_at(0).ok()?;
    if range.collapsed() {
        return None;
    }
    let rect = range.get_bounding_client_rect();
    Some(Rect {
        top: rect.top(),
        left: rect.left(),
        bottom: rect.bottom(),
        right: rect.right(),
    })
}

pub fn scroll_offsets(window: &Window) -> (f64, f64) {
    (
        window.scroll_x().unwrap_or(0.0),
        window.scroll_y().unwrap_or(0.0),
    )
}
