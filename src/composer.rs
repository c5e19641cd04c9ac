use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlInputElement, HtmlTextAreaElement};

use crate::error::ExtError;
use crate::note::ComposeForm;

// Static markup only; user text goes through `set_value`.
const MODAL_MARKUP: &str = r#"
  <h3>Save to FORAS</h3>
  <div class="foras-field">
    <label for="foras-title">Title</label>
    <input type="text" id="foras-title" placeholder="e.g. Debugging prompt">
  </div>
  <div class="foras-field">
    <label for="foras-content">Content</label>
    <textarea id="foras-content" rows="6"></textarea>
  </div>
  <div class="foras-field">
    <label for="foras-tags">Tags (comma separated)</label>
    <input type="text" id="foras-tags" placeholder="marketing, debug">
  </div>
  <div class="foras-actions">
    <button class="foras-btn" id="foras-cancel">Cancel</button>
    <button class="foras-btn primary" id="foras-save">Save</button>
  </div>
"#;

/// The modal collecting title, content and tags before a save.
pub struct Composer {
    backdrop: Element,
}

impl Composer {
    pub fn open(
        document: &Document,
        form: &ComposeForm,
        on_save: impl Fn(ComposeForm) + 'static,
        on_cancel: impl Fn() + Clone + 'static,
    ) -> Result<Self, ExtError> {
        let backdrop = document.create_element("div")?;
        backdrop.set_class_name("foras-modal-backdrop");
        let modal = document.create_element("div")?;
        modal.set_class_name("foras-modal");
        modal.set_inner_html(MODAL_MARKUP);
        backdrop.append_child(&modal)?;

        let title: HtmlInputElement = find(&modal, "#foras-title")?;
        let content: HtmlTextAreaElement = find(&modal, "#foras-content")?;
        let tags: HtmlInputElement = find(&modal, "#foras-tags")?;
        title.set_value(&form.title);
        content.set_value(&form.content);
        tags.set_value(&form.tags);

        let cancel = on_cancel.clone();
        let cancel_btn: Element = find(&modal, "#foras-cancel")?;
        listen(&cancel_btn, "click", move |_| cancel())?;

        let inner = backdrop.clone();
        listen(&backdrop, "click", move |ev: Event| {
            let outside = ev
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .is_some_and(|el| el == inner);
            if outside {
                on_cancel();
            }
        })?;

        let save_btn: Element = find(&modal, "#foras-save")?;
        listen(&save_btn, "click", move |_| {
            on_save(ComposeForm {
                title: title.value(),
                content: content.value(),
                tags: tags.value(),
            })
        })?;

        let body = document
            .body()
            .ok_or_else(|| ExtError::MissingElement("body".to_string()))?;
        body.append_child(&backdrop)?;
        if let Ok(field) = find::<HtmlInputElement>(&modal, "#foras-tags") {
            let _ = field.focus();
        }
        Ok(Self { backdrop })
    }

    pub fn close(self) {
        self.backdrop.remove();
    }
}

fn find<T: JsCast>(root: &Element, selector: &str) -> Result<T, ExtError> {
    root.query_selector(selector)?
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| ExtError::MissingElement(selector.to_string()))
}

// Listeners live as long as the modal's nodes; the closures are leaked.
fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), ExtError> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
