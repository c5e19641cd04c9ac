//! Inserting note content into the host page's chat input.

use wasm_bindgen::JsCast;
use web_sys::{Document, Event, EventInit, HtmlElement, HtmlTextAreaElement, Node};

use crate::error::ExtError;
use crate::text_edit::{splice_utf16, Selection};

enum Target {
    TextArea(HtmlTextAreaElement),
    Editable(HtmlElement),
}

/// First plain textarea, else the first contenteditable region.
fn find_target(document: &Document) -> Option<Target> {
    if let Some(area) = document
        .query_selector("textarea")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
    {
        return Some(Target::TextArea(area));
    }
    document
        .query_selector("div[contenteditable='true']")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .map(Target::Editable)
}

/// Inserts `text` at the caret of the host input, replacing any selection.
/// No input on the page is a no-op.
pub fn insert_into_host(text: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let result = match find_target(&document) {
        Some(Target::TextArea(area)) => insert_into_textarea(&area, text),
        Some(Target::Editable(el)) => insert_into_editable(&document, &el, text),
        None => {
            log::debug!("[notes] no input to insert into");
            return;
        }
    };
    if let Err(err) = result {
        log::warn!("[notes] insert failed: {err}");
    }
}

fn insert_into_textarea(area: &HtmlTextAreaElement, text: &str) -> Result<(), ExtError> {
    let value = area.value();
    let start = area.selection_start()?.unwrap_or(0) as usize;
    let end = area.selection_end()?.unwrap_or(0) as usize;
    let (next, caret) = splice_utf16(&value, Selection::new(start, end), text);
    area.set_value(&next);
    let caret = u32::try_from(caret).unwrap_or(u32::MAX);
    area.set_selection_start(Some(caret))?;
    area.set_selection_end(Some(caret))?;
    notify_input(area)?;
    area.focus()?;
    Ok(())
}

fn insert_into_editable(document: &Document, el: &HtmlElement, text: &str) -> Result<(), ExtError> {
    el.focus()?;
    let window = web_sys::window().ok_or_else(|| ExtError::MissingElement("window".to_string()))?;
    let selection = window
        .get_selection()?
        .ok_or_else(|| ExtError::MissingElement("selection".to_string()))?;

    let inside = if selection.range_count() > 0 {
        let range = selection.get_range_at(0)?;
        let ancestor = range.common_ancestor_container()?;
        el.contains(Some(&ancestor)).then_some(range)
    } else {
        None
    };
    let range = match inside {
        Some(range) => range,
        None => {
            let range = document.create_range()?;
            range.select_node_contents(el)?;
            range.collapse_with_to_start(false);
            range
        }
    };

    range.delete_contents()?;
    let node: Node = document.create_text_node(text).into();
    range.insert_node(&node)?;
    range.set_start_after(&node)?;
    range.collapse_with_to_start(true);
    selection.remove_all_ranges()?;
    selection.add_range(&range)?;
    notify_input(el)?;
    Ok(())
}

/// Frameworks on the host listen for `input` rather than value changes.
fn notify_input(target: &HtmlElement) -> Result<(), ExtError> {
    let init = EventInit::new();
    init.set_bubbles(true);
    let event = Event::new_with_event_init_dict("input", &init)?;
    target.dispatch_event(&event)?;
    Ok(())
}
