use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement};

use crate::chrome::fetch_resource;
use crate::dom::HostDom;
use crate::error::ExtError;

/// The live document, as seen by the reconciler.
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl HostDom for WebDom {
    type Node = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn previous_sibling(&self, node: &Element) -> Option<Element> {
        node.previous_element_sibling()
    }

    fn is_visible(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlElement>()
            .is_some_and(|el| el.offset_parent().is_some())
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn append(&self, parent: &Element, child: &Element) -> Result<(), ExtError> {
        parent.append_child(child)?;
        Ok(())
    }

    fn insert_after(&self, anchor: &Element, node: &Element) -> Result<(), ExtError> {
        anchor.insert_adjacent_element("afterend", node)?;
        Ok(())
    }

    fn set_id(&self, node: &Element, id: &str) {
        node.set_id(id);
    }

    fn create_container(&self, id: &str) -> Result<Element, ExtError> {
        let el = self.document.create_element("div")?;
        el.set_id(id);
        Ok(el)
    }

    fn ensure_style(&self, id: &str, css: &str) -> Result<(), ExtError> {
        if self.document.get_element_by_id(id).is_some() {
            return Ok(());
        }
        let style = self.document.create_element("style")?;
        style.set_id(id);
        style.set_text_content(Some(css));
        let parent: Element = match self.document.head() {
            Some(head) => head.into(),
            None => self
                .document
                .document_element()
                .ok_or_else(|| ExtError::MissingElement("documentElement".to_string()))?,
        };
        parent.append_child(&style)?;
        Ok(())
    }

    fn on_click(&self, node: &Element, handler: Rc<dyn Fn()>) {
        let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            ev.prevent_default();
            handler();
        });
        if node
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .is_ok()
        {
            closure.forget();
        }
    }

    async fn load_fragment(&self, resource: &str) -> Result<Element, ExtError> {
        let html = fetch_resource(resource).await?;
        let wrap = self.document.create_element("div")?;
        wrap.set_inner_html(html.trim());
        wrap.first_element_child().ok_or_else(|| ExtError::MarkupFetch {
            resource: resource.to_string(),
            message: "no element in markup".to_string(),
        })
    }
}
