//! The reconciler's view of the host page.

use std::rc::Rc;

use crate::error::ExtError;

/// DOM operations the reconciler needs. Node handles compare by identity.
#[allow(async_fn_in_trait)]
pub trait HostDom {
    type Node: Clone + PartialEq;

    fn query(&self, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Previous element sibling.
    fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn is_visible(&self, node: &Self::Node) -> bool;
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Appends `child` to `parent`, moving it if already attached elsewhere.
    fn append(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), ExtError>;
    /// Places `node` immediately after `anchor`.
    fn insert_after(&self, anchor: &Self::Node, node: &Self::Node) -> Result<(), ExtError>;

    fn set_id(&self, node: &Self::Node, id: &str);
    fn create_container(&self, id: &str) -> Result<Self::Node, ExtError>;
    /// Injects a `<style>` once per `id`.
    fn ensure_style(&self, id: &str, css: &str) -> Result<(), ExtError>;
    fn on_click(&self, node: &Self::Node, handler: Rc<dyn Fn()>);

    /// Fetches an extension resource and returns its first element.
    async fn load_fragment(&self, resource: &str) -> Result<Self::Node, ExtError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub type NodeId = usize;

    #[derive(Default)]
    struct Element {
        tag: String,
        id: Option<String>,
        test_id: Option<String>,
        parent: Option<NodeId>,
        children: Vec<NodeId>,
        hidden: bool,
    }

    /// Arena-backed page. Selectors understood: `#id`, `tag`, and
    /// `[data-testid="…"]`. Element 0 is `html`, element 1 is `body`.
    pub struct FakeDom {
        nodes: RefCell<Vec<Element>>,
        pub mutations: Cell<usize>,
        pub fetches: Cell<usize>,
        pub failing_resources: RefCell<HashSet<String>>,
        /// Resources whose next load stays pending for one poll.
        pub suspend_once: RefCell<HashSet<String>>,
        pub styles: RefCell<HashMap<String, String>>,
        pub click_handlers: RefCell<Vec<(NodeId, Rc<dyn Fn()>)>>,
    }

    impl FakeDom {
        pub fn new() -> Self {
            let dom = Self {
                nodes: RefCell::new(Vec::new()),
                mutations: Cell::new(0),
                fetches: Cell::new(0),
                failing_resources: RefCell::default(),
                suspend_once: RefCell::default(),
                styles: RefCell::default(),
                click_handlers: RefCell::default(),
            };
            let html = dom.element("html");
            let body = dom.element("body");
            dom.attach(html, body);
            dom.mutations.set(0);
            dom
        }

        pub fn body_id(&self) -> NodeId {
            1
        }

        pub fn element(&self, tag: &str) -> NodeId {
            let mut nodes = self.nodes.borrow_mut();
            nodes.push(Element {
                tag: tag.to_string(),
                ..Element::default()
            });
            nodes.len() - 1
        }

        pub fn with_test_id(&self, tag: &str, test_id: &str) -> NodeId {
            let node = self.element(tag);
            self.nodes.borrow_mut()[node].test_id = Some(test_id.to_string());
            node
        }

        pub fn attach(&self, parent: NodeId, child: NodeId) {
            self.detach(child);
            let mut nodes = self.nodes.borrow_mut();
            nodes[parent].children.push(child);
            nodes[child].parent = Some(parent);
            self.mutations.set(self.mutations.get() + 1);
        }

        pub fn detach(&self, node: NodeId) {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(parent) = nodes[node].parent.take() {
                nodes[parent].children.retain(|c| *c != node);
                self.mutations.set(self.mutations.get() + 1);
            }
        }

        pub fn hide(&self, node: NodeId) {
            self.nodes.borrow_mut()[node].hidden = true;
        }

        pub fn children(&self, node: NodeId) -> Vec<NodeId> {
            self.nodes.borrow()[node].children.clone()
        }

        pub fn tag(&self, node: NodeId) -> String {
            self.nodes.borrow()[node].tag.clone()
        }

        pub fn click(&self, node: NodeId) {
            let handlers: Vec<_> = self
                .click_handlers
                .borrow()
                .iter()
                .filter(|(target, _)| *target == node)
                .map(|(_, handler)| Rc::clone(handler))
                .collect();
            for handler in handlers {
                handler();
            }
        }

        fn connected(&self, node: NodeId) -> bool {
            let nodes = self.nodes.borrow();
            let mut current = Some(node);
            while let Some(id) = current {
                if id == 0 {
                    return true;
                }
                current = nodes[id].parent;
            }
            false
        }

        fn matches(&self, node: NodeId, selector: &str) -> bool {
            let nodes = self.nodes.borrow();
            let el = &nodes[node];
            if let Some(id) = selector.strip_prefix('#') {
                return el.id.as_deref() == Some(id);
            }
            if let Some(rest) = selector.strip_prefix("[data-testid=\"") {
                let wanted = rest.trim_end_matches("\"]");
                return el.test_id.as_deref() == Some(wanted);
            }
            el.tag == selector
        }

        /// Connected elements in document order.
        fn walk(&self) -> Vec<NodeId> {
            let mut out = Vec::new();
            let mut stack = vec![0];
            while let Some(node) = stack.pop() {
                out.push(node);
                let children = self.children(node);
                stack.extend(children.into_iter().rev());
            }
            out
        }
    }

    impl HostDom for FakeDom {
        type Node = NodeId;

        fn query(&self, selector: &str) -> Option<NodeId> {
            self.walk().into_iter().find(|n| self.matches(*n, selector))
        }

        fn query_all(&self, selector: &str) -> Vec<NodeId> {
            self.walk()
                .into_iter()
                .filter(|n| self.matches(*n, selector))
                .collect()
        }

        fn element_by_id(&self, id: &str) -> Option<NodeId> {
            self.query(&format!("#{id}"))
        }

        fn body(&self) -> Option<NodeId> {
            Some(self.body_id())
        }

        fn parent(&self, node: &NodeId) -> Option<NodeId> {
            self.nodes.borrow()[*node].parent
        }

        fn previous_sibling(&self, node: &NodeId) -> Option<NodeId> {
            let parent = self.parent(node)?;
            let siblings = self.children(parent);
            let pos = siblings.iter().position(|c| c == node)?;
            pos.checked_sub(1).map(|prev| siblings[prev])
        }

        fn is_visible(&self, node: &NodeId) -> bool {
            self.connected(*node) && !self.nodes.borrow()[*node].hidden
        }

        fn is_connected(&self, node: &NodeId) -> bool {
            self.connected(*node)
        }

        fn append(&self, parent: &NodeId, child: &NodeId) -> Result<(), ExtError> {
            self.attach(*parent, *child);
            Ok(())
        }

        fn insert_after(&self, anchor: &NodeId, node: &NodeId) -> Result<(), ExtError> {
            let parent = self
                .parent(anchor)
                .ok_or_else(|| ExtError::MissingElement("anchor parent".to_string()))?;
            self.detach(*node);
            let mut nodes = self.nodes.borrow_mut();
            let pos = nodes[parent]
                .children
                .iter()
                .position(|c| c == anchor)
                .unwrap_or(0);
            nodes[parent].children.insert(pos + 1, *node);
            nodes[*node].parent = Some(parent);
            self.mutations.set(self.mutations.get() + 1);
            Ok(())
        }

        fn set_id(&self, node: &NodeId, id: &str) {
            self.nodes.borrow_mut()[*node].id = Some(id.to_string());
        }

        fn create_container(&self, id: &str) -> Result<NodeId, ExtError> {
            let node = self.element("div");
            self.set_id(&node, id);
            Ok(node)
        }

        fn ensure_style(&self, id: &str, css: &str) -> Result<(), ExtError> {
            self.styles
                .borrow_mut()
                .entry(id.to_string())
                .or_insert_with(|| css.to_string());
            Ok(())
        }

        fn on_click(&self, node: &NodeId, handler: Rc<dyn Fn()>) {
            self.click_handlers.borrow_mut().push((*node, handler));
        }

        async fn load_fragment(&self, resource: &str) -> Result<NodeId, ExtError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.suspend_once.borrow_mut().remove(resource) {
                YieldOnce(false).await;
            }
            if self.failing_resources.borrow().contains(resource) {
                return Err(ExtError::MarkupFetch {
                    resource: resource.to_string(),
                    message: "404".to_string(),
                });
            }
            Ok(self.element(if resource.contains("boton") {
                "button"
            } else {
                "aside"
            }))
        }
    }

    /// Returns `Pending` once, waking itself, then completes.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                return Poll::Ready(());
            }
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
