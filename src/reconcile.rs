//! Keeps the notes button and side panel attached to a host page whose DOM
//! is re-rendered underneath us.
//!
//! A pass is idempotent: with no host mutation in between, a second pass
//! touches nothing. Anything missing is left for the next pass.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::Config;
use crate::dom::HostDom;
use crate::error::ExtError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Created,
    /// Re-parented to a new mount point.
    Moved,
    /// Same parent, put back right after the marker.
    Repositioned,
    Unchanged,
    NoAnchor,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    Created,
    /// A container with our id was already on the page and is used as is.
    Adopted,
    /// The host dropped our container; the same element was put back.
    Reattached,
    Present,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub button: ButtonAction,
    pub panel: PanelAction,
}

/// Where the button goes this pass.
enum Mount<N> {
    /// Right after the marker, inside its parent.
    AfterMarker { marker: N, parent: N },
    /// Appended to a visible actions row.
    Append(N),
}

pub struct Reconciler<D: HostDom> {
    dom: D,
    config: Rc<Config>,
    styles: String,
    /// Button elements that already carry our click handler. Entries stay
    /// when a button is detached: the host may put the same subtree back.
    wired: RefCell<Vec<D::Node>>,
    panel: RefCell<Option<D::Node>>,
    on_toggle: Rc<dyn Fn()>,
    on_panel_created: Box<dyn Fn(&D::Node)>,
    running: Cell<bool>,
    rerun: Cell<bool>,
}

impl<D: HostDom> Reconciler<D> {
    pub fn new(
        dom: D,
        config: Rc<Config>,
        on_toggle: Rc<dyn Fn()>,
        on_panel_created: impl Fn(&D::Node) + 'static,
    ) -> Self {
        Self {
            styles: config.base_styles(),
            dom,
            config,
            wired: RefCell::new(Vec::new()),
            panel: RefCell::new(None),
            on_toggle,
            on_panel_created: Box::new(on_panel_created),
            running: Cell::new(false),
            rerun: Cell::new(false),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn panel(&self) -> Option<D::Node> {
        self.panel.borrow().clone()
    }

    /// Runs one reconciliation pass.
    ///
    /// A call made while another pass is suspended on a fetch returns `None`;
    /// the running pass then does one more round before it finishes.
    pub async fn reconcile(&self) -> Option<PassReport> {
        if self.running.replace(true) {
            self.rerun.set(true);
            return None;
        }
        let mut report = self.pass().await;
        while self.rerun.replace(false) {
            report = self.pass().await;
        }
        self.running.set(false);
        log::debug!("[notes] reconcile: {report:?}");
        Some(report)
    }

    async fn pass(&self) -> PassReport {
        let button = match self.ensure_button().await {
            Ok(action) => action,
            Err(err) => {
                log::warn!("[notes] button: {err}");
                ButtonAction::Failed
            }
        };
        let panel = match self.ensure_panel().await {
            Ok(action) => action,
            Err(err) => {
                log::warn!("[notes] panel: {err}");
                PanelAction::Failed
            }
        };
        PassReport { button, panel }
    }

    fn mount_point(&self) -> Option<Mount<D::Node>> {
        if let Some(marker) = self.dom.query(&self.config.mic_selector) {
            if let Some(parent) = self.dom.parent(&marker) {
                return Some(Mount::AfterMarker { marker, parent });
            }
        }
        self.dom
            .query_all(&self.config.actions_selector)
            .into_iter()
            .find(|row| self.dom.is_visible(row))
            .map(Mount::Append)
    }

    async fn ensure_button(&self) -> Result<ButtonAction, ExtError> {
        let Some(mount) = self.mount_point() else {
            return Ok(ButtonAction::NoAnchor);
        };

        if let Some(existing) = self.dom.element_by_id(&self.config.button_id) {
            let parent = self.dom.parent(&existing);
            let action = match &mount {
                Mount::AfterMarker { marker, parent: target } => {
                    if parent.as_ref() != Some(target) {
                        self.dom.insert_after(marker, &existing)?;
                        log::info!("[notes] button moved");
                        ButtonAction::Moved
                    } else if self.dom.previous_sibling(&existing).as_ref() != Some(marker) {
                        self.dom.insert_after(marker, &existing)?;
                        ButtonAction::Repositioned
                    } else {
                        ButtonAction::Unchanged
                    }
                }
                Mount::Append(row) => {
                    if parent.as_ref() != Some(row) {
                        self.dom.append(row, &existing)?;
                        log::info!("[notes] button moved");
                        ButtonAction::Moved
                    } else {
                        ButtonAction::Unchanged
                    }
                }
            };
            self.wire(&existing);
            return Ok(action);
        }

        let node = self.dom.load_fragment(&self.config.button_resource).await?;
        self.dom.set_id(&node, &self.config.button_id);
        match &mount {
            Mount::AfterMarker { marker, .. } => self.dom.insert_after(marker, &node)?,
            Mount::Append(row) => self.dom.append(row, &node)?,
        }
        log::info!("[notes] button mounted");
        self.wire(&node);
        Ok(ButtonAction::Created)
    }

    fn wire(&self, button: &D::Node) {
        let mut wired = self.wired.borrow_mut();
        if !wired.contains(button) {
            self.dom.on_click(button, Rc::clone(&self.on_toggle));
            wired.push(button.clone());
        }
    }

    fn panel_host(&self) -> Option<D::Node> {
        self.config
            .host_selectors
            .iter()
            .find_map(|selector| self.dom.query(selector))
            .or_else(|| self.dom.body())
    }

    async fn ensure_panel(&self) -> Result<PanelAction, ExtError> {
        let known = self.panel.borrow().clone();
        if let Some(panel) = known {
            if self.dom.is_connected(&panel) {
                return Ok(PanelAction::Present);
            }
            let host = self
                .panel_host()
                .ok_or_else(|| ExtError::MissingElement("panel host".to_string()))?;
            self.dom.append(&host, &panel)?;
            log::info!("[notes] panel re-attached");
            return Ok(PanelAction::Reattached);
        }

        self.dom.ensure_style(&self.config.styles_id, &self.styles)?;
        if let Some(existing) = self.dom.element_by_id(&self.config.panel_id) {
            *self.panel.borrow_mut() = Some(existing.clone());
            log::info!("[notes] adopted existing panel");
            (self.on_panel_created)(&existing);
            return Ok(PanelAction::Adopted);
        }

        let host = self
            .panel_host()
            .ok_or_else(|| ExtError::MissingElement("panel host".to_string()))?;
        let inner = self.dom.load_fragment(&self.config.panel_resource).await?;
        let wrapper = self.dom.create_container(&self.config.panel_id)?;
        self.dom.append(&wrapper, &inner)?;
        self.dom.append(&host, &wrapper)?;
        *self.panel.borrow_mut() = Some(wrapper.clone());
        log::info!("[notes] panel mounted");
        (self.on_panel_created)(&wrapper);
        Ok(PanelAction::Created)
    }
}
