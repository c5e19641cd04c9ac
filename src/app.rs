//! The content script: one owned [`ContentScript`] per page load wiring the
//! capture UI, the side panel and the reconciler to the document.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, EventTarget, KeyboardEvent, MutationObserver,
    MutationObserverInit, Window,
};

use crate::capture::{CaptureMachine, CaptureState};
use crate::chrome::{chrome_store, ChromeArea};
use crate::composer::Composer;
use crate::config::{Config, CONFIG_KEY};
use crate::debounce::Debouncer;
use crate::error::ExtError;
use crate::fab::{scroll_offsets, selection_rect, selection_text, Fab};
use crate::keys::{decode, Command, KeyMods};
use crate::note::ComposeForm;
use crate::panel::SidePanel;
use crate::reconcile::Reconciler;
use crate::store::NoteStore;
use crate::timer::TimeoutScheduler;
use crate::web_dom::WebDom;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

pub struct ContentScript {
    config: Rc<Config>,
    window: Window,
    document: Document,
    store: NoteStore<ChromeArea>,
    capture: RefCell<CaptureMachine>,
    fab: Fab,
    composer: RefCell<Option<Composer>>,
    panel: SidePanel,
    reconciler: Reconciler<WebDom>,
    debouncer: Debouncer<TimeoutScheduler>,
    observer: RefCell<Option<(MutationObserver, ObserverCallback)>>,
    listeners: RefCell<Vec<Listener>>,
}

impl ContentScript {
    pub fn new(config: Config) -> Result<Rc<Self>, ExtError> {
        let window =
            web_sys::window().ok_or_else(|| ExtError::MissingElement("window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| ExtError::MissingElement("document".to_string()))?;
        let config = Rc::new(config);
        let fab = Fab::create(&document, &config.fab_label)?;

        let app = Rc::new_cyclic(|weak: &Weak<ContentScript>| {
            let toggle = weak.clone();
            let on_toggle: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(app) = toggle.upgrade() {
                    app.toggle_panel();
                }
            });
            let mounted = weak.clone();
            let reconciler = Reconciler::new(
                WebDom::new(document.clone()),
                Rc::clone(&config),
                on_toggle,
                move |container: &Element| {
                    if let Some(app) = mounted.upgrade() {
                        app.panel_created(container);
                    }
                },
            );
            let pass = weak.clone();
            let debouncer = Debouncer::new(
                TimeoutScheduler::new(window.clone()),
                config.debounce_ms,
                move || {
                    if let Some(app) = pass.upgrade() {
                        spawn_local(async move {
                            app.reconciler.reconcile().await;
                        });
                    }
                },
            );
            ContentScript {
                store: NoteStore::new(chrome_store(), config.notes_key.clone()),
                capture: RefCell::new(CaptureMachine::new(
                    config.fab_offset_px,
                    config.title_max_chars,
                )),
                panel: SidePanel::new(document.clone(), config.open_class.clone()),
                composer: RefCell::new(None),
                observer: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                fab,
                reconciler,
                debouncer,
                config,
                window,
                document,
            }
        });

        let weak = Rc::downgrade(&app);
        app.fab.on_click(move || {
            if let Some(app) = weak.upgrade() {
                app.open_composer();
            }
        })?;
        app.install_listeners()?;
        Ok(app)
    }

    fn listen(
        &self,
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), ExtError> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            event,
            closure,
        });
        Ok(())
    }

    fn install_listeners(self: &Rc<Self>) -> Result<(), ExtError> {
        let weak = Rc::downgrade(self);
        self.listen(&self.document, "selectionchange", move |_| {
            if let Some(app) = weak.upgrade() {
                app.selection_changed();
            }
        })?;

        let weak = Rc::downgrade(self);
        self.listen(&self.document, "keydown", move |ev: Event| {
            let Some(app) = weak.upgrade() else { return };
            if let Some(key) = ev.dyn_ref::<KeyboardEvent>() {
                app.key_down(key);
            }
        })
    }

    /// Starts the debounced mutation observer and runs the initial pass.
    pub fn observe(self: &Rc<Self>) -> Result<(), ExtError> {
        let debouncer = self.debouncer.clone();
        let callback: ObserverCallback =
            Closure::new(move |_records: js_sys::Array, _observer: MutationObserver| {
                debouncer.trigger();
            });
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        let body = self
            .document
            .body()
            .ok_or_else(|| ExtError::MissingElement("body".to_string()))?;
        observer.observe_with_options(&body, &init)?;
        *self.observer.borrow_mut() = Some((observer, callback));

        let app = Rc::clone(self);
        spawn_local(async move {
            app.reconciler.reconcile().await;
        });
        Ok(())
    }

    fn selection_changed(&self) {
        let text = selection_text(&self.window);
        let rect = selection_rect(&self.window);
        let scroll = scroll_offsets(&self.window);
        let state = self
            .capture
            .borrow_mut()
            .on_selection_change(&text, rect, scroll)
            .clone();
        match state {
            CaptureState::Armed(pos) => self.fab.show_at(pos),
            CaptureState::Idle | CaptureState::Composing(_) => self.fab.hide(),
        }
    }

    fn key_down(self: &Rc<Self>, ev: &KeyboardEvent) {
        let mods = KeyMods {
            alt: ev.alt_key(),
            ctrl: ev.ctrl_key(),
            meta: ev.meta_key(),
        };
        match decode(&ev.key(), mods, self.config.shortcut_modifier) {
            Some(Command::Capture) => {
                if !selection_text(&self.window).is_empty() {
                    ev.prevent_default();
                    self.open_composer();
                }
            }
            Some(Command::TogglePanel) => {
                ev.prevent_default();
                self.toggle_panel();
            }
            Some(Command::ClosePanel) => {
                if self.panel.is_open() {
                    self.panel.set_open(false);
                }
            }
            None => {}
        }
    }

    fn open_composer(self: &Rc<Self>) {
        let text = selection_text(&self.window);
        let form = match self.capture.borrow_mut().open_composer(&text) {
            Some(form) => form.clone(),
            None => return,
        };
        self.fab.hide();

        let save = Rc::downgrade(self);
        let cancel = Rc::downgrade(self);
        let opened = Composer::open(
            &self.document,
            &form,
            move |form| {
                if let Some(app) = save.upgrade() {
                    spawn_local(app.save(form));
                }
            },
            move || {
                if let Some(app) = cancel.upgrade() {
                    app.close_composer();
                }
            },
        );
        match opened {
            Ok(composer) => *self.composer.borrow_mut() = Some(composer),
            Err(err) => {
                log::warn!("[notes] composer unavailable: {err}");
                self.capture.borrow_mut().cancel();
            }
        }
    }

    fn close_composer(&self) {
        if let Some(composer) = self.composer.borrow_mut().take() {
            composer.close();
        }
        self.capture.borrow_mut().cancel();
    }

    async fn save(self: Rc<Self>, form: ComposeForm) {
        let Some(note) = self
            .capture
            .borrow()
            .commit(form, &self.config.default_title)
        else {
            return;
        };
        match self.store.prepend(note).await {
            Ok(notes) => {
                if let Some(composer) = self.composer.borrow_mut().take() {
                    composer.close();
                }
                self.capture.borrow_mut().finish();
                self.panel.set_notes(notes);
                log::info!("[notes] note saved");
            }
            Err(err) => log::warn!("[notes] save failed: {err}"),
        }
    }

    fn toggle_panel(self: &Rc<Self>) {
        self.set_panel_open(!self.panel.is_open());
    }

    fn set_panel_open(self: &Rc<Self>, open: bool) {
        self.panel.set_open(open);
        if open {
            self.refresh_panel();
        }
    }

    /// Reloads the notes from storage into the panel.
    fn refresh_panel(self: &Rc<Self>) {
        let app = Rc::clone(self);
        spawn_local(async move {
            match app.store.load().await {
                Ok(notes) => app.panel.set_notes(notes),
                Err(err) => log::warn!("[notes] could not load notes: {err}"),
            }
        });
    }

    fn panel_created(self: &Rc<Self>, container: &Element) {
        if let Err(err) = self.panel.mount(container) {
            log::warn!("[notes] panel list: {err}");
        }
        // First mount opens the panel so the user sees it.
        self.set_panel_open(true);
    }

    /// Disconnects the observer and removes every listener and injected node.
    pub fn teardown(&self) {
        if let Some((observer, _callback)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.debouncer.reset();
        for listener in self.listeners.borrow_mut().drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        if let Some(composer) = self.composer.borrow_mut().take() {
            composer.close();
        }
        self.fab.remove();
        if let Some(panel) = self.reconciler.panel() {
            panel.remove();
        }
        if let Some(button) = self.document.get_element_by_id(&self.config.button_id) {
            button.remove();
        }
        self.panel.set_open(false);
        log::info!("[notes] content script stopped");
    }
}

thread_local! {
    static RUNNING: RefCell<Option<Rc<ContentScript>>> = const { RefCell::new(None) };
}

/// Reads [`Config`] overrides from storage. Returns the problem, if any,
/// so it can be logged once logging is up.
pub async fn load_config() -> (Config, Option<String>) {
    match chrome_store().get::<serde_json::Value>(CONFIG_KEY).await {
        Ok(None) => (Config::default(), None),
        Ok(Some(raw)) => match Config::from_value(raw) {
            Ok(config) => (config, None),
            Err(err) => (Config::default(), Some(err.to_string())),
        },
        Err(err) => (Config::default(), Some(err.to_string())),
    }
}

fn start(config: Config) {
    let started = ContentScript::new(config).and_then(|app| {
        app.observe()?;
        Ok(app)
    });
    match started {
        Ok(app) => RUNNING.with(|slot| {
            if let Some(previous) = slot.borrow_mut().replace(app) {
                previous.teardown();
            }
        }),
        Err(err) => log::error!("[notes] failed to start: {err}"),
    }
}

/// Entry after the logger is up: starts now or on `DOMContentLoaded`.
pub async fn boot() {
    let (config, problem) = load_config().await;
    wasm_logger::init(wasm_logger::Config::new(config.level()));
    if let Some(problem) = problem {
        log::warn!("[notes] using default configuration: {problem}");
    }
    log::info!("[notes] content script loaded");

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() != "loading" {
        start(config);
        return;
    }
    let callback = Closure::once_into_js(move || start(config));
    let _ = document.add_event_listener_with_callback(
        "DOMContentLoaded",
        callback.as_ref().unchecked_ref(),
    );
}

/// Tears the running content script down.
pub fn stop() {
    RUNNING.with(|slot| {
        if let Some(app) = slot.borrow_mut().take() {
            app.teardown();
        }
    });
}
