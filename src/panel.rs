use std::cell::Cell;

use leptos::mount::mount_to;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::error::ExtError;
use crate::insert::insert_into_host;
use crate::note::Note;
use crate::search::filter_notes;

const LIST_ID: &str = "uc-notes-list";

/// Side panel state. The list component is mounted once into the panel
/// container and re-renders from these signals.
pub struct SidePanel {
    document: Document,
    open_class: String,
    notes: ArcRwSignal<Vec<Note>>,
    query: ArcRwSignal<String>,
    mounted: Cell<bool>,
}

impl SidePanel {
    pub fn new(document: Document, open_class: impl Into<String>) -> Self {
        Self {
            document,
            open_class: open_class.into(),
            notes: ArcRwSignal::new(Vec::new()),
            query: ArcRwSignal::new(String::new()),
            mounted: Cell::new(false),
        }
    }

    /// Mounts the list into `#uc-notes-list` inside `container`, creating
    /// that element inside the fetched markup when absent. Whatever an
    /// earlier injection left in the list is replaced.
    pub fn mount(&self, container: &Element) -> Result<(), ExtError> {
        if self.mounted.replace(true) {
            return Ok(());
        }
        let target = match container.query_selector(&format!("#{LIST_ID}"))? {
            Some(existing) => existing,
            None => {
                let list = self.document.create_element("div")?;
                list.set_id(LIST_ID);
                container
                    .first_element_child()
                    .unwrap_or_else(|| container.clone())
                    .append_child(&list)?;
                list
            }
        };
        let target: HtmlElement = target
            .dyn_into()
            .map_err(|_| ExtError::MissingElement(LIST_ID.to_string()))?;
        target.set_inner_html("");

        let notes = self.notes.clone();
        let query = self.query.clone();
        let handle = mount_to(target, move || {
            view! { <NotesList notes=notes.clone() query=query.clone() /> }
        });
        // The panel lives as long as the page.
        std::mem::forget(handle);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.document
            .document_element()
            .is_some_and(|root| root.class_list().contains(&self.open_class))
    }

    pub fn set_open(&self, open: bool) {
        if let Some(root) = self.document.document_element() {
            let _ = root.class_list().toggle_with_force(&self.open_class, open);
        }
    }

    pub fn set_notes(&self, notes: Vec<Note>) {
        self.notes.set(notes);
    }
}

#[component]
fn NotesList(notes: ArcRwSignal<Vec<Note>>, query: ArcRwSignal<String>) -> impl IntoView {
    let query_value = query.clone();
    let query_input = query.clone();
    let visible = move || {
        let needle = query.get();
        notes.with(|all| {
            filter_notes(all, &needle)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
    };

    view! {
        <div class="foras-panel-body">
            <div class="foras-field">
                <input
                    id="foras-search"
                    type="text"
                    placeholder="Search..."
                    prop:value=move || query_value.get()
                    on:input=move |ev| query_input.set(event_target_value(&ev))
                />
            </div>
            <div id="foras-list">
                {move || {
                    visible()
                        .into_iter()
                        .map(|note| view! { <NoteItem note=note /> })
                        .collect::<Vec<_>>()
                }}
            </div>
        </div>
    }
}

#[component]
fn NoteItem(note: Note) -> impl IntoView {
    let content = note.content.clone();
    let tags = note.tags.join(", ");
    view! {
        <div
            class="foras-note"
            title=note.content.clone()
            on:click=move |_| insert_into_host(&content)
        >
            <strong>{note.title}</strong>
            <div class="foras-note-tags" style="opacity: .7; font-size: 12px; margin-top: 4px;">
                {tags}
            </div>
        </div>
    }
}
