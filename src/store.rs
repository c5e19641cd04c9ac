use crate::error::StoreError;
use crate::kv::{KeyValueStore, StorageArea};
use crate::note::{prepend_note, Note};

/// The note collection, persisted newest-first as one value under one key.
pub struct NoteStore<A> {
    kv: KeyValueStore<A>,
    key: String,
}

impl<A: StorageArea> NoteStore<A> {
    pub fn new(kv: KeyValueStore<A>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub async fn load(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.kv.get::<Vec<Note>>(&self.key).await?.unwrap_or_default())
    }

    /// Prepends `note` and returns the stored collection.
    pub async fn prepend(&self, note: Note) -> Result<Vec<Note>, StoreError> {
        self.kv
            .update(&self.key, move |current: Option<Vec<Note>>| {
                prepend_note(current.unwrap_or_default(), note)
            })
            .await
    }
}
