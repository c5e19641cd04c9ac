//! Key-value access over the browser's storage areas.
//!
//! [`KeyValueStore`] prefers the synced area and falls back to the local one
//! when the synced area is missing or cannot be read. Once it has fallen back
//! it leaves a marker in the local area, so this and every later page load
//! keep reading and writing locally and never split a value across areas.
//! A write the synced area rejects (quota, item size) is returned to the
//! caller instead: writing that value locally would hide it from the next load.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::cell::Cell;

use crate::error::StoreError;

/// Set in the fallback area once the store has degraded.
pub const DEGRADED_KEY: &str = "foras.storage.degraded";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Sync,
    Local,
}

/// One asynchronous storage area.
#[allow(async_fn_in_trait)]
pub trait StorageArea {
    fn kind(&self) -> AreaKind;

    /// Cheap presence check, done before any access.
    fn is_available(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

pub struct KeyValueStore<A> {
    preferred: A,
    fallback: A,
    degraded: Cell<bool>,
    marker_checked: Cell<bool>,
}

impl<A: StorageArea> KeyValueStore<A> {
    pub fn new(preferred: A, fallback: A) -> Self {
        Self {
            preferred,
            fallback,
            degraded: Cell::new(false),
            marker_checked: Cell::new(false),
        }
    }

    /// The area the next access will try first, as far as is known without
    /// reading the degraded marker.
    pub fn active_kind(&self) -> AreaKind {
        if !self.degraded.get() && self.preferred.is_available() {
            self.preferred.kind()
        } else {
            self.fallback.kind()
        }
    }

    async fn use_preferred(&self) -> bool {
        if self.degraded.get() || !self.preferred.is_available() {
            return false;
        }
        if !self.marker_checked.replace(true) {
            if let Ok(Some(Value::Bool(true))) = self.fallback.get(DEGRADED_KEY).await {
                log::info!(
                    "[notes] an earlier page fell back to {:?} storage; staying there",
                    self.fallback.kind()
                );
                self.degraded.set(true);
                return false;
            }
        }
        true
    }

    async fn degrade(&self, err: &StoreError) {
        log::warn!(
            "[notes] {err}; using {:?} storage from now on",
            self.fallback.kind()
        );
        self.degraded.set(true);
        if let Err(err) = self.fallback.set(DEGRADED_KEY, Value::Bool(true)).await {
            log::warn!("[notes] could not record storage fallback: {err}");
        }
    }

    fn fallback(&self) -> Result<&A, StoreError> {
        if self.fallback.is_available() {
            Ok(&self.fallback)
        } else {
            Err(StoreError::Unavailable(self.fallback.kind()))
        }
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.use_preferred().await {
            match self.preferred.get(key).await {
                Ok(value) => return Ok(value),
                Err(err) => self.degrade(&err).await,
            }
        }
        self.fallback()?.get(key).await
    }

    /// Writes to the area reads come from. A rejection from a reachable
    /// synced area is returned as is.
    pub async fn set_raw(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.use_preferred().await {
            return self.preferred.set(key, value).await;
        }
        self.fallback()?.set(key, value).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => serde_json::from_value(raw)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_value(value).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set_raw(key, raw).await
    }

    /// Read, transform, write back. Last writer wins: two interleaved updates
    /// can drop one result.
    pub async fn update<T, F>(&self, key: &str, f: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let current = self.get::<T>(key).await?;
        let next = f(current);
        self.set(key, &next).await?;
        Ok(next)
    }
}
