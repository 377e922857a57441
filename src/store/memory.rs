//! In-process JSON tree with the same verbs as the remote store.
//!
//! Used when no store URL is configured and as the backing tree in tests.
//! Empty objects and nulls are pruned, so an emptied path reads back as
//! `null` just like the hosted database.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{path_segments, DocumentStore, StoreError};

pub struct MemoryStore {
    root: Mutex<Value>,
    next_key: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Value::Object(Map::new())),
            next_key: AtomicU64::new(1),
        }
    }

    /// Keys sort in creation order, like push ids.
    fn generate_key(&self) -> String {
        let seq = self.next_key.fetch_add(1, Ordering::Relaxed);
        let suffix = Uuid::new_v4().simple().to_string();
        format!("-{seq:012}{}", &suffix[..8])
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn `node` into an object (dropping any scalar) and borrow its map.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

/// Walk to the object at `segments`, creating objects along the way.
fn object_at<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Map<String, Value> {
    let mut node = root;
    for segment in segments {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node)
}

/// Drop nulls and empty objects, recursively.
fn prune(value: &mut Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => {
            map.retain(|_, child| !prune(child));
            map.is_empty()
        }
        _ => false,
    }
}

fn prune_root(root: &mut Value) {
    if prune(root) {
        *root = Value::Object(Map::new());
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Value, StoreError> {
        let segments = path_segments(path)?;
        let root = self.root.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut node = &*root;
        for segment in segments {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(Value::Null),
            }
        }
        Ok(node.clone())
    }

    fn post(&self, path: &str, body: &Value) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        let key = self.generate_key();
        let mut root = self.root.lock().map_err(|_| StoreError::LockPoisoned)?;
        object_at(&mut root, &segments).insert(key.clone(), body.clone());
        prune_root(&mut root);
        Ok(key)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let fields = body
            .as_object()
            .ok_or_else(|| StoreError::Malformed("PATCH body must be an object".into()))?;
        let mut root = self.root.lock().map_err(|_| StoreError::LockPoisoned)?;
        let target = object_at(&mut root, &segments);
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
        prune_root(&mut root);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Ok(());
        };
        let mut root = self.root.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut node = &mut *root;
        for segment in parents {
            match node.get_mut(*segment) {
                Some(child) => node = child,
                None => return Ok(()),
            }
        }
        if let Value::Object(map) = node {
            map.remove(*leaf);
        }
        prune_root(&mut root);
        Ok(())
    }
}
