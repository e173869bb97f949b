//! Per-model texture deduplication.

use std::collections::HashMap;

/// Maps the path string a material uses for a texture to the handle uploaded for it.
///
/// Keys are compared as written in the asset: `a.png` and `./a.png` are two
/// entries. One cache belongs to exactly one model, so two models never share
/// handles even when they load the same files.
#[derive(Clone, Debug)]
pub struct TextureCache<T> {
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Clone> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&T> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Returns the cached handle for `path`, or uploads one with `load` and caches it.
    ///
    /// `load` runs at most once per distinct path. A failed load caches nothing.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        path: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some(handle) = self.entries.get(path) {
            return Ok(handle.clone());
        }
        let handle = load()?;
        self.entries.insert(path.to_string(), handle.clone());
        self.order.push(path.to_string());
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached paths in the order they were first uploaded.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|path| self.entries.get(path).map(|handle| (path.as_str(), handle)))
    }
}
