use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;

use crate::element::filter::{self, FilterDescriptor};

type CacheKey = (String, String);

/// Decoded image sources plus filtered variants of them.
///
/// Sources stay until invalidated, since history can bring any of them back.
/// Filtered variants are recomputable and evicted least recently used first.
pub struct ImageCache {
    sources: HashMap<String, Rc<RgbaImage>>,
    /// Cache of filtered pixels by (src, filter fingerprint)
    filtered: HashMap<CacheKey, Rc<RgbaImage>>,
    /// Tracks when each filtered variant was last used
    last_used: HashMap<CacheKey, u64>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    /// Maximum number of filtered variants to cache
    max_cache_size: usize,
}

impl ImageCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            sources: HashMap::new(),
            filtered: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Increments the frame counter, called at the start of each render
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn insert_source(&mut self, src: impl Into<String>, image: RgbaImage) {
        let src = src.into();
        self.invalidate_source(&src);
        self.sources.insert(src, Rc::new(image));
    }

    pub fn has_source(&self, src: &str) -> bool {
        self.sources.contains_key(src)
    }

    pub fn source(&self, src: &str) -> Option<Rc<RgbaImage>> {
        self.sources.get(src).cloned()
    }

    /// Pixels of `src` with `filters` applied, computing them on a miss
    pub fn filtered(&mut self, src: &str, filters: &[FilterDescriptor]) -> Option<Rc<RgbaImage>> {
        let source = self.source(src)?;
        if filters.is_empty() {
            return Some(source);
        }
        let key = (src.to_owned(), filter::fingerprint(filters));
        if let Some(image) = self.filtered.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Some(image.clone());
        }

        self.prune_cache_if_needed();
        let image = Rc::new(filter::apply_filters(&source, filters));
        self.filtered.insert(key.clone(), image.clone());
        self.last_used.insert(key, self.current_frame);
        Some(image)
    }

    /// Drop a source and every variant derived from it
    pub fn invalidate_source(&mut self, src: &str) {
        self.sources.remove(src);
        self.filtered.retain(|(s, _), _| s != src);
        self.last_used.retain(|(s, _), _| s != src);
    }

    fn prune_cache_if_needed(&mut self) {
        if self.filtered.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(CacheKey, u64)> = self
            .last_used
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by_key(|(_, frame)| *frame);

        // Make room for the entry about to be inserted
        let to_remove = entries.len() + 1 - self.max_cache_size;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.filtered.remove(&key);
            self.last_used.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.filtered.clear();
        self.last_used.clear();
    }

    /// Number of filtered variants currently cached
    pub fn cache_size(&self) -> usize {
        self.filtered.len()
    }
}
