//! Per-document analysis cache.
//!
//! Each document keeps at most one cached [`Analysis`], tagged with the
//! version it was computed for. A lookup with the same version returns the
//! shared result without re-scanning; any other version recomputes and
//! replaces it.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::validation::{Analysis, Validator};

#[derive(Debug, Clone)]
struct CacheEntry {
    version: i32,
    analysis: Arc<Analysis>,
}

/// Thread-safe cache of analyses keyed by document identifier.
#[derive(Debug, Default)]
pub struct DiagnosticCache {
    entries: DashMap<String, CacheEntry>,
    computations: AtomicUsize,
}

impl DiagnosticCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the analysis for `version` of a document, computing it if the
    /// cached one is missing or stale.
    pub fn get_or_compute(
        &self,
        document_id: &str,
        version: i32,
        text: &str,
        validator: &Validator,
    ) -> Arc<Analysis> {
        if let Some(entry) = self.entries.get(document_id) {
            if entry.version == version {
                log::trace!("Cache hit for {} v{}", document_id, version);
                return Arc::clone(&entry.analysis);
            }
        }

        let analysis = Arc::new(validator.analyze_document(document_id, text));
        self.computations.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Analyzed {} v{}: {} diagnostics",
            document_id,
            version,
            analysis.diagnostics.len()
        );

        self.entries.insert(
            document_id.to_string(),
            CacheEntry {
                version,
                analysis: Arc::clone(&analysis),
            },
        );
        analysis
    }

    /// Cached analysis for a document, regardless of version.
    pub fn get(&self, document_id: &str) -> Option<Arc<Analysis>> {
        self.entries.get(document_id).map(|e| Arc::clone(&e.analysis))
    }

    /// Version the cached analysis was computed for.
    #[cfg(test)]
    pub(crate) fn cached_version(&self, document_id: &str) -> Option<i32> {
        self.entries.get(document_id).map(|e| e.version)
    }

    pub fn invalidate(&self, document_id: &str) {
        self.entries.remove(document_id);
    }

    /// Drop every entry, e.g. after the options changed.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of analyses actually computed so far.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ValidationOptions;

    const DOC: &str = "file:///model.neural";

    #[test]
    fn test_same_version_is_served_from_cache() {
        let cache = DiagnosticCache::new();
        let validator = Validator::default();

        let first = cache.get_or_compute(DOC, 1, "model T { Dense() }", &validator);
        // Different text under the same version still hits the cache.
        let second = cache.get_or_compute(DOC, 1, "", &validator);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_new_version_recomputes() {
        let cache = DiagnosticCache::new();
        let validator = Validator::default();

        let first = cache.get_or_compute(DOC, 1, "model T { Dense() }", &validator);
        let second = cache.get_or_compute(DOC, 2, "", &validator);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computations(), 2);
        assert_eq!(cache.cached_version(DOC), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = DiagnosticCache::new();
        let validator = Validator::default();

        cache.get_or_compute(DOC, 1, "", &validator);
        cache.get_or_compute("file:///other.neural", 1, "", &validator);
        cache.invalidate(DOC);
        assert!(cache.get(DOC).is_none());
        assert_eq!(cache.len(), 1);

        cache.get_or_compute(DOC, 1, "", &validator);
        assert_eq!(cache.computations(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ignored_documents_are_cached_without_diagnostics() {
        let cache = DiagnosticCache::new();
        let validator = Validator::new(ValidationOptions {
            ignore_patterns: vec![r"\.gen\.neural$".to_string()],
            ..Default::default()
        });

        let ignored = cache.get_or_compute("file:///m.gen.neural", 1, "model T { Dense() }", &validator);
        assert!(ignored.diagnostics.is_empty());
        assert_eq!(ignored.structure.models.len(), 1);

        let checked = cache.get_or_compute("file:///m.neural", 1, "model T { Dense() }", &validator);
        assert!(!checked.diagnostics.is_empty());
    }

    #[test]
    fn test_documents_are_cached_independently() {
        let cache = DiagnosticCache::new();
        let validator = Validator::default();

        let a = cache.get_or_compute("a", 1, "", &validator);
        let b = cache.get_or_compute("b", 1, "model T { Dense() }", &validator);
        assert_ne!(a.diagnostics, b.diagnostics);
        assert!(Arc::ptr_eq(&a, &cache.get_or_compute("a", 1, "", &validator)));
    }
}
