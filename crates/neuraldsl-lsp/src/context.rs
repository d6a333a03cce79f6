//! Process-wide validation context.
//!
//! One context is created per server and shared by reference. It owns the
//! diagnostic cache, the debounce scheduler and the current options, so
//! nothing about validation lives in global state.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use neuraldsl_core::{Analysis, DiagnosticCache, ValidationOptions, Validator};

use crate::debounce::Debouncer;

pub struct ValidationContext {
    cache: DiagnosticCache,
    debouncer: Debouncer,
    validator: RwLock<Arc<Validator>>,
}

impl ValidationContext {
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            cache: DiagnosticCache::new(),
            debouncer: Debouncer::new(Duration::from_millis(options.debounce_ms)),
            validator: RwLock::new(Arc::new(Validator::new(options))),
        }
    }

    fn validator(&self) -> Arc<Validator> {
        Arc::clone(&self.validator.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Snapshot of the current options.
    pub fn options(&self) -> ValidationOptions {
        self.validator().options().clone()
    }

    /// Replace the options. Cached results were computed under the old
    /// options, so the cache is dropped.
    pub fn set_options(&self, options: ValidationOptions) {
        self.debouncer
            .set_delay(Duration::from_millis(options.debounce_ms));
        let validator = Arc::new(Validator::new(options));
        *self.validator.write().unwrap_or_else(PoisonError::into_inner) = validator;
        self.cache.clear();
        log::info!("Validation options updated; cache cleared");
    }

    /// Analysis of `version` of a document, served from the cache when the
    /// version is unchanged.
    pub fn validate(&self, document_id: &str, text: &str, version: i32) -> Arc<Analysis> {
        let validator = self.validator();
        self.cache.get_or_compute(document_id, version, text, &validator)
    }

    /// Like [`validate`](Self::validate) for a run that may race with the
    /// document closing. When `is_open` reports the document gone after the
    /// analysis, the cache entry is dropped again and `None` is returned.
    pub fn validate_if_open(
        &self,
        document_id: &str,
        text: &str,
        version: i32,
        is_open: impl Fn() -> bool,
    ) -> Option<Arc<Analysis>> {
        let analysis = self.validate(document_id, text, version);
        if is_open() {
            Some(analysis)
        } else {
            log::debug!("{} closed during validation; dropping result", document_id);
            self.cache.invalidate(document_id);
            None
        }
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn cache(&self) -> &DiagnosticCache {
        &self.cache
    }

    /// Forget everything about a closed document.
    pub fn close(&self, document_id: &str) {
        self.debouncer.cancel(document_id);
        self.cache.invalidate(document_id);
    }
}
