//! ID generation.
//!
//! The ID service is an external collaborator: a producer of opaque
//! strings, deduplicated against the live block map by the graph manager.
//! We model its contract as a trait so a real ID microservice can be
//! injected in place of [`ShortIdGenerator`], and so tests can seed a
//! deterministic generator instead.

use std::sync::atomic::{AtomicU64, Ordering};

/// A source of opaque, short identifiers. Implementations need not worry
/// about uniqueness against the live graph — [`crate::manager::GraphManager`]
/// loops on [`IdGenerator::next_id`] until it finds one that is free.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Default generator: short, opaque, base36 tokens derived from a UUID v4.
/// Stateless with respect to graph liveness, as required by §4.6.
#[derive(Debug, Default)]
pub struct ShortIdGenerator;

impl IdGenerator for ShortIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
    }
}

/// Deterministic generator for tests: yields `prefix-0`, `prefix-1`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_non_empty_and_distinct() {
        let gen = ShortIdGenerator;
        let a = gen.next_id();
        let b = gen.next_id();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn sequential_ids_increment() {
        let gen = SequentialIdGenerator::new("id");
        assert_eq!(gen.next_id(), "id-0");
        assert_eq!(gen.next_id(), "id-1");
    }
}
