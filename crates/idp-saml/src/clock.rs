//! Time and identifier sources.
//!
//! Both are passed explicitly to whatever issues assertions, so tests can pin
//! them without touching process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of unique document identifiers.
///
/// Identifiers must be valid `xs:ID` values, so they never start with a digit.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn new_id(&self) -> String;
}

/// Random identifiers of the form `id-<32 hex digits>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> String {
        format!("id-{}", Uuid::new_v4().simple())
    }
}

/// Predictable identifiers counting up from one.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first identifier is `id-000…001`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("id-{n:032x}")
    }
}
