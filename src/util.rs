//! Shared utilities for the prmpt codebase

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// A string wrapper that masks its contents in Debug/Display output.
/// Prevents accidental logging of bearer tokens.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Intentionally access the raw secret value (for headers)
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for SecretString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Source of epoch-millisecond timestamps.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Deterministic clock for tests: every read advances by `step` milliseconds.
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
    step: i64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self::with_step(start, 1)
    }

    pub fn with_step(start: i64, step: i64) -> Self {
        Self {
            current: AtomicI64::new(start),
            step,
        }
    }

    pub fn set(&self, value: i64) {
        self.current.store(value, Ordering::SeqCst);
    }

    /// Peek at the next value without advancing.
    pub fn peek(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.current.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Generate an opaque id of the form `{prefix}-{uuid}`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
