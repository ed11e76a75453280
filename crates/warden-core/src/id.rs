//! Unique identifier generation for token ids (`jti`).

use uuid::Uuid;

/// Produces identifiers that are unique with overwhelming probability.
///
/// Every identifier starts with the given prefix. Implemented for any
/// `Fn(&str) -> String`, which keeps test fakes short.
pub trait IdGenerator: Send + Sync {
    /// Generate a new identifier beginning with `prefix`.
    fn generate(&self, prefix: &str) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate(&self, prefix: &str) -> String {
        self(prefix)
    }
}

/// Default generator: the prefix followed by an uppercase hyphenated UUID.
///
/// Monotonic generators use UUIDv7 so identifiers sort by creation time;
/// otherwise UUIDv4 is used.
#[derive(Debug, Clone, Copy)]
pub struct RidGenerator {
    monotonic: bool,
}

impl RidGenerator {
    /// Create a generator.
    pub fn new(monotonic: bool) -> Self {
        Self { monotonic }
    }

    /// Whether identifiers are time-ordered.
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }
}

impl Default for RidGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IdGenerator for RidGenerator {
    fn generate(&self, prefix: &str) -> String {
        let id = if self.monotonic {
            Uuid::now_v7()
        } else {
            Uuid::new_v4()
        };
        let mut buf = Uuid::encode_buffer();
        format!("{}{}", prefix, id.hyphenated().encode_upper(&mut buf))
    }
}
