//! Sources for the cache-busting query value appended to import references.

use rand::Rng;

/// Largest value a cache buster can produce.
pub const CACHE_BUSTER_MAX: u16 = 999;

/// Produces the value of the `?z=` query parameter.
///
/// The stage draws one value per blessed file, so every import of the same
/// header agrees.
pub trait CacheBuster: Send + Sync {
    /// Returns a value in `0..=CACHE_BUSTER_MAX`.
    fn next_value(&self) -> u16;
}

/// Draws a uniform random value in `0..=999`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCacheBuster;

impl CacheBuster for RandomCacheBuster {
    fn next_value(&self) -> u16 {
        rand::thread_rng().gen_range(0..=CACHE_BUSTER_MAX)
    }
}

/// Always returns the same value, for reproducible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCacheBuster(pub u16);

impl CacheBuster for FixedCacheBuster {
    fn next_value(&self) -> u16 {
        self.0
    }
}

impl<F> CacheBuster for F
where
    F: Fn() -> u16 + Send + Sync,
{
    fn next_value(&self) -> u16 {
        self()
    }
}
