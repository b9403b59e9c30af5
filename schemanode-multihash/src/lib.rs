#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use std::sync::LazyLock;

use parking_lot::RwLock;

mod error;
pub use error::*;

mod registry;
pub use registry::*;

pub mod identity;
pub mod sha2;

/// A hash computation in progress.
pub trait HashFunction: Send {
    /// Feeds more input.
    fn update(&mut self, data: &[u8]);

    /// Returns the digest of everything fed so far and starts over.
    fn finalize_reset(&mut self) -> Vec<u8>;

    /// Digest length in bytes, or `None` when it depends on the input.
    fn output_size(&self) -> Option<usize>;
}

static GLOBAL: LazyLock<RwLock<Registry>> = LazyLock::new(|| {
    let registry = match Registry::with_defaults() {
        Ok(registry) => registry,
        Err(err) => unreachable!("built-in hash families overlap: {err}"),
    };
    tracing::debug!(codes = registry.len(), "initialized global hash registry");
    RwLock::new(registry)
});

/// Registers `constructor` under `code` in the process-wide registry.
///
/// Fails with [`RegistryError::CodeTaken`] if the code is in use, built-in
/// codes included.
pub fn register(code: u64, constructor: Constructor) -> Result<(), RegistryError> {
    GLOBAL.write().register(code, constructor)
}

/// Swaps the constructor under `code` in the process-wide registry.
pub fn replace(code: u64, constructor: Constructor) -> Option<Constructor> {
    GLOBAL.write().replace(code, constructor)
}

/// The constructor registered under `code` in the process-wide registry.
pub fn lookup(code: u64) -> Result<Constructor, RegistryError> {
    GLOBAL.read().get(code)
}

/// A fresh hasher for `code` from the process-wide registry.
pub fn new_hasher(code: u64) -> Result<Box<dyn HashFunction>, RegistryError> {
    let constructor = lookup(code)?;
    Ok(constructor())
}

/// Hashes `data` with the function registered under `code` in the process-wide registry.
pub fn sum(code: u64, data: &[u8]) -> Result<Vec<u8>, RegistryError> {
    let mut hasher = new_hasher(code)?;
    hasher.update(data);
    Ok(hasher.finalize_reset())
}
