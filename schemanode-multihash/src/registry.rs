use core::fmt;
use std::collections::BTreeMap;

use crate::{HashFunction, RegistryError, identity, sha2};

/// Builds a fresh hasher.
pub type Constructor = fn() -> Box<dyn HashFunction>;

/// Maps multihash codes to hash constructors.
///
/// Registration is explicit: [`register`](Registry::register) refuses to
/// overwrite an existing code, and [`replace`](Registry::replace) is the only
/// way to swap a constructor out.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: BTreeMap<u64, Constructor>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in family: [`identity`] and [`sha2`].
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        identity::register(&mut registry)?;
        sha2::register(&mut registry)?;
        Ok(registry)
    }

    /// Registers `constructor` under `code`.
    ///
    /// Fails with [`RegistryError::CodeTaken`] if the code is already in use;
    /// the existing constructor stays.
    pub fn register(&mut self, code: u64, constructor: Constructor) -> Result<(), RegistryError> {
        if self.constructors.contains_key(&code) {
            tracing::debug!(code, "hash code already registered");
            return Err(RegistryError::CodeTaken { code });
        }
        self.constructors.insert(code, constructor);
        tracing::trace!(code, "registered hash constructor");
        Ok(())
    }

    /// Registers `constructor` under `code`, returning the constructor it displaced.
    pub fn replace(&mut self, code: u64, constructor: Constructor) -> Option<Constructor> {
        let previous = self.constructors.insert(code, constructor);
        tracing::debug!(code, replaced = previous.is_some(), "replaced hash constructor");
        previous
    }

    /// Removes the constructor registered under `code`.
    pub fn unregister(&mut self, code: u64) -> Result<Constructor, RegistryError> {
        self.constructors
            .remove(&code)
            .ok_or(RegistryError::NoSuchCode { code })
    }

    /// The constructor registered under `code`.
    pub fn get(&self, code: u64) -> Result<Constructor, RegistryError> {
        self.constructors
            .get(&code)
            .copied()
            .ok_or(RegistryError::NoSuchCode { code })
    }

    /// Whether anything is registered under `code`.
    pub fn contains(&self, code: u64) -> bool {
        self.constructors.contains_key(&code)
    }

    /// Registered codes, in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = u64> + '_ {
        self.constructors.keys().copied()
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// A fresh hasher for `code`.
    pub fn new_hasher(&self, code: u64) -> Result<Box<dyn HashFunction>, RegistryError> {
        Ok(self.get(code)?())
    }

    /// Hashes `data` in one go with the function registered under `code`.
    pub fn sum(&self, code: u64, data: &[u8]) -> Result<Vec<u8>, RegistryError> {
        let mut hasher = self.new_hasher(code)?;
        hasher.update(data);
        Ok(hasher.finalize_reset())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.codes().map(|code| format!("{code:#x}")))
            .finish()
    }
}
