//! The identity "hash": the digest is the input itself.

use crate::{HashFunction, Registry, RegistryError};

/// Multihash code of the identity function.
pub const IDENTITY: u64 = 0x00;

/// Buffers everything it is fed and hands it back on finalization.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    buffer: Vec<u8>,
}

impl HashFunction for Identity {
    fn update(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.buffer)
    }

    fn output_size(&self) -> Option<usize> {
        None
    }
}

fn identity() -> Box<dyn HashFunction> {
    Box::new(Identity::default())
}

/// Registers the identity function under [`IDENTITY`].
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(IDENTITY, identity)
}
