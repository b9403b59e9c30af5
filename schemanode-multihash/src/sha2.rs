//! The SHA-2 family, backed by the RustCrypto `sha2` crate.

use ::sha2::digest::FixedOutputReset;
use ::sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};

use crate::{Constructor, HashFunction, Registry, RegistryError};

/// Multihash code of SHA2-256.
pub const SHA2_256: u64 = 0x12;
/// Multihash code of SHA2-512.
pub const SHA2_512: u64 = 0x13;
/// Multihash code of SHA2-384.
pub const SHA2_384: u64 = 0x20;
/// Multihash code of SHA2-224.
pub const SHA2_224: u64 = 0x1013;
/// Multihash code of SHA2-512/224.
pub const SHA2_512_224: u64 = 0x1014;
/// Multihash code of SHA2-512/256.
pub const SHA2_512_256: u64 = 0x1015;

struct Sha2<D>(D);

impl<D> HashFunction for Sha2<D>
where
    D: Digest + FixedOutputReset + Send,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        Digest::finalize_reset(&mut self.0).to_vec()
    }

    fn output_size(&self) -> Option<usize> {
        Some(<D as Digest>::output_size())
    }
}

fn constructor<D>() -> Box<dyn HashFunction>
where
    D: Digest + FixedOutputReset + Default + Send + 'static,
{
    Box::new(Sha2(D::default()))
}

const FAMILY: [(u64, Constructor); 6] = [
    (SHA2_256, constructor::<Sha256>),
    (SHA2_512, constructor::<Sha512>),
    (SHA2_384, constructor::<Sha384>),
    (SHA2_224, constructor::<Sha224>),
    (SHA2_512_224, constructor::<Sha512_224>),
    (SHA2_512_256, constructor::<Sha512_256>),
];

/// Registers every SHA-2 variant.
///
/// Stops at the first code that is already taken; variants registered before
/// it stay registered.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    for (code, constructor) in FAMILY {
        registry.register(code, constructor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_sizes() {
        let sizes: Vec<_> = FAMILY
            .iter()
            .map(|(code, constructor)| (*code, constructor().output_size()))
            .collect();
        assert_eq!(
            sizes,
            [
                (SHA2_256, Some(32)),
                (SHA2_512, Some(64)),
                (SHA2_384, Some(48)),
                (SHA2_224, Some(28)),
                (SHA2_512_224, Some(28)),
                (SHA2_512_256, Some(32)),
            ]
        );
    }

    #[test]
    fn finalize_resets_state() {
        let mut hasher = constructor::<Sha256>();
        hasher.update(b"abc");
        let first = hasher.finalize_reset();
        hasher.update(b"abc");
        assert_eq!(hasher.finalize_reset(), first);
    }
}
