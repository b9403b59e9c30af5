#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub use schemanode_core::*;

pub use schemanode_macros::typed_node;

/// Registry of hash function constructors keyed by multihash code.
#[cfg(feature = "multihash")]
pub use schemanode_multihash as multihash;

pub use static_assertions;
