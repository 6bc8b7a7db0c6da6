//! # Balanced-Ternary Curl Proof-of-Work
//!
//! Nonce search for a ternary distributed-ledger transaction format. Given a
//! transaction serialized as trytes, the engine finds a 27-tryte nonce such
//! that the transaction's Curl hash ends in at least `mwm` zero trits, where
//! `mwm` (the minimum weight magnitude) is supplied per call.
//!
//! The crate is built from four layers:
//!
//! - [`trinary`]: trit/tryte validation and conversion, balanced-ternary
//!   arithmetic, and the 243-trit / 48-byte hash codec
//! - [`bigint`]: the 384-bit little-endian limb arithmetic backing the
//!   hash codec
//! - [`curl`]: the 729-trit, 27-round ternary sponge
//! - [`pow`]: the 64-way bit-sliced parallel nonce search, the
//!   implementation registry and the bundle batch driver (`std` only)
//!
//! ## Example
//!
//! ```rust
//! use curl_pow::{go_pow, hash_trytes, TRANSACTION_TRINARY_SIZE};
//!
//! // Hash an arbitrary tryte string with the sponge.
//! let hash = hash_trytes("EXAMPLE9TRYTES").unwrap();
//! assert_eq!(hash.len(), 81);
//!
//! // Search a full-width transaction for a nonce giving 9 trailing zeros.
//! let tx = "9".repeat(TRANSACTION_TRINARY_SIZE / 3);
//! let nonce = go_pow(&tx, 9, None).unwrap();
//! assert_eq!(nonce.len(), 27);
//! ```
//!
//! ## `no_std` support
//!
//! The trinary substrate, the bigint bridge and the sponge only need
//! `alloc`; disable default features to drop the search engine and its
//! worker threads:
//!
//! ```toml
//! [dependencies]
//! curl-pow = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod bigint;
pub mod constants;
pub mod curl;
#[cfg(feature = "std")]
pub mod pow;
pub mod trinary;


pub use constants::*;
pub use curl::{hash_trytes, Curl};
#[cfg(feature = "std")]
pub use pow::{do_pow, go_pow, sync_go_pow, PowFunc, PowRegistry};
pub use trinary::{
    add_trits, bytes_to_trits, int_to_trits, pad_trits, pad_trytes, trailing_zeros, trits_equal,
    trits_to_bytes, trits_to_int, trits_to_trytes, trytes_to_trits, Trit, Trits, Trytes,
};

#[cfg(not(feature = "std"))]
use alloc::string::String;

use thiserror::Error;

/// Error kinds surfaced across the crate's API. Nothing is retried
/// internally; every failure reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A byte outside {-1, 0, +1} where a trit was expected.
    #[error("invalid trit at index {0}")]
    InvalidTrit(usize),
    /// Empty input, or a character outside `[9A-Z]`.
    #[error("invalid trytes")]
    InvalidTrytes,
    /// Trit count not a positive multiple of 3, or not hash-sized where a
    /// hash is required.
    #[error("invalid trits length")]
    InvalidTritsLength,
    /// Byte count other than 48 supplied to the hash codec.
    #[error("invalid bytes length")]
    InvalidBytesLength,
    /// Empty or non-transaction-sized trytes supplied to a Proof-of-Work
    /// func.
    #[error("invalid trytes supplied to Proof-of-Work func")]
    InvalidTrytesForProofOfWork,
    /// Registry lookup for an implementation that was never registered.
    #[error("unknown Proof-of-Work func {0}")]
    UnknownProofOfWorkFunc(String),
    /// Every worker exhausted its stripe of the nonce space without a match.
    #[error("no nonce satisfying the difficulty was found")]
    NonceNotFound,
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
