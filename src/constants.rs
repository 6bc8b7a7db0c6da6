//! Ledger-format constants shared by the trinary substrate, the sponge and
//! the nonce search.

use crate::trinary::Trit;

/// Radix of the balanced-ternary numeral system.
pub const TRINARY_RADIX: i64 = 3;
/// Smallest value a trit can hold.
pub const MIN_TRIT_VALUE: Trit = -1;
/// Largest value a trit can hold.
pub const MAX_TRIT_VALUE: Trit = 1;

/// The 27 tryte symbols. Index `k` encodes the 3-trit little-endian group
/// whose integer value is `((k + 13) mod 27) - 13`.
pub const TRYTE_ALPHABET: &str = "9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Trit length of a hash.
pub const HASH_TRINARY_SIZE: usize = 243;
/// Byte length of a hash moved across the binary boundary.
pub const HASH_BYTES_SIZE: usize = 48;
/// Trit length of the nonce field at the tail of a transaction.
pub const NONCE_TRINARY_SIZE: usize = 81;
/// Limb count of the 384-bit integers behind the hash codec (32-bit limbs).
pub const INT_LENGTH: usize = 12;

/// Trit length of a serialized transaction.
pub const TRANSACTION_TRINARY_SIZE: usize = 8019;

/// Trit offset of the trunk transaction hash field.
pub const TRUNK_TRANSACTION_TRINARY_OFFSET: usize = 7290;
/// Trit size of the trunk transaction hash field.
pub const TRUNK_TRANSACTION_TRINARY_SIZE: usize = 243;
/// Trit offset of the branch transaction hash field.
pub const BRANCH_TRANSACTION_TRINARY_OFFSET: usize = 7533;
/// Trit size of the branch transaction hash field.
pub const BRANCH_TRANSACTION_TRINARY_SIZE: usize = 243;
/// Trit offset of the attachment timestamp field.
pub const ATTACHMENT_TIMESTAMP_TRINARY_OFFSET: usize = 7857;
/// Trit size of the attachment timestamp field.
pub const ATTACHMENT_TIMESTAMP_TRINARY_SIZE: usize = 27;
/// Trit offset of the attachment timestamp lower bound field.
pub const ATTACHMENT_TIMESTAMP_LOWER_BOUND_TRINARY_OFFSET: usize = 7884;
/// Trit offset of the attachment timestamp upper bound field.
pub const ATTACHMENT_TIMESTAMP_UPPER_BOUND_TRINARY_OFFSET: usize = 7911;
/// Trit offset of the nonce field.
pub const NONCE_TRINARY_OFFSET: usize = 7938;

/// Value patched into the attachment timestamp lower bound field.
pub const LOWER_BOUND_ATTACHMENT_TIMESTAMP: i64 = 0;
/// Value patched into the attachment timestamp upper bound field: the
/// largest 27-trit value, `(3^27 - 1) / 2`.
pub const UPPER_BOUND_ATTACHMENT_TIMESTAMP: i64 = 3_812_798_742_493;

/// Tryte-to-trits lookup table. Row `k` holds the little-endian trit group
/// of the `k`-th alphabet symbol.
pub const TRYTE_TO_TRITS_LUT: [[Trit; 3]; 27] = [
    [0, 0, 0],
    [1, 0, 0],
    [-1, 1, 0],
    [0, 1, 0],
    [1, 1, 0],
    [-1, -1, 1],
    [0, -1, 1],
    [1, -1, 1],
    [-1, 0, 1],
    [0, 0, 1],
    [1, 0, 1],
    [-1, 1, 1],
    [0, 1, 1],
    [1, 1, 1],
    [-1, -1, -1],
    [0, -1, -1],
    [1, -1, -1],
    [-1, 0, -1],
    [0, 0, -1],
    [1, 0, -1],
    [-1, 1, -1],
    [0, 1, -1],
    [1, 1, -1],
    [-1, -1, 0],
    [0, -1, 0],
    [1, -1, 0],
    [-1, 0, 0],
];
