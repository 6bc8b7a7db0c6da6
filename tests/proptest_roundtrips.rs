//! Property tests for the trinary substrate and the hash codec.

use curl_pow::{
    add_trits, bytes_to_trits, int_to_trits, trits_to_bytes, trits_to_int, trits_to_trytes,
    trytes_to_trits, HASH_TRINARY_SIZE,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn int_to_trits_roundtrips(value in any::<i64>()) {
        prop_assert_eq!(trits_to_int(&int_to_trits(value)), value);
    }

    #[test]
    fn trytes_to_trits_roundtrips(trytes in "[9A-Z]{1,81}") {
        let trits = trytes_to_trits(&trytes).unwrap();
        prop_assert_eq!(trits.len(), trytes.len() * 3);
        prop_assert_eq!(trits_to_trytes(&trits).unwrap(), trytes);
    }

    #[test]
    fn addition_matches_integers(
        a in -1_000_000_000_000i64..1_000_000_000_000,
        b in -1_000_000_000_000i64..1_000_000_000_000,
    ) {
        let sum = add_trits(&int_to_trits(a), &int_to_trits(b));
        prop_assert_eq!(trits_to_int(&sum), a + b);
    }

    #[test]
    fn hash_codec_roundtrips(
        mut trits in proptest::collection::vec(-1i8..=1i8, HASH_TRINARY_SIZE),
    ) {
        // The last trit is not carried across the binary boundary.
        trits[HASH_TRINARY_SIZE - 1] = 0;
        let bytes = trits_to_bytes(&trits).unwrap();
        let decoded = bytes_to_trits(&bytes).unwrap();
        prop_assert_eq!(decoded.to_vec(), trits);
    }
}
