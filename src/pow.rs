//! Parallel Proof-of-Work nonce search.
//!
//! [`go_pow`] evaluates 64 nonce candidates per sponge pass by packing one
//! trit into two bits spread across two `u64` words, so every word-level
//! operation of the permutation scores 64 nonces at once. Workers cover
//! disjoint stripes of the nonce space and share nothing but a cancellation
//! flag and a single-slot result channel; the first worker to publish wins
//! and the rest drop out.
//!
//! [`sync_go_pow`] is the same search serialized by a process-wide mutex,
//! for callers that must bound concurrent CPU use. Both are registered in
//! [`PowRegistry`], which can also resolve the fastest available
//! implementation so accelerated variants registered at startup take
//! precedence over the portable search.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::constants::{
    ATTACHMENT_TIMESTAMP_LOWER_BOUND_TRINARY_OFFSET, ATTACHMENT_TIMESTAMP_TRINARY_OFFSET,
    ATTACHMENT_TIMESTAMP_TRINARY_SIZE, ATTACHMENT_TIMESTAMP_UPPER_BOUND_TRINARY_OFFSET,
    BRANCH_TRANSACTION_TRINARY_OFFSET, HASH_TRINARY_SIZE, LOWER_BOUND_ATTACHMENT_TIMESTAMP,
    NONCE_TRINARY_OFFSET, NONCE_TRINARY_SIZE, TRANSACTION_TRINARY_SIZE,
    TRUNK_TRANSACTION_TRINARY_OFFSET, TRUNK_TRANSACTION_TRINARY_SIZE,
    UPPER_BOUND_ATTACHMENT_TIMESTAMP,
};
use crate::curl::{hash_trytes, Curl, INDICES, NUMBER_OF_ROUNDS, STATE_SIZE};
use crate::trinary::{
    int_to_trits, pad_trits, trits_to_trytes, trytes_to_trits, validate_trytes, Trit, Trits,
    Trytes,
};
use crate::{Error, Result};

/// Signature shared by every Proof-of-Work implementation.
pub type PowFunc = fn(&str, usize, Option<usize>) -> Result<Trytes>;

const H_BITS: u64 = u64::MAX;
const L_BITS: u64 = 0;

// Seeds for the first four nonce trits: across the 64 bit positions they
// enumerate 64 distinct ternary prefixes, keeping the lanes of one worker
// unique.
const LOW_0: u64 = 0xDB6D_B6DB_6DB6_DB6D;
const HIGH_0: u64 = 0xB6DB_6DB6_DB6D_B6DB;
const LOW_1: u64 = 0xF1F8_FC7E_3F1F_8FC7;
const HIGH_1: u64 = 0x8FC7_E3F1_F8FC_7E3F;
const LOW_2: u64 = 0x7FFF_E00F_FFFC_01FF;
const HIGH_2: u64 = 0xFFC0_1FFF_F803_FFFF;
const LOW_3: u64 = 0xFFC0_0000_07FF_FFFF;
const HIGH_3: u64 = 0x003F_FFFF_FFFF_FFFF;

const NONCE_OFFSET: usize = HASH_TRINARY_SIZE - NONCE_TRINARY_SIZE;
const NONCE_INIT_START: usize = NONCE_OFFSET + 4;
const NONCE_INCREMENT_START: usize = NONCE_INIT_START + NONCE_TRINARY_SIZE / 3;

/// Bit-slices a sponge state: trit -1 becomes `(1, 0)`, 0 becomes `(1, 1)`
/// and +1 becomes `(0, 1)` in every bit position of the `(low, high)` pair.
/// The fourth pair `(0, 0)` never occurs in a valid state.
pub(crate) fn para(state: &[Trit; STATE_SIZE]) -> ([u64; STATE_SIZE], [u64; STATE_SIZE]) {
    let mut low = [0u64; STATE_SIZE];
    let mut high = [0u64; STATE_SIZE];
    for (i, &trit) in state.iter().enumerate() {
        match trit {
            0 => {
                low[i] = H_BITS;
                high[i] = H_BITS;
            }
            1 => {
                low[i] = L_BITS;
                high[i] = H_BITS;
            }
            -1 => {
                low[i] = H_BITS;
                high[i] = L_BITS;
            }
            _ => debug_assert!(false, "invalid trit in sponge state"),
        }
    }
    (low, high)
}

/// Advances the restricted counter window `n` times, offsetting this
/// worker's stripe from its siblings'.
fn incr_n(n: usize, lmid: &mut [u64; STATE_SIZE], hmid: &mut [u64; STATE_SIZE]) {
    for _ in 0..n {
        let mut carry = 1u64;
        let mut i = NONCE_INIT_START;
        while i < NONCE_INCREMENT_START && carry != 0 {
            let low = lmid[i];
            let high = hmid[i];
            lmid[i] = high ^ low;
            hmid[i] = low;
            carry = high & !low;
            i += 1;
        }
    }
}

/// Ternary +1 over the whole nonce window, applied to all 64 lanes at once:
/// -1 -> 0, 0 -> +1, +1 -> -1 with carry. Returns true when the carry runs
/// off the top, i.e. the stripe is exhausted.
fn incr(lmid: &mut [u64; STATE_SIZE], hmid: &mut [u64; STATE_SIZE]) -> bool {
    let mut carry = 1u64;
    let mut i = NONCE_INIT_START;
    while i < HASH_TRINARY_SIZE && carry != 0 {
        let low = lmid[i];
        let high = hmid[i];
        lmid[i] = high ^ low;
        hmid[i] = low;
        carry = high & !low;
        i += 1;
    }
    i == HASH_TRINARY_SIZE
}

/// The 27-round permutation over the bit-sliced state; the boolean algebra
/// is the lane-wise equivalent of the scalar S-box.
pub(crate) fn transform64(lmid: &mut [u64; STATE_SIZE], hmid: &mut [u64; STATE_SIZE]) {
    let mut ltmp = [0u64; STATE_SIZE];
    let mut htmp = [0u64; STATE_SIZE];
    {
        let mut lfrom: &mut [u64; STATE_SIZE] = &mut *lmid;
        let mut hfrom: &mut [u64; STATE_SIZE] = &mut *hmid;
        let mut lto: &mut [u64; STATE_SIZE] = &mut ltmp;
        let mut hto: &mut [u64; STATE_SIZE] = &mut htmp;

        for _ in 0..NUMBER_OF_ROUNDS {
            for j in 0..STATE_SIZE {
                let t1 = INDICES[j];
                let t2 = INDICES[j + 1];

                let alpha = lfrom[t1];
                let beta = hfrom[t1];
                let gamma = hfrom[t2];
                let delta = (alpha | !gamma) & (lfrom[t2] ^ beta);

                lto[j] = !delta;
                hto[j] = (alpha ^ gamma) | delta;
            }
            core::mem::swap(&mut lfrom, &mut lto);
            core::mem::swap(&mut hfrom, &mut hto);
        }
    }
    // With an odd round count the final state sits in the scratch buffers.
    lmid.copy_from_slice(&ltmp);
    hmid.copy_from_slice(&htmp);
}

/// Scores all 64 lanes at once. Zero trits are encoded `(1, 1)`, so a lane
/// satisfies the difficulty iff `low ^ high` is clear across the trailing
/// `mwm` positions. Returns the lowest satisfying bit position, if any.
fn check(low: &[u64; STATE_SIZE], high: &[u64; STATE_SIZE], mwm: usize) -> Option<u32> {
    let mut probe = H_BITS;
    for i in HASH_TRINARY_SIZE - mwm..HASH_TRINARY_SIZE {
        probe &= !(low[i] ^ high[i]);
        if probe == 0 {
            return None;
        }
    }
    Some(probe.trailing_zeros())
}

/// Deserializes the nonce at bit position `n` back into trits.
fn seri(low: &[u64; STATE_SIZE], high: &[u64; STATE_SIZE], n: u32) -> Trits {
    let mut nonce = vec![0 as Trit; NONCE_TRINARY_SIZE];
    for i in NONCE_OFFSET..HASH_TRINARY_SIZE {
        let l = (low[i] >> n) & 1;
        let h = (high[i] >> n) & 1;
        nonce[i - NONCE_OFFSET] = match (l, h) {
            (1, 0) => -1,
            (1, 1) => 0,
            (0, 1) => 1,
            _ => {
                debug_assert!(false, "invalid bit pair in nonce lane");
                0
            }
        };
    }
    nonce
}

/// One worker's hot loop: increment, permute a scratch copy, score. Returns
/// the winning nonce (if this stripe held one) and the number of candidates
/// tried.
fn search(
    lmid: &mut [u64; STATE_SIZE],
    hmid: &mut [u64; STATE_SIZE],
    mwm: usize,
    cancelled: &AtomicBool,
) -> (Option<Trits>, u64) {
    let mut tried: u64 = 0;

    while !incr(lmid, hmid) && !cancelled.load(Ordering::Relaxed) {
        tried += 64;
        let mut lcpy = *lmid;
        let mut hcpy = *hmid;
        transform64(&mut lcpy, &mut hcpy);

        if let Some(n) = check(&lcpy, &hcpy, mwm) {
            return (Some(seri(lmid, hmid, n)), tried);
        }
    }
    (None, tried)
}

fn resolve_parallelism(parallelism: Option<usize>) -> usize {
    match parallelism {
        Some(n) if n > 0 => n,
        _ => (num_cpus::get() - 1).max(1),
    }
}

/// Portable Proof-of-Work: finds a 27-tryte nonce such that the Curl hash of
/// `trytes`, with its nonce field replaced by the result, ends in at least
/// `mwm` zero trits.
///
/// `trytes` must be a full-width transaction; empty or mis-sized input is
/// rejected with [`Error::InvalidTrytesForProofOfWork`]. A `parallelism` of
/// `None` or `Some(0)` resolves to one worker per logical CPU, minus one.
///
/// # Panics
///
/// Panics if `mwm` exceeds the hash length of 243 trits.
pub fn go_pow(trytes: &str, mwm: usize, parallelism: Option<usize>) -> Result<Trytes> {
    if trytes.len() != TRANSACTION_TRINARY_SIZE / 3 {
        return Err(Error::InvalidTrytesForProofOfWork);
    }
    assert!(mwm <= HASH_TRINARY_SIZE, "mwm cannot exceed the hash length");

    let trits = trytes_to_trits(trytes)?;

    // Absorb everything up to the final hash-sized block, then lay that
    // block over the head of the state; the per-candidate transform inside
    // the search completes the hash.
    let mut curl = Curl::new();
    curl.absorb(&trytes[..(TRANSACTION_TRINARY_SIZE - HASH_TRINARY_SIZE) / 3])?;
    curl.state[..HASH_TRINARY_SIZE]
        .copy_from_slice(&trits[TRANSACTION_TRINARY_SIZE - HASH_TRINARY_SIZE..]);

    let workers = resolve_parallelism(parallelism);
    debug!(workers, mwm, "starting nonce search");

    let cancelled = Arc::new(AtomicBool::new(false));
    let hashes = Arc::new(AtomicU64::new(0));
    let (sender, receiver) = mpsc::sync_channel::<Trits>(1);
    let state = curl.state;

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let cancelled = Arc::clone(&cancelled);
        let hashes = Arc::clone(&hashes);
        let sender = sender.clone();

        handles.push(thread::spawn(move || {
            let (mut lmid, mut hmid) = para(&state);
            lmid[NONCE_OFFSET] = LOW_0;
            hmid[NONCE_OFFSET] = HIGH_0;
            lmid[NONCE_OFFSET + 1] = LOW_1;
            hmid[NONCE_OFFSET + 1] = HIGH_1;
            lmid[NONCE_OFFSET + 2] = LOW_2;
            hmid[NONCE_OFFSET + 2] = HIGH_2;
            lmid[NONCE_OFFSET + 3] = LOW_3;
            hmid[NONCE_OFFSET + 3] = HIGH_3;
            incr_n(worker, &mut lmid, &mut hmid);

            let (nonce, tried) = search(&mut lmid, &mut hmid, mwm, &cancelled);
            hashes.fetch_add(tried, Ordering::Relaxed);

            if let Some(nonce) = nonce {
                // First publisher wins; everyone else observes the flag and
                // drops out without sending.
                if !cancelled.swap(true, Ordering::SeqCst) {
                    let _ = sender.send(nonce);
                }
            }
        }));
    }
    drop(sender);

    let nonce = receiver.recv().map_err(|_| Error::NonceNotFound);
    cancelled.store(true, Ordering::SeqCst);
    for handle in handles {
        let _ = handle.join();
    }
    debug!(
        hashes = hashes.load(Ordering::Relaxed),
        "nonce search finished"
    );

    trits_to_trytes(&nonce?)
}

static SYNC_SEARCH: Mutex<()> = Mutex::new(());

/// Like [`go_pow`], but serialized process-wide so at most one search runs
/// at a time.
pub fn sync_go_pow(trytes: &str, mwm: usize, parallelism: Option<usize>) -> Result<Trytes> {
    let _guard = SYNC_SEARCH
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    go_pow(trytes, mwm, parallelism)
}

/// Preference order used by [`PowRegistry::fastest`]; accelerated variants
/// registered under these names take precedence over the portable search.
const FASTEST_ORDER: [&str; 6] = [
    "SyncAVX",
    "SyncSSE",
    "SyncCARM64",
    "SyncC128",
    "SyncC",
    "SyncGo",
];

/// Mapping of Proof-of-Work implementations, keyed by name.
///
/// Populated at startup and read-only afterwards; pass it by reference
/// rather than reaching for global state.
pub struct PowRegistry {
    funcs: BTreeMap<&'static str, PowFunc>,
}

impl PowRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        PowRegistry {
            funcs: BTreeMap::new(),
        }
    }

    /// Registers an implementation under `name`, replacing any previous one.
    pub fn register(&mut self, name: &'static str, func: PowFunc) {
        self.funcs.insert(name, func);
    }

    /// Looks up an implementation by name.
    pub fn get(&self, name: &str) -> Result<PowFunc> {
        self.funcs
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownProofOfWorkFunc(name.to_string()))
    }

    /// Names of every registered implementation, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.funcs.keys().copied().collect()
    }

    /// The first implementation present in the preference order, falling
    /// back to the portable synchronized search.
    pub fn fastest(&self) -> (&'static str, PowFunc) {
        for name in FASTEST_ORDER {
            if let Some(&func) = self.funcs.get(name) {
                return (name, func);
            }
        }
        ("SyncGo", sync_go_pow as PowFunc)
    }
}

impl Default for PowRegistry {
    /// The portable implementations: `"Go"` and its serialized `"SyncGo"`
    /// twin.
    fn default() -> Self {
        let mut registry = PowRegistry::new();
        registry.register("Go", go_pow as PowFunc);
        registry.register("SyncGo", sync_go_pow as PowFunc);
        registry
    }
}

/// Runs `pow` over an ordered bundle of transactions, highest index first,
/// chaining each transaction to the previous one's hash through its trunk
/// field and stamping the attachment timestamp fields.
///
/// The first transaction approves `trunk` and `branch` directly; every later
/// one approves the previous transaction's hash and `trunk`. The attachment
/// timestamp is taken fresh for each transaction, so a bundle records when
/// each individual search finished rather than when the batch started.
pub fn do_pow(
    trunk: &str,
    branch: &str,
    trytes: &[Trytes],
    mwm: usize,
    pow: PowFunc,
) -> Result<Vec<Trytes>> {
    validate_hash_trytes(trunk)?;
    validate_hash_trytes(branch)?;

    let mut powed = Vec::with_capacity(trytes.len());
    let mut prev = Trytes::new();

    for (i, tx) in trytes.iter().enumerate() {
        if tx.len() != TRANSACTION_TRINARY_SIZE / 3 {
            return Err(Error::InvalidTrytes);
        }
        validate_trytes(tx)?;

        let mut tx = tx.clone();
        if i == 0 {
            patch(&mut tx, TRUNK_TRANSACTION_TRINARY_OFFSET, trunk);
            patch(&mut tx, BRANCH_TRANSACTION_TRINARY_OFFSET, branch);
        } else {
            patch(&mut tx, TRUNK_TRANSACTION_TRINARY_OFFSET, &prev);
            patch(&mut tx, BRANCH_TRANSACTION_TRINARY_OFFSET, trunk);
        }

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        patch(
            &mut tx,
            ATTACHMENT_TIMESTAMP_TRINARY_OFFSET,
            &timestamp_trytes(now_ms)?,
        );
        patch(
            &mut tx,
            ATTACHMENT_TIMESTAMP_LOWER_BOUND_TRINARY_OFFSET,
            &timestamp_trytes(LOWER_BOUND_ATTACHMENT_TIMESTAMP)?,
        );
        patch(
            &mut tx,
            ATTACHMENT_TIMESTAMP_UPPER_BOUND_TRINARY_OFFSET,
            &timestamp_trytes(UPPER_BOUND_ATTACHMENT_TIMESTAMP)?,
        );

        let nonce = pow(&tx, mwm, None)?;
        patch(&mut tx, NONCE_TRINARY_OFFSET, &nonce);

        prev = hash_trytes(&tx)?;
        debug!(index = i, hash = %prev, "attached transaction");
        powed.push(tx);
    }
    Ok(powed)
}

/// Encodes a timestamp as its 9-tryte field representation.
fn timestamp_trytes(value: i64) -> Result<Trytes> {
    trits_to_trytes(&pad_trits(
        &int_to_trits(value),
        ATTACHMENT_TIMESTAMP_TRINARY_SIZE,
    ))
}

/// Overwrites the field at `trit_offset` with `field`, which must already be
/// tryte-aligned.
fn patch(tx: &mut Trytes, trit_offset: usize, field: &str) {
    let start = trit_offset / 3;
    tx.replace_range(start..start + field.len(), field);
}

fn validate_hash_trytes(trytes: &str) -> Result<()> {
    validate_trytes(trytes)?;
    if trytes.len() != TRUNK_TRANSACTION_TRINARY_SIZE / 3 {
        return Err(Error::InvalidTrytes);
    }
    Ok(())
}
