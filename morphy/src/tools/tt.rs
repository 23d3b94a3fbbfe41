//! The `TranspositionTable`: a lossy, fixed-size, concurrency-tolerant cache
//! mapping Zobrist keys to information about previously searched positions.
//!
//! Each slot is a pair of atomics: the full 64-bit key, stored verbatim, and
//! a packed data word holding the best move, score, depth, bound type,
//! generation and the busy bit. Readers re-verify the key after loading the
//! data; a mismatch means another thread replaced the slot and the entry is
//! ignored. Since the two words cannot be written as one unit, a torn
//! key/data pairing is possible in principle and is treated exactly like a
//! key mismatch by the replacement policy: the table is lossy and every
//! consumer must tolerate a miss.
//!
//! The busy bit marks that some thread is currently expanding the subtree
//! rooted at this key. It is set with a compare-exchange against the observed
//! data word, so a concurrent replacement simply loses the busy mark. The bit
//! is a scheduling hint, never a correctness requirement.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::core::piece_move::Move;
use crate::tools::prefetch_write;
use crate::tools::PreFetchable;

/// Value used to retrieve and store entries.
pub type Key = u64;

/// Maximum value of the generation counter; bumping past this point requires
/// a full clear from the owner.
pub const GENERATION_MAX: u8 = 127;

const BYTES_PER_MB: usize = 1_000_000;

const MOVE_SHIFT: u32 = 0;
const SCORE_SHIFT: u32 = 24;
const DEPTH_SHIFT: u32 = 40;
const BOUND_SHIFT: u32 = 48;
const GEN_SHIFT: u32 = 50;
const BUSY_BIT: u64 = 1 << 57;

const MOVE_MASK: u64 = 0x00FF_FFFF;
const GEN_MASK: u64 = 0x7F;

/// Designates the bound type of a stored score.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum NodeBound {
    NoBound = 0,
    /// The score is a lower bound: the node failed high.
    FailHigh = 1,
    /// The score is an upper bound: the node failed low.
    FailLow = 2,
    /// The score is exact.
    Exact = 3,
}

impl NodeBound {
    #[inline(always)]
    fn from_bits(bits: u8) -> NodeBound {
        match bits & 0b11 {
            1 => NodeBound::FailHigh,
            2 => NodeBound::FailLow,
            3 => NodeBound::Exact,
            _ => NodeBound::NoBound,
        }
    }

    /// Returns whether a stored score of this bound type can be returned
    /// against the given window.
    #[inline]
    pub fn cuts(self, score: i32, alpha: i32, beta: i32) -> bool {
        match self {
            NodeBound::Exact => true,
            NodeBound::FailHigh => score >= beta,
            NodeBound::FailLow => score <= alpha,
            NodeBound::NoBound => false,
        }
    }
}

/// A decoded view of a stored entry.
#[derive(Copy, Clone, Debug)]
pub struct Entry {
    pub mv: Move,
    pub score: i16,
    pub depth: u8,
    pub bound: NodeBound,
    pub generation: u8,
    pub busy: bool,
}

#[inline(always)]
fn pack(mv: Move, score: i16, depth: u8, bound: NodeBound, generation: u8) -> u64 {
    ((mv.get_raw() as u64) & MOVE_MASK)
        | ((score as u16 as u64) << SCORE_SHIFT)
        | ((depth as u64) << DEPTH_SHIFT)
        | ((bound as u64) << BOUND_SHIFT)
        | (((generation as u64) & GEN_MASK) << GEN_SHIFT)
}

#[inline(always)]
fn unpack(data: u64) -> Entry {
    Entry {
        mv: unsafe { Move::from_raw(((data >> MOVE_SHIFT) & MOVE_MASK) as u32) },
        score: ((data >> SCORE_SHIFT) & 0xFFFF) as u16 as i16,
        depth: ((data >> DEPTH_SHIFT) & 0xFF) as u8,
        bound: NodeBound::from_bits(((data >> BOUND_SHIFT) & 0b11) as u8),
        generation: ((data >> GEN_SHIFT) & GEN_MASK) as u8,
        busy: data & BUSY_BIT != 0,
    }
}

#[inline(always)]
fn data_generation(data: u64) -> u8 {
    ((data >> GEN_SHIFT) & GEN_MASK) as u8
}

#[inline(always)]
fn data_depth(data: u64) -> u8 {
    ((data >> DEPTH_SHIFT) & 0xFF) as u8
}

/// One slot of the table. Stores at most one entry; collisions replace.
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn empty() -> Slot {
        Slot {
            key: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }
}

/// A lossy, concurrently accessed transposition table.
///
/// All reads and stores go through `&self`; internal consistency is
/// maintained by per-word atomics and key re-verification rather than locks.
pub struct TranspositionTable {
    slots: UnsafeCell<Box<[Slot]>>,
    generation: AtomicU8,
}

// Sound: the slice itself is only replaced by `resize`, which the owner must
// call while no search is running; all other access is through atomics.
unsafe impl Sync for TranspositionTable {}
unsafe impl Send for TranspositionTable {}

impl TranspositionTable {
    /// Creates a table of approximately `mb_size` megabytes. The slot count
    /// is rounded down to a power of two.
    pub fn new(mb_size: usize) -> Self {
        TranspositionTable {
            slots: UnsafeCell::new(alloc_slots(mb_size)),
            generation: AtomicU8::new(0),
        }
    }

    #[inline(always)]
    fn slots(&self) -> &[Slot] {
        unsafe { &**self.slots.get() }
    }

    #[inline(always)]
    fn slot_for(&self, key: Key) -> &Slot {
        let slots = self.slots();
        let idx = (key & (slots.len() as u64 - 1)) as usize;
        unsafe { slots.get_unchecked(idx) }
    }

    /// Returns the number of slots the table holds.
    pub fn num_entries(&self) -> usize {
        self.slots().len()
    }

    /// Returns the size of the allocated table in megabytes.
    pub fn size_megabytes(&self) -> usize {
        (self.slots().len() * std::mem::size_of::<Slot>()) / BYTES_PER_MB
    }

    /// Returns the current generation.
    #[inline(always)]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Advances the generation counter by one and returns the new value.
    ///
    /// On wrapping past [`GENERATION_MAX`] the counter returns to zero and
    /// the entire table is cleared, so stale generations can never alias
    /// fresh ones.
    pub fn bump_generation(&self) -> u8 {
        let old = self.generation.load(Ordering::Relaxed);
        let new = if old >= GENERATION_MAX { 0 } else { old + 1 };
        self.generation.store(new, Ordering::Relaxed);
        if new == 0 {
            self.clear();
        }
        new
    }

    /// Looks up the entry for `key`, if one is stored and passes key
    /// verification. A hit has its generation refreshed to the current one so
    /// warm entries survive replacement.
    pub fn probe(&self, key: Key) -> Option<Entry> {
        let slot = self.slot_for(key);
        let data = slot.data.load(Ordering::Relaxed);
        let stored_key = slot.key.load(Ordering::Relaxed);
        if data == 0 || stored_key != key {
            return None;
        }
        let generation = self.generation();
        if data_generation(data) != generation {
            let refreshed =
                (data & !(GEN_MASK << GEN_SHIFT)) | (((generation as u64) & GEN_MASK) << GEN_SHIFT);
            // A lost race here only loses the refresh, not the entry.
            let _ = slot
                .data
                .compare_exchange(data, refreshed, Ordering::Relaxed, Ordering::Relaxed);
        }
        Some(unpack(data))
    }

    /// Stores an entry for `key`, replacing per the policy: empty slots are
    /// always taken; occupied slots are replaced when the incumbent carries
    /// the same key, is from an older generation, or has equal-or-lower
    /// depth. A new entry that is deeper and at least as fresh is never
    /// silently dropped.
    pub fn store(&self, key: Key, mv: Move, score: i16, depth: u8, bound: NodeBound) {
        debug_assert_ne!(bound, NodeBound::NoBound);
        let slot = self.slot_for(key);
        let generation = self.generation();
        let incumbent = slot.data.load(Ordering::Relaxed);
        let incumbent_key = slot.key.load(Ordering::Relaxed);

        let replace = incumbent == 0
            || incumbent_key == key
            || data_generation(incumbent) != generation
            || depth >= data_depth(incumbent);
        if !replace {
            return;
        }

        // Preserve the stored move if the new entry has none for the same key.
        let mv = if mv.is_null() && incumbent_key == key {
            unsafe { Move::from_raw(((incumbent >> MOVE_SHIFT) & MOVE_MASK) as u32) }
        } else {
            mv
        };

        let data = pack(mv, score, depth, bound, generation);
        slot.data.store(data, Ordering::Relaxed);
        slot.key.store(key, Ordering::Relaxed);
    }

    /// Attempts to mark the entry for `key` as busy. Returns `true` if this
    /// thread won the mark. The mark is lost, harmlessly, if the slot is
    /// concurrently replaced.
    pub fn mark_busy(&self, key: Key) -> bool {
        let slot = self.slot_for(key);
        let data = slot.data.load(Ordering::Relaxed);
        if data == 0 || slot.key.load(Ordering::Relaxed) != key || data & BUSY_BIT != 0 {
            return false;
        }
        slot.data
            .compare_exchange(data, data | BUSY_BIT, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    /// Clears the busy mark on the entry for `key`, if it still belongs to
    /// that key.
    pub fn clear_busy(&self, key: Key) {
        let slot = self.slot_for(key);
        let data = slot.data.load(Ordering::Relaxed);
        if data != 0 && slot.key.load(Ordering::Relaxed) == key && data & BUSY_BIT != 0 {
            let _ = slot.data.compare_exchange(
                data,
                data & !BUSY_BIT,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }
    }

    /// Clears every slot of the table.
    pub fn clear(&self) {
        for slot in self.slots() {
            slot.data.store(0, Ordering::Relaxed);
            slot.key.store(0, Ordering::Relaxed);
        }
    }

    /// Re-sizes the table to approximately `mb_size` megabytes, deleting all
    /// stored data. Returns the actual size in megabytes.
    ///
    /// # Safety
    ///
    /// Must not be called while any other thread is accessing the table.
    pub unsafe fn resize(&self, mb_size: usize) -> usize {
        let slots = &mut *self.slots.get();
        *slots = alloc_slots(mb_size);
        self.generation.store(0, Ordering::Relaxed);
        self.size_megabytes()
    }

    /// An estimate of how full the table is, in permill of sampled slots.
    pub fn hash_full(&self) -> u32 {
        let slots = self.slots();
        let sample = slots.len().min(1000);
        let mut filled = 0;
        for slot in &slots[..sample] {
            if slot.data.load(Ordering::Relaxed) != 0 {
                filled += 1;
            }
        }
        (filled * 1000 / sample as u32).min(1000)
    }
}

impl PreFetchable for TranspositionTable {
    #[inline(always)]
    fn prefetch(&self, key: u64) {
        let slot = self.slot_for(key);
        prefetch_write(slot as *const Slot);
    }
}

fn alloc_slots(mb_size: usize) -> Box<[Slot]> {
    let bytes = mb_size.max(1) * BYTES_PER_MB;
    let mut num = (bytes / std::mem::size_of::<Slot>()).next_power_of_two();
    if num * std::mem::size_of::<Slot>() > bytes {
        num /= 2;
    }
    let num = num.max(1024);
    let mut v = Vec::with_capacity(num);
    for _ in 0..num {
        v.push(Slot::empty());
    }
    v.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece_move::MoveKind;
    use crate::core::sq::SQ;
    use crate::core::Piece;

    fn some_move() -> Move {
        Move::new(
            SQ::E2,
            SQ::E4,
            Piece::WhitePawn,
            Piece::None,
            MoveKind::Normal,
        )
    }

    #[test]
    fn store_probe_roundtrip() {
        let tt = TranspositionTable::new(1);
        let key = 0xDEAD_BEEF_0123_4567;
        tt.store(key, some_move(), 42, 7, NodeBound::Exact);

        let e = tt.probe(key).unwrap();
        assert_eq!(e.mv, some_move());
        assert_eq!(e.score, 42);
        assert_eq!(e.depth, 7);
        assert_eq!(e.bound, NodeBound::Exact);
        assert!(!e.busy);

        // A different key landing elsewhere misses.
        assert!(tt.probe(key ^ (1 << 63)).is_none());
    }

    #[test]
    fn key_verification_rejects_alias() {
        let tt = TranspositionTable::new(1);
        let n = tt.num_entries() as u64;
        let key_a = 5;
        let key_b = 5 + n; // same slot, different key
        tt.store(key_a, some_move(), 10, 3, NodeBound::FailHigh);
        assert!(tt.probe(key_b).is_none());
        assert!(tt.probe(key_a).is_some());
    }

    #[test]
    fn replacement_prefers_depth_within_generation() {
        let tt = TranspositionTable::new(1);
        let n = tt.num_entries() as u64;
        let key_a = 9;
        let key_b = 9 + n;

        tt.store(key_a, some_move(), 1, 10, NodeBound::Exact);
        // Shallower entry for a colliding key does not replace.
        tt.store(key_b, some_move(), 2, 3, NodeBound::Exact);
        assert!(tt.probe(key_a).is_some());
        assert!(tt.probe(key_b).is_none());

        // Deeper colliding entry does replace.
        tt.store(key_b, some_move(), 2, 12, NodeBound::Exact);
        assert!(tt.probe(key_b).is_some());
        assert!(tt.probe(key_a).is_none());
    }

    #[test]
    fn older_generation_is_evicted() {
        let tt = TranspositionTable::new(1);
        let n = tt.num_entries() as u64;
        let key_a = 21;
        let key_b = 21 + n;

        tt.store(key_a, some_move(), 1, 20, NodeBound::Exact);
        tt.bump_generation();
        // Even a shallow new-generation entry evicts the stale one.
        tt.store(key_b, some_move(), 2, 1, NodeBound::FailLow);
        assert!(tt.probe(key_b).is_some());
    }

    #[test]
    fn probe_refreshes_generation() {
        let tt = TranspositionTable::new(1);
        let key = 77;
        tt.store(key, some_move(), 5, 6, NodeBound::Exact);
        tt.bump_generation();
        // Touch it: it should now survive a same-depth colliding store from
        // the new generation it was refreshed into.
        assert!(tt.probe(key).is_some());
        let e = tt.probe(key).unwrap();
        assert_eq!(e.generation, tt.generation());
    }

    #[test]
    fn busy_bit_lifecycle() {
        let tt = TranspositionTable::new(1);
        let key = 1234;
        assert!(!tt.mark_busy(key)); // nothing stored yet
        tt.store(key, some_move(), 0, 4, NodeBound::FailLow);
        assert!(tt.mark_busy(key));
        assert!(tt.probe(key).unwrap().busy);
        assert!(!tt.mark_busy(key)); // already busy
        tt.clear_busy(key);
        assert!(!tt.probe(key).unwrap().busy);
    }

    #[test]
    fn generation_wrap_clears() {
        let tt = TranspositionTable::new(1);
        let key = 4321;
        tt.store(key, some_move(), 9, 2, NodeBound::Exact);
        for _ in 0..=GENERATION_MAX {
            tt.bump_generation();
        }
        assert_eq!(tt.generation(), 0);
        assert!(tt.probe(key).is_none());
    }

    #[test]
    fn negative_scores_survive_packing() {
        let tt = TranspositionTable::new(1);
        let key = 0xABCD;
        tt.store(key, Move::null(), -30999, 1, NodeBound::Exact);
        assert_eq!(tt.probe(key).unwrap().score, -30999);
    }
}
