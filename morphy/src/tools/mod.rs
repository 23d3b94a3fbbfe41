//! Miscellaneous tools used for searching. Most notably this module contains
//! the `TranspositionTable`, a fast lossy lookup table able to be accessed by
//! multiple threads simultaneously.

pub mod prng;
pub mod tt;

/// Allows an object to have its entries pre-fetched into cache.
pub trait PreFetchable {
    /// Pre-fetches a particular key, bringing its slot into cache for
    /// faster access.
    fn prefetch(&self, key: u64);
}

/// Prefetches `ptr` to all levels of the cache.
///
/// On non-x86 platforms this compiles down to nothing.
#[inline(always)]
pub fn prefetch_write<T>(ptr: *const T) {
    __prefetch_write::<T>(ptr);
}

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "sse"
))]
#[inline(always)]
fn __prefetch_write<T>(ptr: *const T) {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::{_mm_prefetch, _MM_HINT_T0};
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
    unsafe {
        _mm_prefetch(ptr as *const i8, _MM_HINT_T0);
    }
}

#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "sse"
)))]
#[inline(always)]
fn __prefetch_write<T>(_ptr: *const T) {}
