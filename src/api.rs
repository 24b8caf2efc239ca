//! Process-wide allocator entry points.
//!
//! One [`HeapAllocator`] lives behind a single process-wide mutex; every
//! public operation acquires it on entry and releases it on every exit
//! path through the guard. Compound operations (a resize that has to
//! relocate, a zero-allocate) run under one acquisition, and no user code
//! ever runs while the lock is held.

use parking_lot::Mutex;

use crate::heap::HeapAllocator;

static HEAP: Mutex<HeapAllocator> = Mutex::new(HeapAllocator::new());

/// Allocates `size` bytes of memory.
///
/// The returned pointer is aligned to 16 bytes. Small requests are served
/// from the allocator's data-segment arena; requests at or above the
/// mapping threshold get a dedicated anonymous mapping. Returns null when
/// `size` is zero or the OS refuses more memory; the caller must release
/// the memory with [`deallocate`].
///
/// # Safety
///
/// The returned block is valid until passed to [`deallocate`] or moved by
/// [`resize`]; using it afterwards is undefined behavior.
pub unsafe fn allocate(size: usize) -> *mut u8 {
  unsafe { HEAP.lock().allocate(size) }
}

/// Allocates a zero-filled array of `count` elements of `elem_size` bytes
/// each.
///
/// Behaves like [`allocate`]`(count * elem_size)` followed by zeroing
/// every byte. Returns null when either count is zero, when the product
/// overflows `usize`, or when allocation fails.
///
/// # Safety
///
/// Same contract as [`allocate`].
pub unsafe fn zero_allocate(count: usize, elem_size: usize) -> *mut u8 {
  unsafe { HEAP.lock().zero_allocate(count, elem_size) }
}

/// Frees memory previously returned by [`allocate`], [`zero_allocate`],
/// or [`resize`].
///
/// Arena blocks are merged with any free physical neighbors and returned
/// to the free list; mapped blocks are released to the OS in full.
/// Passing null has no effect.
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by this allocator
/// and not freed since; anything else is undefined behavior.
pub unsafe fn deallocate(ptr: *mut u8) {
  unsafe { HEAP.lock().deallocate(ptr) }
}

/// Resizes a block to `new_size` bytes.
///
/// Shrinks in place, grows in place when the neighboring memory allows
/// it, and relocates (copying the old contents) otherwise. If `ptr` is
/// null this allocates; if `new_size` is zero this frees and returns
/// null. On failure the original block is left intact and null is
/// returned.
///
/// # Safety
///
/// Same contract as [`deallocate`] for `ptr`; a non-null result replaces
/// the old pointer, which must not be used again.
pub unsafe fn resize(ptr: *mut u8, new_size: usize) -> *mut u8 {
  unsafe { HEAP.lock().resize(ptr, new_size) }
}
