//! # Free-List Heap Allocator
//!
//! The allocator serves variably-sized requests from two memory sources:
//! a contiguous arena carved out of the program data segment for small
//! blocks, and dedicated anonymous mappings for large ones.
//!
//! ## Dual-source layout
//!
//! ```text
//!                 small requests                      large requests
//!                       │                                   │
//!                       ▼                                   ▼
//!   ┌───────────────────────────────────────┐   ┌───────────────────────┐
//!   │            ARENA (sbrk)               │   │   MAPPING (mmap)      │
//!   │                                       │   │                       │
//!   │ ┌───────┬──────┬───────┬────────────┐ │   │ ┌────┬──────────────┐ │
//!   │ │ used  │ free │ used  │    free    │ │   │ │ HL │   payload    │ │
//!   │ └───────┴──────┴───────┴────────────┘ │   │ └────┴──────────────┘ │
//!   │ ▲                                   ▲ │   │                       │
//!   │ arena_start                 arena_end │   │  one region per block │
//!   └───────────────────────────────────────┘   └───────────────────────┘
//!
//!   The arena grows in 16 KiB units and is never returned to the OS;
//!   a mapping is released in full the moment its block is freed.
//! ```
//!
//! ## Small-block format
//!
//! Every arena block is bracketed by boundary tags:
//!
//! ```text
//!   ┌────────────────┬─────────────────────────────┬──────────────┐
//!   │  BlockHeader   │          payload            │  BlockFooter │
//!   │                │                             │              │
//!   │ size           │   size bytes, start is      │ size         │
//!   │ is_free        │   16-byte aligned,          │ (copy of the │
//!   │ prev_free ─┐   │   user-visible while        │  header's)   │
//!   │ next_free ─┼─  │   allocated                 │              │
//!   └────────────┼───┴─────────────────────────────┴──────────────┘
//!                │
//!                └── free-list links, used only while is_free
//! ```
//!
//! Blocks tile the arena with no gaps, so pure address arithmetic walks
//! the physical neighbor graph: the next header sits right after the
//! footer, and the previous block is recovered through the footer that
//! ends immediately before the current header.
//!
//! ## Allocation and splitting
//!
//! Allocation scans the free list first-fit. A winning block larger than
//! the request by at least `MIN_SPLIT` is cut in two:
//!
//! ```text
//!   before:  ┌──────────────── free, 4096 ────────────────┐
//!
//!   after:   ┌── used, 512 ──┬───────── free, 3520 ───────┐
//!                            ▲
//!                            new block, appended to the
//!                            free-list tail
//! ```
//!
//! A smaller remainder stays inside the allocated block as slack; the
//! boundary tags keep describing the full span.
//!
//! ## Deallocation and coalescing
//!
//! Freeing a block merges it with whichever physical neighbors are free,
//! so two adjacent free blocks never survive a deallocation:
//!
//! ```text
//!   before:  ┌─ free A ─┬─ freed B ─┬─ free C ─┬─ used ─┐
//!
//!   after:   ┌────────── free A+B+C ───────────┬─ used ─┐
//! ```
//!
//! The merged block is appended at the tail of the free list, which
//! biases the first-fit scan toward older, lower-address blocks.
//!
//! ## Resizing
//!
//! | situation                                   | action                 |
//! |---------------------------------------------|------------------------|
//! | rounded size equals the current size        | return as-is           |
//! | shrink, cut-off at least `MIN_SPLIT`        | split tail to the list |
//! | shrink, cut-off smaller                     | keep slack             |
//! | grow, free right neighbor covers the need   | absorb it in place     |
//! | grow otherwise                              | allocate, copy, free   |
//!
//! ## Thread safety
//!
//! `HeapAllocator` itself performs no locking, exactly like a bare heap.
//! The crate-level entry points in [`crate::api`] wrap one process-wide
//! instance in a mutex; embedders using the struct directly must provide
//! the same exclusion.

use std::ptr;

use crate::align;
use crate::block::{
  self, ARENA_GROWTH, BlockHeader, FOOTER_SIZE, HEADER_SIZE, LARGE_THRESHOLD, MAPPED_HEADER_SIZE,
  MIN_SPLIT, MappedHeader,
};
use crate::free_list::FreeList;
use crate::os;

/// A first-fit, boundary-tag heap allocator over `sbrk` and `mmap`.
///
/// The arena is created lazily on the first small request and grows in
/// [`ARENA_GROWTH`] units; it is never shrunk. Large requests bypass the
/// arena entirely and live in their own anonymous mappings.
pub struct HeapAllocator {
  /// First byte of the arena; null until the first small allocation.
  arena_start: *mut u8,

  /// One past the last arena byte. Grows with the data segment.
  arena_end: *mut u8,

  /// Currently-free arena blocks, searched first-fit.
  free_list: FreeList,
}

// The raw pointers only ever target memory owned by the allocator, so the
// struct may move between threads as long as access is serialized, which
// `api` guarantees with a process-wide mutex.
unsafe impl Send for HeapAllocator {}

impl HeapAllocator {
  /// Creates an allocator with no arena; the arena is established by the
  /// first small allocation.
  pub const fn new() -> Self {
    Self {
      arena_start: ptr::null_mut(),
      arena_end: ptr::null_mut(),
      free_list: FreeList::new(),
    }
  }

  /// Allocates `requested_size` bytes and returns a 16-byte aligned
  /// payload pointer, or null when the size is zero or the OS refuses
  /// more memory.
  ///
  /// # Safety
  ///
  /// The caller must have exclusive access to the program break for the
  /// duration of the call.
  pub unsafe fn allocate(&mut self, requested_size: usize) -> *mut u8 {
    if requested_size == 0 {
      return ptr::null_mut();
    }

    let mapped_total = align!(MAPPED_HEADER_SIZE + requested_size);
    if mapped_total >= LARGE_THRESHOLD {
      return self.allocate_mapped(mapped_total);
    }

    let total = align!(HEADER_SIZE + requested_size + FOOTER_SIZE);
    let payload_target = total - HEADER_SIZE - FOOTER_SIZE;

    unsafe { self.allocate_small(payload_target) }
  }

  /// Allocates a zero-filled array of `count` elements of `elem_size`
  /// bytes each. Refuses zero counts and products that overflow `usize`.
  ///
  /// # Safety
  ///
  /// Same contract as [`HeapAllocator::allocate`].
  pub unsafe fn zero_allocate(&mut self, count: usize, elem_size: usize) -> *mut u8 {
    if count == 0 || elem_size == 0 {
      return ptr::null_mut();
    }
    if count > usize::MAX / elem_size {
      return ptr::null_mut();
    }
    let total = count * elem_size;

    unsafe {
      let payload = self.allocate(total);
      if !payload.is_null() {
        // Recycled arena blocks carry stale bytes.
        ptr::write_bytes(payload, 0, total);
      }
      payload
    }
  }

  /// Returns a block to the allocator. Null is a no-op.
  ///
  /// # Safety
  ///
  /// `payload` must be null or a pointer previously returned by this
  /// allocator and not freed since.
  pub unsafe fn deallocate(&mut self, payload: *mut u8) {
    unsafe {
      if payload.is_null() {
        return;
      }

      // Anything outside the arena bounds was served by a mapping; when
      // the arena was never created the mapped-header tag decides.
      if !self.arena_contains(payload) {
        self.deallocate_mapped(payload);
        return;
      }

      let h = block::header_of(payload);
      (*h).is_free = true;

      let mut merged = h;
      let mut size = (*h).size;

      // Coalesce left: recover the neighbor through its boundary tag.
      if (h as *mut u8) > self.arena_start {
        let left = block::left_header(h);
        if self.holds_header(left) && (*left).is_free {
          self.free_list.unlink(left);
          size += (*left).size + HEADER_SIZE + FOOTER_SIZE;
          merged = left;
        }
      }

      // Coalesce right.
      let right = block::right_header(h);
      if self.holds_header(right) && (*right).is_free {
        self.free_list.unlink(right);
        size += (*right).size + HEADER_SIZE + FOOTER_SIZE;
      }

      (*merged).is_free = true;
      block::set_size(merged, size);
      self.free_list.insert_tail(merged);
    }
  }

  /// Resizes a block, growing in place when the right neighbor allows it
  /// and relocating otherwise. Returns the (possibly moved) payload, or
  /// null on failure with the original block left intact.
  ///
  /// Null grows from nothing (plain allocation); size zero frees.
  ///
  /// # Safety
  ///
  /// Same contract as [`HeapAllocator::deallocate`] for `payload`.
  pub unsafe fn resize(&mut self, payload: *mut u8, new_size: usize) -> *mut u8 {
    unsafe {
      if payload.is_null() {
        return self.allocate(new_size);
      }
      if new_size == 0 {
        self.deallocate(payload);
        return ptr::null_mut();
      }

      if !self.arena_contains(payload) {
        return self.resize_mapped(payload, new_size);
      }

      let h = block::header_of(payload);
      let old = (*h).size;
      let req = align!(new_size);

      if req == old {
        return payload;
      }

      if req < old {
        let leftover = old - req;
        if leftover >= MIN_SPLIT {
          block::set_size(h, req);
          let rest = block::init_free(
            block::right_header(h).cast::<u8>(),
            leftover - HEADER_SIZE - FOOTER_SIZE,
          );
          self.free_list.insert_tail(rest);
        }
        // A smaller cut-off stays inside the block as slack.
        return payload;
      }

      // Grow in place by absorbing a free right neighbor when the
      // combined payload covers the request.
      let right = block::right_header(h);
      if self.holds_header(right) && (*right).is_free {
        let combined = old + HEADER_SIZE + FOOTER_SIZE + (*right).size;
        if combined >= req {
          self.free_list.unlink(right);
          block::set_size(h, combined);

          let leftover = combined - req;
          if leftover >= MIN_SPLIT {
            block::set_size(h, req);
            let rest = block::init_free(
              block::right_header(h).cast::<u8>(),
              leftover - HEADER_SIZE - FOOTER_SIZE,
            );
            self.free_list.insert_tail(rest);
          }
          return payload;
        }
      }

      // Last resort: move the allocation.
      let fresh = self.allocate(req);
      if fresh.is_null() {
        return ptr::null_mut();
      }
      ptr::copy_nonoverlapping(payload, fresh, old);
      self.deallocate(payload);
      fresh
    }
  }

  fn arena_contains(&self, p: *mut u8) -> bool {
    !self.arena_start.is_null()
      && !self.arena_end.is_null()
      && p >= self.arena_start
      && p < self.arena_end
  }

  fn holds_header(&self, h: *mut BlockHeader) -> bool {
    self.arena_contains(h as *mut u8)
  }

  unsafe fn allocate_small(&mut self, payload_target: usize) -> *mut u8 {
    unsafe {
      if self.arena_start.is_null() && self.free_list.is_empty() {
        self.arena_start = os::data_break();
        log::debug!("arena created at {:?}", self.arena_start);
      }

      loop {
        let b = self.free_list.first_fit(payload_target);
        if !b.is_null() {
          return self.carve(b, payload_target);
        }

        if !self.grow_arena() {
          return ptr::null_mut();
        }
      }
    }
  }

  /// Takes `b` off the free list, splitting off the tail when the
  /// remainder is worth a block of its own.
  unsafe fn carve(&mut self, b: *mut BlockHeader, payload_target: usize) -> *mut u8 {
    unsafe {
      self.free_list.unlink(b);

      let remaining = (*b).size - payload_target;
      if remaining >= MIN_SPLIT {
        block::set_size(b, payload_target);
        let rest = block::init_free(
          block::right_header(b).cast::<u8>(),
          remaining - HEADER_SIZE - FOOTER_SIZE,
        );
        self.free_list.insert_tail(rest);
      }
      // An unsplittable remainder is retained as slack; the boundary tags
      // still describe the full span.

      (*b).is_free = false;
      block::payload(b)
    }
  }

  /// Extends the arena by one growth unit and manufactures a free block
  /// in the new bytes.
  ///
  /// A free block that ended exactly at the old arena end absorbs the new
  /// one. Growth is the only event besides deallocation that can place
  /// two free blocks side by side, and deallocation-order coalescing
  /// would never get a chance to merge such a pair.
  unsafe fn grow_arena(&mut self) -> bool {
    unsafe {
      let Some(region) = os::extend_data(ARENA_GROWTH) else {
        return false;
      };
      let region = region.as_ptr();

      let old_end = self.arena_end;
      self.arena_end = region.add(ARENA_GROWTH);

      let mut h = block::init_free(region, ARENA_GROWTH - HEADER_SIZE - FOOTER_SIZE);

      if region == old_end && region > self.arena_start {
        let left = block::left_header(h);
        if self.holds_header(left) && (*left).is_free {
          self.free_list.unlink(left);
          let merged = (*left).size + HEADER_SIZE + FOOTER_SIZE + (*h).size;
          block::set_size(left, merged);
          h = left;
        }
      }

      self.free_list.insert_tail(h);

      log::debug!(
        "arena grown to [{:?}, {:?})",
        self.arena_start,
        self.arena_end
      );

      true
    }
  }

  fn allocate_mapped(&mut self, total: usize) -> *mut u8 {
    let Some(base) = os::map_anonymous(total) else {
      return ptr::null_mut();
    };

    unsafe {
      let h = base.as_ptr().cast::<MappedHeader>();
      (*h).size = total - MAPPED_HEADER_SIZE;
      (*h).is_mmap = true;
      base.as_ptr().add(MAPPED_HEADER_SIZE)
    }
  }

  unsafe fn deallocate_mapped(&mut self, payload: *mut u8) {
    unsafe {
      let h = payload.sub(MAPPED_HEADER_SIZE).cast::<MappedHeader>();
      if !(*h).is_mmap {
        // Neither an arena payload nor a mapping of ours; refuse rather
        // than unmap unrelated memory.
        log::warn!("deallocate: unrecognized pointer {payload:?}");
        return;
      }
      os::unmap(h.cast::<u8>(), (*h).size + MAPPED_HEADER_SIZE);
    }
  }

  /// Mapped blocks are not resized in place: the contents move to a fresh
  /// allocation sized for the request and the old mapping is released.
  unsafe fn resize_mapped(&mut self, payload: *mut u8, new_size: usize) -> *mut u8 {
    unsafe {
      let h = payload.sub(MAPPED_HEADER_SIZE).cast::<MappedHeader>();
      if !(*h).is_mmap {
        log::warn!("resize: unrecognized pointer {payload:?}");
        return ptr::null_mut();
      }
      let old = (*h).size;

      let fresh = self.allocate(new_size);
      if fresh.is_null() {
        return ptr::null_mut();
      }
      ptr::copy_nonoverlapping(payload, fresh, old.min(new_size));
      self.deallocate(payload);
      fresh
    }
  }
}
