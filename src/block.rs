use std::mem;
use std::ptr;

use static_assertions::const_assert_eq;

/// Payload alignment. Every pointer handed out and every stored block size
/// is a multiple of this.
pub const ALIGNMENT: usize = 16;

/// Unit by which the contiguous arena grows (16 KiB).
pub const ARENA_GROWTH: usize = 0x4000;

/// Requests whose mapped total (header plus payload, rounded up) reaches
/// this threshold are served by a dedicated anonymous mapping (128 KiB).
pub const LARGE_THRESHOLD: usize = 0x20000;

/// Metadata preceding every arena block payload.
///
/// The free-list links are meaningful only while `is_free` is set; an
/// allocated block keeps them null.
#[repr(C, align(16))]
pub struct BlockHeader {
  pub size: usize,
  pub is_free: bool,
  pub prev_free: *mut BlockHeader,
  pub next_free: *mut BlockHeader,
}

/// Boundary tag closing every arena block.
///
/// Duplicates the owning header's payload size so the physically preceding
/// block can be recovered from any header in O(1).
#[repr(C, align(16))]
pub struct BlockFooter {
  pub size: usize,
}

/// Header of a large block served by its own anonymous mapping.
#[repr(C, align(16))]
pub struct MappedHeader {
  pub size: usize,
  pub is_mmap: bool,
}

pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();
pub const FOOTER_SIZE: usize = mem::size_of::<BlockFooter>();
pub const MAPPED_HEADER_SIZE: usize = mem::size_of::<MappedHeader>();

/// Smallest remainder worth splitting off as a new free block.
pub const MIN_SPLIT: usize = HEADER_SIZE + FOOTER_SIZE + ALIGNMENT;

const_assert_eq!(HEADER_SIZE % ALIGNMENT, 0);
const_assert_eq!(FOOTER_SIZE % ALIGNMENT, 0);
const_assert_eq!(MAPPED_HEADER_SIZE % ALIGNMENT, 0);
const_assert_eq!(ARENA_GROWTH % ALIGNMENT, 0);

/// Start of the user payload of `h`.
pub unsafe fn payload(h: *mut BlockHeader) -> *mut u8 {
  unsafe { h.cast::<u8>().add(HEADER_SIZE) }
}

/// Recovers the header from a payload pointer produced by [`payload`].
pub unsafe fn header_of(payload: *mut u8) -> *mut BlockHeader {
  unsafe { payload.sub(HEADER_SIZE).cast::<BlockHeader>() }
}

/// Footer of `h`, located through the header's current `size`.
pub unsafe fn footer(h: *mut BlockHeader) -> *mut BlockFooter {
  unsafe {
    h.cast::<u8>()
      .add(HEADER_SIZE + (*h).size)
      .cast::<BlockFooter>()
  }
}

/// Header of the physically following block.
///
/// Only meaningful while the result lies inside the arena; the caller
/// bounds-checks before dereferencing.
pub unsafe fn right_header(h: *mut BlockHeader) -> *mut BlockHeader {
  unsafe {
    h.cast::<u8>()
      .add(HEADER_SIZE + (*h).size + FOOTER_SIZE)
      .cast::<BlockHeader>()
  }
}

/// Footer of the physically preceding block.
pub unsafe fn left_footer(h: *mut BlockHeader) -> *mut BlockFooter {
  unsafe { h.cast::<u8>().sub(FOOTER_SIZE).cast::<BlockFooter>() }
}

/// Header of the physically preceding block, recovered through its
/// boundary tag. Same validity caveat as [`right_header`].
pub unsafe fn left_header(h: *mut BlockHeader) -> *mut BlockHeader {
  unsafe {
    let f = left_footer(h);
    f.cast::<u8>()
      .sub((*f).size + HEADER_SIZE)
      .cast::<BlockHeader>()
  }
}

/// Writes `size` into the header and its boundary-tag footer.
pub unsafe fn set_size(h: *mut BlockHeader, size: usize) {
  unsafe {
    (*h).size = size;
    (*footer(h)).size = size;
  }
}

/// Constructs a detached free block at `at` with the given payload size,
/// writing both boundary tags.
pub unsafe fn init_free(at: *mut u8, size: usize) -> *mut BlockHeader {
  unsafe {
    let h = at.cast::<BlockHeader>();
    (*h).size = size;
    (*h).is_free = true;
    (*h).prev_free = ptr::null_mut();
    (*h).next_free = ptr::null_mut();
    (*footer(h)).size = size;
    h
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[repr(align(16))]
  struct Buffer([u8; 512]);

  #[test]
  fn layout_constants() {
    assert_eq!(HEADER_SIZE, 32);
    assert_eq!(FOOTER_SIZE, 16);
    assert_eq!(MAPPED_HEADER_SIZE, 16);
    assert_eq!(MIN_SPLIT, 64);
  }

  #[test]
  fn neighbor_round_trip() {
    let mut buffer = Buffer([0u8; 512]);
    let base = buffer.0.as_mut_ptr();

    unsafe {
      let a = init_free(base, 64);
      let b = init_free(base.add(HEADER_SIZE + 64 + FOOTER_SIZE), 96);

      assert_eq!(right_header(a), b);
      assert_eq!(left_header(b), a);
      assert_eq!(header_of(payload(a)), a);
      assert_eq!((*footer(a)).size, 64);
      assert_eq!((*footer(b)).size, 96);
    }
  }

  #[test]
  fn set_size_updates_both_tags() {
    let mut buffer = Buffer([0u8; 512]);
    let base = buffer.0.as_mut_ptr();

    unsafe {
      let h = init_free(base, 128);
      set_size(h, 64);

      assert_eq!((*h).size, 64);
      assert_eq!((*footer(h)).size, 64);
    }
  }
}
