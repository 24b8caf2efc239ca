//! OS memory adapter.
//!
//! Two primitives back the allocator: `sbrk(2)` extends the contiguous
//! program data segment for the small-block arena, and a private anonymous
//! `mmap(2)`/`munmap(2)` pair serves large blocks so freeing one returns
//! the whole region to the kernel at once.
//!
//! None of these wrappers synchronize; callers serialize access to the
//! program break themselves. Failures are reported through the `log`
//! facade and surfaced as `None`.

use std::io;
use std::ptr::NonNull;

use libc::{c_void, intptr_t};

/// Current end of the program data segment (`sbrk(0)`).
pub fn data_break() -> *mut u8 {
  unsafe { libc::sbrk(0) as *mut u8 }
}

/// Appends `n` contiguous bytes to the data segment and returns the first
/// new byte, or `None` if the kernel refuses.
pub fn extend_data(n: usize) -> Option<NonNull<u8>> {
  let region = unsafe { libc::sbrk(n as intptr_t) };

  // sbrk reports failure as (void*)-1
  if region == usize::MAX as *mut c_void {
    log::error!("sbrk({n}) failed: {}", io::Error::last_os_error());
    return None;
  }

  NonNull::new(region as *mut u8)
}

/// Maps `n` bytes of private anonymous memory.
///
/// The kernel rounds the mapping up to a whole number of pages itself, so
/// callers only guarantee that `n` is a multiple of the payload alignment.
pub fn map_anonymous(n: usize) -> Option<NonNull<u8>> {
  let addr = unsafe {
    libc::mmap(
      std::ptr::null_mut(),
      n,
      libc::PROT_READ | libc::PROT_WRITE,
      libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
      -1,
      0,
    )
  };

  if addr == libc::MAP_FAILED {
    log::error!("mmap({n}) failed: {}", io::Error::last_os_error());
    return None;
  }

  NonNull::new(addr as *mut u8)
}

/// Returns a mapping obtained from [`map_anonymous`] to the OS in full.
///
/// # Safety
///
/// `addr` must be the base of a live mapping of exactly `n` bytes, and the
/// mapping must not be touched afterwards.
pub unsafe fn unmap(addr: *mut u8, n: usize) {
  if unsafe { libc::munmap(addr as *mut c_void, n) } == -1 {
    log::error!("munmap({addr:?}, {n}) failed: {}", io::Error::last_os_error());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn break_snapshot_is_nonnull() {
    assert!(!data_break().is_null());
  }

  #[test]
  fn map_and_unmap_round_trip() {
    let n = 0x4000;
    let region = map_anonymous(n).expect("anonymous mapping failed");

    unsafe {
      region.as_ptr().write_bytes(0x5A, n);
      assert_eq!(*region.as_ptr(), 0x5A);
      assert_eq!(*region.as_ptr().add(n - 1), 0x5A);

      unmap(region.as_ptr(), n);
    }
  }

  #[test]
  fn fresh_mappings_are_zeroed() {
    let n = 0x1000;
    let region = map_anonymous(n).expect("anonymous mapping failed");

    unsafe {
      for i in (0..n).step_by(64) {
        assert_eq!(*region.as_ptr().add(i), 0);
      }

      unmap(region.as_ptr(), n);
    }
  }
}
