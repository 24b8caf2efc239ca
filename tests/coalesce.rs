//! Freeing every block of a cluster must leave one merged region that
//! first-fit immediately reuses.
//!
//! The assertions depend on exact block placement, so this file holds a
//! single test and runs as its own process with a pristine arena.

use rmalloc::{allocate, deallocate};

#[test]
fn adjacent_blocks_merge_on_free() {
  unsafe {
    let a = allocate(64);
    let b = allocate(64);
    let c = allocate(64);
    assert!(!a.is_null() && !b.is_null() && !c.is_null());

    // Carved back-to-back from the arena's single free region: each block
    // spans header (32) + payload (64) + footer (16).
    assert_eq!(b as usize - a as usize, 112);
    assert_eq!(c as usize - b as usize, 112);

    deallocate(a);
    deallocate(c);
    deallocate(b);

    // The three spans and their interior tags are one free block again; a
    // request bigger than any single original payload must land at `a`.
    let big = allocate(288);
    assert_eq!(big, a);

    deallocate(big);

    // And the merged block keeps merging: after freeing it once more, a
    // small request still starts at the same place.
    let small = allocate(16);
    assert_eq!(small, a);
    deallocate(small);
  }
}
