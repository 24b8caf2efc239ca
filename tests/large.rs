//! Large requests bypass the arena and live in dedicated anonymous
//! mappings that are returned to the OS in full on free.

use rmalloc::{LARGE_THRESHOLD, allocate, deallocate, resize, zero_allocate};

const BIG: usize = 300_000; // comfortably past the mapping threshold

#[test]
fn mapped_allocation_round_trip() {
  unsafe {
    let p = allocate(BIG);
    assert!(!p.is_null());
    assert_eq!(p as usize % 16, 0);

    p.write_bytes(0xAA, BIG);
    assert_eq!(*p, 0xAA);
    assert_eq!(*p.add(BIG / 2), 0xAA);
    assert_eq!(*p.add(BIG - 1), 0xAA);

    deallocate(p);
  }
}

#[test]
fn mapped_blocks_sit_outside_the_arena() {
  unsafe {
    let small = allocate(64);
    let big = allocate(LARGE_THRESHOLD);
    assert!(!small.is_null() && !big.is_null());

    // The mapping lives in its own region, nowhere near the sbrk arena.
    let distance = (big as usize).abs_diff(small as usize);
    assert!(distance >= LARGE_THRESHOLD, "mapping landed {distance} bytes from the arena");

    deallocate(big);
    deallocate(small);
  }
}

#[test]
fn mapped_resize_relocates_and_preserves_contents() {
  unsafe {
    let p = allocate(BIG);
    assert!(!p.is_null());
    for i in 0..64u8 {
      *p.add(i as usize) = i;
    }

    // Growing relocates to a fresh mapping.
    let q = resize(p, 2 * BIG);
    assert!(!q.is_null());
    for i in 0..64u8 {
      assert_eq!(*q.add(i as usize), i);
    }

    // Shrinking back below the threshold moves the block into the arena.
    let r = resize(q, 64);
    assert!(!r.is_null());
    for i in 0..64u8 {
      assert_eq!(*r.add(i as usize), i);
    }

    deallocate(r);
  }
}

#[test]
fn mapped_zero_allocate_is_zeroed() {
  unsafe {
    let q = zero_allocate(BIG, 1);
    assert!(!q.is_null());

    for i in (0..BIG).step_by(4096) {
      assert_eq!(*q.add(i), 0);
    }
    assert_eq!(*q.add(BIG - 1), 0);

    deallocate(q);
  }
}
