//! Doubly-linked list of free arena blocks.
//!
//! The list is threaded through the `prev_free`/`next_free` fields of
//! [`BlockHeader`]; a block is on the list exactly while its `is_free`
//! flag is set. Freed blocks are appended at the tail, so the first-fit
//! scan keeps preferring older, lower-address blocks.

use std::ptr;

use crate::block::BlockHeader;

pub struct FreeList {
  head: *mut BlockHeader,
}

impl FreeList {
  pub const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_null()
  }

  /// Appends a detached free block at the tail.
  ///
  /// # Safety
  ///
  /// `b` must point to a live block with `is_free` set and both link
  /// fields null, and must not already be on the list.
  pub unsafe fn insert_tail(&mut self, b: *mut BlockHeader) {
    unsafe {
      if self.head.is_null() {
        (*b).prev_free = ptr::null_mut();
        (*b).next_free = ptr::null_mut();
        self.head = b;
        return;
      }

      let mut curr = self.head;
      while !(*curr).next_free.is_null() {
        curr = (*curr).next_free;
      }

      (*curr).next_free = b;
      (*b).prev_free = curr;
      (*b).next_free = ptr::null_mut();
    }
  }

  /// Detaches a block, clearing both of its links.
  ///
  /// # Safety
  ///
  /// `b` must be null or a live block currently on this list.
  pub unsafe fn unlink(&mut self, b: *mut BlockHeader) {
    unsafe {
      if b.is_null() {
        return;
      }

      if !(*b).prev_free.is_null() {
        (*(*b).prev_free).next_free = (*b).next_free;
      } else {
        self.head = (*b).next_free;
      }
      if !(*b).next_free.is_null() {
        (*(*b).next_free).prev_free = (*b).prev_free;
      }

      (*b).prev_free = ptr::null_mut();
      (*b).next_free = ptr::null_mut();
    }
  }

  /// First-fit search: the first listed block whose payload holds `size`
  /// bytes, or null when none does.
  ///
  /// # Safety
  ///
  /// Every block on the list must be live.
  pub unsafe fn first_fit(&self, size: usize) -> *mut BlockHeader {
    unsafe {
      let mut curr = self.head;

      while !curr.is_null() {
        if (*curr).is_free && (*curr).size >= size {
          return curr;
        }
        curr = (*curr).next_free;
      }

      ptr::null_mut()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn free_block(size: usize) -> BlockHeader {
    BlockHeader {
      size,
      is_free: true,
      prev_free: ptr::null_mut(),
      next_free: ptr::null_mut(),
    }
  }

  fn collect(list: &FreeList) -> Vec<*mut BlockHeader> {
    let mut order = Vec::new();
    let mut curr = list.head;

    while !curr.is_null() {
      order.push(curr);
      curr = unsafe { (*curr).next_free };
    }

    order
  }

  #[test]
  fn insert_keeps_arrival_order() {
    let mut blocks = [free_block(16), free_block(32), free_block(48)];
    let mut list = FreeList::new();

    assert!(list.is_empty());

    let ptrs: Vec<*mut BlockHeader> = blocks.iter_mut().map(|b| b as *mut _).collect();
    unsafe {
      for &b in &ptrs {
        list.insert_tail(b);
      }
    }

    assert!(!list.is_empty());
    assert_eq!(collect(&list), ptrs);
  }

  #[test]
  fn unlink_head_middle_and_tail() {
    let mut blocks = [free_block(16), free_block(32), free_block(48)];
    let mut list = FreeList::new();

    let ptrs: Vec<*mut BlockHeader> = blocks.iter_mut().map(|b| b as *mut _).collect();
    unsafe {
      for &b in &ptrs {
        list.insert_tail(b);
      }

      list.unlink(ptrs[1]);
      assert_eq!(collect(&list), vec![ptrs[0], ptrs[2]]);
      assert!((*ptrs[1]).prev_free.is_null());
      assert!((*ptrs[1]).next_free.is_null());

      list.unlink(ptrs[0]);
      assert_eq!(collect(&list), vec![ptrs[2]]);

      list.unlink(ptrs[2]);
      assert!(list.is_empty());
    }
  }

  #[test]
  fn unlink_null_is_a_noop() {
    let mut list = FreeList::new();

    unsafe {
      list.unlink(ptr::null_mut());
    }

    assert!(list.is_empty());
  }

  #[test]
  fn first_fit_takes_list_order_not_best_fit() {
    let mut blocks = [free_block(16), free_block(128), free_block(64)];
    let mut list = FreeList::new();

    let ptrs: Vec<*mut BlockHeader> = blocks.iter_mut().map(|b| b as *mut _).collect();
    unsafe {
      for &b in &ptrs {
        list.insert_tail(b);
      }

      // 64 would be the tighter fit, but 128 comes first.
      assert_eq!(list.first_fit(48), ptrs[1]);
      assert_eq!(list.first_fit(16), ptrs[0]);
      assert!(list.first_fit(256).is_null());
    }
  }
}
