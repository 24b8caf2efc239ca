//! # rmalloc - A Dual-Source Memory Allocator Library
//!
//! This crate provides a classic **first-fit free-list allocator** in Rust
//! that serves small requests from a contiguous `sbrk`-grown arena and
//! large requests from dedicated anonymous `mmap` regions.
//!
//! ## Overview
//!
//! ```text
//!   Dual-source policy:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                        allocate(size)                            │
//!   │                              │                                   │
//!   │              ┌───────────────┴───────────────┐                   │
//!   │              ▼                               ▼                   │
//!   │      below 128 KiB                   at or above 128 KiB         │
//!   │              │                               │                   │
//!   │   ┌──────────┴──────────┐         ┌──────────┴──────────┐        │
//!   │   │  data-segment arena │         │  anonymous mapping  │        │
//!   │   │  free list, split,  │         │  one region per     │        │
//!   │   │  coalesce on free   │         │  block, munmap on   │        │
//!   │   │  (grows, never      │         │  free (whole region │        │
//!   │   │   shrinks)          │         │  back to the OS)    │        │
//!   │   └─────────────────────┘         └─────────────────────┘        │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - Rounding macros (align!, align_to!)
//!   ├── block      - Block layout, boundary tags, neighbor arithmetic
//!   ├── free_list  - Doubly-linked list of free blocks (internal)
//!   ├── os         - sbrk / mmap adapters (internal)
//!   ├── heap       - HeapAllocator: allocate, resize, free, coalesce
//!   └── api        - Mutex-guarded process-wide entry points
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rmalloc::{allocate, deallocate, resize, zero_allocate};
//!
//! fn main() {
//!     unsafe {
//!         // Allocate memory for a u64
//!         let ptr = allocate(std::mem::size_of::<u64>()) as *mut u64;
//!
//!         // Use the memory
//!         *ptr = 42;
//!         println!("Value: {}", *ptr);
//!
//!         // Grow it into an array of eight
//!         let ptr = resize(ptr as *mut u8, 8 * std::mem::size_of::<u64>());
//!
//!         // Free the memory
//!         deallocate(ptr);
//!
//!         // Zeroed array allocation
//!         let arr = zero_allocate(16, 4);
//!         deallocate(arr);
//!     }
//! }
//! ```
//!
//! ## How It Works
//!
//! Small blocks live in one address-ordered arena with no gaps between
//! blocks. Each block carries a header and a boundary-tag footer, so both
//! physical neighbors of any block are reachable with pure address
//! arithmetic:
//!
//! ```text
//!   Arena:
//!
//!   ┌────┬─────────┬────┬────┬────┬────┬────┬──────────────────┬────┐
//!   │ H  │ payload │ F  │ H  │ pl │ F  │ H  │     payload      │ F  │
//!   └────┴─────────┴────┴────┴────┴────┴────┴──────────────────┴────┘
//!   ▲                   ▲ next header = footer address + 16
//!   arena_start         ▼ previous block found via footer at H - 16
//! ```
//!
//! Freed blocks enter a doubly-linked free list searched first-fit, and
//! are merged with free neighbors on the spot, so no two adjacent free
//! blocks outlive a deallocation. When the list has no fit, the arena is
//! extended by 16 KiB and the search retried.
//!
//! Requests of 128 KiB and above never touch the arena: each gets a
//! private anonymous mapping that is returned to the OS in full on free,
//! so big spikes do not pin memory for the life of the process.
//!
//! ## Thread Safety
//!
//! The crate-level functions serialize every operation through a single
//! process-wide mutex; they are safe to call from any number of threads.
//! The underlying [`HeapAllocator`] type performs no locking of its own.
//!
//! ## System Calls
//!
//! This allocator uses `sbrk(2)` for the arena:
//! - `sbrk(0)`: Returns the current program break
//! - `sbrk(n)`: Increases the program break by `n` bytes, returns old break
//!
//! and `mmap(2)` / `munmap(2)` (`MAP_PRIVATE | MAP_ANONYMOUS`) for large
//! blocks. The allocator assumes it is the only user of the program
//! break; mixing it with another sbrk-based allocator in one process is
//! not supported.
//!
//! ## Limitations
//!
//! - **Unix-only**: Requires `libc`, `sbrk`, and `mmap` (POSIX systems)
//! - **Arena never shrinks**: Data-segment pages are reused, not returned
//! - **First-fit**: No size-class segregation; long-lived fragmentation
//!   is mitigated only by coalescing and tail-biased insertion
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory
//! management. All allocation and deallocation operations require
//! `unsafe` blocks, and the usual contracts apply: no double-free, no use
//! after free, no freeing pointers the allocator did not issue.

pub mod align;
mod api;
mod block;
mod free_list;
mod heap;
mod os;

pub use api::{allocate, deallocate, resize, zero_allocate};
pub use block::{ALIGNMENT, ARENA_GROWTH, LARGE_THRESHOLD};
pub use heap::HeapAllocator;
