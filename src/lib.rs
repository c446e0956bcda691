#![no_std]

//! Tranche is a growable contiguous sequence with pluggable allocation and
//! transactional growth.
//!
//! [`Tranche`] stores its elements in a single memory block acquired from a
//! [`RawAlloc`] (the global heap by default) and keeps the classic triad of a
//! buffer container, owned block plus live length plus capacity, as an owning
//! handle and two counters. Appends are amortized constant time; positional
//! insertion and removal shift the tail in place when capacity suffices.
//!
//! Every allocating method is fallible and returns a [`ReserveError`] instead
//! of aborting, leaving the container untouched on failure. Operations that
//! replace the buffer build the replacement off to the side and adopt it in a
//! single step, so a failure mid-growth (an allocator refusal or a panicking
//! `Clone`) can never leave a half-moved container behind. In-place shifts
//! make the weaker basic guarantee: the container stays structurally valid
//! (no double-drop, no uninitialized slot inside the live range) but its
//! contents are unspecified after a panicking `Clone`.
//!
//! Element access through [`get_unchecked`] is unchecked; checked indexing,
//! `first`/`last`, iteration, and the rest of the slice API arrive through
//! [`Deref`].
//!
//! ## Pointer stability
//!
//! Raw pointers obtained from [`as_ptr`] follow the usual contiguous-buffer
//! rules:
//! - any operation that grows the buffer invalidates every pointer into the
//!   container;
//! - an in-place insert invalidates pointers at or after the insertion index;
//! - a removal invalidates pointers at or after the start of the removed
//!   range;
//! - [`swap`] exchanges the buffers of two containers in constant time
//!   without touching element memory, so pointers stay valid but refer to
//!   the other container afterwards.
//!
//! `Tranche` performs no internal synchronization; shared mutation must be
//! prevented by the caller, which safe Rust already enforces.
//!
//! ## Examples
//!
//! ```
//! use tranche::Tranche;
//!
//! let mut t: Tranche<i32> = Tranche::new();
//! t.push(1).unwrap();
//! t.push(2).unwrap();
//! t.push(3).unwrap();
//! assert_eq!(*t, [1, 2, 3]);
//!
//! t.insert_n(1, 2, 99).unwrap();
//! assert_eq!(*t, [1, 99, 99, 2, 3]);
//!
//! t.remove_range(0..2);
//! assert_eq!(*t, [99, 2, 3]);
//! ```
//!
//! ### Bringing your own allocator
//!
//! ```
//! use core::alloc::Layout;
//! use core::ptr::NonNull;
//! use tranche::{AllocError, RawAlloc, ReserveError, Tranche};
//!
//! /// Refuses every request.
//! struct Broke;
//!
//! unsafe impl RawAlloc for Broke {
//!     fn allocate(&self, _: Layout) -> Result<NonNull<u8>, AllocError> {
//!         Err(AllocError)
//!     }
//!     unsafe fn deallocate(&self, _: NonNull<u8>, _: Layout) {}
//! }
//!
//! let mut t: Tranche<i32, Broke> = Tranche::new_in(Broke);
//! assert!(matches!(t.push(1), Err(ReserveError::AllocFailed { .. })));
//! assert!(t.is_empty());
//! ```
//!
//! [`get_unchecked`]: Tranche::get_unchecked
//! [`as_ptr`]: Tranche::as_ptr
//! [`swap`]: Tranche::swap
//! [`Deref`]: core::ops::Deref

extern crate alloc;

mod error;
mod into_iter;
mod raw;

pub use error::ReserveError;
pub use into_iter::IntoIter;
pub use raw::{AllocError, Global, RawAlloc};

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::borrow::{Borrow, BorrowMut};
use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use core::hash::{Hash, Hasher};
use core::mem::{self, ManuallyDrop, align_of, size_of};
use core::ops::{Bound, Deref, DerefMut, RangeBounds};
use core::ptr;
use core::slice;

use raw::RawBuf;

/// A growable contiguous sequence of `T` with storage from `A`.
///
/// The live elements occupy the first `len` slots of an owned block of
/// `capacity` slots; the remainder is allocated but uninitialized. `new` does
/// not allocate — the first capacity-exceeding mutation (or [`reserve`]) does.
///
/// [`reserve`]: Tranche::reserve
pub struct Tranche<T, A: RawAlloc = Global> {
    buf: RawBuf<T>,
    len: usize,
    alloc: A,
}

/// Replacement storage under construction during the growth path.
///
/// Owns the not-yet-adopted buffer together with the count of elements
/// *constructed* into it so far. Prefix and suffix slots are only ever
/// bitwise-moved into the replacement, so they remain owned by the original
/// buffer until adoption; on unwind this guard destroys exactly the
/// constructed range and releases the replacement block, leaving the original
/// container untouched.
struct Transaction<'a, T, A: RawAlloc> {
    buf: RawBuf<T>,
    alloc: &'a A,
    gap_start: usize,
    constructed: usize,
}

impl<T, A: RawAlloc> Transaction<'_, T, A> {
    /// Hand the finished buffer to the caller without running the rollback.
    fn commit(self) -> RawBuf<T> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never touched again; ownership of the buffer
        // moves to the caller in one step.
        unsafe { ptr::read(&this.buf) }
    }
}

impl<T, A: RawAlloc> Drop for Transaction<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: `[gap_start, gap_start + constructed)` holds the elements
        // constructed into the replacement; nothing else in it is owned here.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.buf.ptr().add(self.gap_start),
                self.constructed,
            ));
            self.buf.release(self.alloc);
        }
    }
}

/// Routes an allocation failure on an infallible trait surface (`Clone`,
/// `Extend`, `From`, ...) to [`handle_alloc_error`], the same way a direct
/// allocator call would fail there.
fn unwrap_reserve<T, R>(result: Result<R, ReserveError>) -> R {
    match result {
        Ok(value) => value,
        Err(ReserveError::CapacityOverflow { required, max }) => {
            panic!("capacity overflow: {required} elements exceeds the maximum of {max}")
        }
        Err(ReserveError::AllocFailed { bytes, .. }) => {
            let layout = Layout::from_size_align(bytes, align_of::<T>())
                .unwrap_or_else(|_| Layout::new::<T>());
            handle_alloc_error(layout)
        }
    }
}

impl<T> Tranche<T, Global> {
    /// An empty sequence on the global heap. Does not allocate.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// An empty sequence with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, ReserveError> {
        Self::with_capacity_in(capacity, Global)
    }

    /// A sequence of `n` clones of `value`.
    pub fn from_elem(n: usize, value: T) -> Result<Self, ReserveError>
    where
        T: Clone,
    {
        let mut new = Self::with_capacity(n)?;
        if n != 0 {
            new.insert_n(0, n, value)?;
        }
        Ok(new)
    }

    /// A sequence cloned from a slice, allocated to exactly fit.
    pub fn from_slice(src: &[T]) -> Result<Self, ReserveError>
    where
        T: Clone,
    {
        let mut new = Self::new();
        new.assign_from_slice(src)?;
        Ok(new)
    }
}

impl<T, A: RawAlloc> Tranche<T, A> {
    /// The maximum number of elements any `Tranche<T>` can hold.
    ///
    /// Bounded by `isize::MAX` bytes of storage; zero-sized types are not
    /// stored, so their count is bounded only by `usize`.
    pub const MAX_LEN: usize = if size_of::<T>() == 0 {
        usize::MAX
    } else {
        isize::MAX as usize / size_of::<T>()
    };

    /// An empty sequence using `alloc` for storage. Does not allocate.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: RawBuf::dangling(),
            len: 0,
            alloc,
        }
    }

    /// An empty sequence with room for exactly `capacity` elements in `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, ReserveError> {
        if capacity > Self::MAX_LEN {
            return Err(ReserveError::CapacityOverflow {
                required: capacity,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self {
            buf: RawBuf::allocate(capacity, &alloc)?,
            len: 0,
            alloc,
        })
    }

    /// Number of live elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` if there are no live elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots. Always `usize::MAX` for zero-sized `T`.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The allocator this sequence draws storage from.
    #[inline(always)]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Pointer to the first slot; dangling (but aligned) when unallocated.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *const T {
        self.buf.ptr()
    }

    /// Mutable pointer to the first slot.
    #[inline(always)]
    pub const fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.ptr()
    }

    /// The live elements as a slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized.
        unsafe { slice::from_raw_parts(self.buf.ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: `[0, len)` is initialized and uniquely borrowed.
        unsafe { slice::from_raw_parts_mut(self.buf.ptr(), self.len) }
    }

    /// Reference to the element at `index`, without a bounds check.
    ///
    /// This is the primary access primitive; the checked variants live on
    /// the [`Deref`] slice.
    ///
    /// # Safety
    /// `index` must be less than [`len`](Tranche::len).
    ///
    /// [`Deref`]: core::ops::Deref
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        // SAFETY: Caller guarantees `index < len`.
        unsafe { &*self.buf.ptr().add(index) }
    }

    /// Mutable reference to the element at `index`, without a bounds check.
    ///
    /// # Safety
    /// `index` must be less than [`len`](Tranche::len).
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        // SAFETY: Caller guarantees `index < len`.
        unsafe { &mut *self.buf.ptr().add(index) }
    }

    /// Slots not yet holding live elements.
    #[inline(always)]
    fn spare(&self) -> usize {
        self.capacity() - self.len
    }

    /// Capacity for one more element: double the old capacity, at least 1.
    fn amortized_capacity(&self) -> Result<usize, ReserveError> {
        let required = self
            .len
            .checked_add(1)
            .filter(|&required| required <= Self::MAX_LEN)
            .ok_or(ReserveError::CapacityOverflow {
                required: self.len.saturating_add(1),
                max: Self::MAX_LEN,
            })?;
        Ok(self
            .capacity()
            .saturating_mul(2)
            .max(1)
            .max(required)
            .min(Self::MAX_LEN))
    }

    /// Capacity for `extra` more elements: `old_len + max(old_len, extra)`,
    /// clamped to `MAX_LEN`.
    fn grown_capacity(&self, extra: usize) -> Result<usize, ReserveError> {
        let required = self
            .len
            .checked_add(extra)
            .ok_or(ReserveError::CapacityOverflow {
                required: usize::MAX,
                max: Self::MAX_LEN,
            })?;
        if required > Self::MAX_LEN {
            return Err(ReserveError::CapacityOverflow {
                required,
                max: Self::MAX_LEN,
            });
        }
        Ok(self
            .len
            .saturating_add(self.len.max(extra))
            .min(Self::MAX_LEN))
    }

    /// The growth algorithm: build replacement storage of `new_cap` slots
    /// with a `gap`-slot hole at `index`, fill the hole, adopt on success.
    ///
    /// `fill` receives the first slot of the hole and a counter it must bump
    /// after each element it constructs, and returns how many slots it
    /// filled. That may be fewer than `gap` when the values come from an
    /// iterator that over-reported its length, in which case the hole is
    /// closed before the new layout becomes visible.
    ///
    /// All-or-nothing: on allocation failure or a panic inside `fill`, the
    /// transaction guard tears the replacement down and the container is
    /// left exactly as it was.
    fn grow_and_splice<F>(
        &mut self,
        index: usize,
        gap: usize,
        new_cap: usize,
        fill: F,
    ) -> Result<usize, ReserveError>
    where
        F: FnOnce(*mut T, &mut usize) -> usize,
    {
        debug_assert!(index <= self.len);
        debug_assert!(new_cap >= self.len.saturating_add(gap) || size_of::<T>() == 0);
        let tail = self.len - index;
        let mut txn = Transaction {
            buf: RawBuf::allocate(new_cap, &self.alloc)?,
            alloc: &self.alloc,
            gap_start: index,
            constructed: 0,
        };
        // SAFETY: Prefix and suffix are bitwise moves into disjoint fresh
        // slots; ownership stays with the original buffer until adoption, so
        // an unwind drops them exactly once, in place.
        unsafe {
            ptr::copy_nonoverlapping(self.buf.ptr(), txn.buf.ptr(), index);
            ptr::copy_nonoverlapping(
                self.buf.ptr().add(index),
                txn.buf.ptr().add(index + gap),
                tail,
            );
        }
        // SAFETY: `index + gap <= new_cap`.
        let gap_ptr = unsafe { txn.buf.ptr().add(index) };
        let filled = fill(gap_ptr, &mut txn.constructed);
        debug_assert!(filled <= gap);
        debug_assert!(filled == txn.constructed);
        if filled < gap {
            // SAFETY: The suffix sits at `index + gap`; slide it down so the
            // live range is contiguous before it is published.
            unsafe {
                ptr::copy(
                    txn.buf.ptr().add(index + gap),
                    txn.buf.ptr().add(index + filled),
                    tail,
                );
            }
        }
        let new_buf = txn.commit();
        // SAFETY: Every live element was bitwise-moved into the replacement;
        // only the memory of the old block needs releasing. Adoption is a
        // single handle assignment.
        unsafe { self.buf.release(&self.alloc) };
        self.buf = new_buf;
        self.len += filled;
        Ok(filled)
    }

    /// Grow capacity so that at least `additional` more elements fit,
    /// without changing the contents.
    ///
    /// Allocates exactly `len + additional` slots when growth is needed; use
    /// repeated [`push`](Tranche::push) for amortized doubling instead.
    pub fn reserve(&mut self, additional: usize) -> Result<(), ReserveError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(ReserveError::CapacityOverflow {
                required: usize::MAX,
                max: Self::MAX_LEN,
            })?;
        if required > Self::MAX_LEN {
            return Err(ReserveError::CapacityOverflow {
                required,
                max: Self::MAX_LEN,
            });
        }
        if required <= self.capacity() {
            return Ok(());
        }
        self.grow_and_splice(self.len, 0, required, |_, _| 0)
            .map(|_| ())
    }

    /// Append one element.
    pub fn push(&mut self, value: T) -> Result<(), ReserveError> {
        if self.spare() >= 1 {
            // SAFETY: One spare slot past the live range.
            unsafe { self.buf.ptr().add(self.len).write(value) };
            self.len += 1;
            Ok(())
        } else {
            self.insert(self.len, value)
        }
    }

    /// Remove and return the last element, or [`None`] when empty.
    ///
    /// Capacity is unchanged.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: The slot was the last live element; the shrunk length
        // retires it before the read transfers ownership out.
        unsafe { Some(self.buf.ptr().add(self.len).read()) }
    }

    /// Insert `value` at `index`, shifting everything after it one slot up.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ReserveError> {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        if self.spare() >= 1 {
            // SAFETY: One spare slot; the memmove is overlap-safe and the
            // final write of an already-owned value cannot fail.
            unsafe {
                let p = self.buf.ptr().add(index);
                ptr::copy(p, p.add(1), len - index);
                p.write(value);
            }
            self.len = len + 1;
            Ok(())
        } else {
            let new_cap = self.amortized_capacity()?;
            self.grow_and_splice(index, 1, new_cap, move |gap, constructed| {
                // SAFETY: The gap slot is fresh.
                unsafe { gap.write(value) };
                *constructed += 1;
                1
            })
            .map(|_| ())
        }
    }

    /// Insert `n` clones of `value` at `index` (the last slot takes `value`
    /// itself), shifting everything after it `n` slots up.
    ///
    /// With spare capacity this shifts in place and makes the basic
    /// guarantee; when it must grow, the whole splice is transactional.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: T) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        if n == 0 {
            return Ok(());
        }
        if self.spare() >= n {
            // SAFETY: The tail memmove targets spare slots. The live range is
            // gated at the insertion point while the gap is open, so a
            // panicking clone leaks the relocated tail instead of
            // double-dropping it.
            unsafe {
                let p = self.buf.ptr().add(index);
                self.len = index;
                ptr::copy(p, p.add(n), len - index);
                for i in 0..n - 1 {
                    p.add(i).write(value.clone());
                    self.len = index + i + 1;
                }
                p.add(n - 1).write(value);
                self.len = len + n;
            }
            Ok(())
        } else {
            let new_cap = self.grown_capacity(n)?;
            self.grow_and_splice(index, n, new_cap, move |gap, constructed| {
                // SAFETY: The gap has `n` fresh slots; each is marked as it
                // is constructed so an unwind rolls back precisely.
                unsafe {
                    for i in 0..n - 1 {
                        gap.add(i).write(value.clone());
                        *constructed += 1;
                    }
                    gap.add(n - 1).write(value);
                }
                *constructed += 1;
                n
            })
            .map(|_| ())
        }
    }

    /// Insert clones of a slice at `index`, shifting everything after it up.
    ///
    /// The count is known, so this makes exactly one grow-or-shift decision
    /// and one construction pass.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_slice(&mut self, index: usize, src: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        let n = src.len();
        if n == 0 {
            return Ok(());
        }
        if self.spare() >= n {
            // SAFETY: Same shape and gating as `insert_n`.
            unsafe {
                let p = self.buf.ptr().add(index);
                self.len = index;
                ptr::copy(p, p.add(n), len - index);
                for (i, item) in src.iter().enumerate() {
                    p.add(i).write(item.clone());
                    self.len = index + i + 1;
                }
                self.len = len + n;
            }
            Ok(())
        } else {
            let new_cap = self.grown_capacity(n)?;
            self.grow_and_splice(index, n, new_cap, |gap, constructed| {
                // SAFETY: The gap has `n` fresh slots.
                unsafe {
                    for (i, item) in src.iter().enumerate() {
                        gap.add(i).write(item.clone());
                        *constructed += 1;
                    }
                }
                n
            })
            .map(|_| ())
        }
    }

    /// Append clones of a slice.
    pub fn extend_from_slice(&mut self, src: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        self.insert_slice(self.len, src)
    }

    /// One splice of exactly `n` items taken from `iter` at `index`.
    ///
    /// Trusts `n` only for the capacity decision: an iterator that runs
    /// short has its unfilled gap closed before the new length is published.
    /// Returns the number of items actually spliced.
    fn splice_exact<I>(
        &mut self,
        index: usize,
        n: usize,
        iter: &mut I,
    ) -> Result<usize, ReserveError>
    where
        I: Iterator<Item = T>,
    {
        debug_assert!(index <= self.len);
        debug_assert!(n > 0);
        if self.spare() >= n {
            let len = self.len;
            // SAFETY: Gate, memmove the tail, fill. A panic from the iterator
            // leaks the relocated tail; items already written are covered by
            // the advancing gate.
            unsafe {
                let p = self.buf.ptr().add(index);
                self.len = index;
                ptr::copy(p, p.add(n), len - index);
                let mut filled = 0;
                while filled < n {
                    match iter.next() {
                        Some(item) => {
                            p.add(filled).write(item);
                            filled += 1;
                            self.len = index + filled;
                        }
                        None => break,
                    }
                }
                if filled < n {
                    // The hint over-reported; close the hole.
                    ptr::copy(p.add(n), p.add(filled), len - index);
                }
                self.len = len + filled;
                Ok(filled)
            }
        } else {
            let new_cap = self.grown_capacity(n)?;
            self.grow_and_splice(index, n, new_cap, |gap, constructed| {
                let mut filled = 0;
                while filled < n {
                    match iter.next() {
                        Some(item) => {
                            // SAFETY: `filled < n` slots of the gap remain.
                            unsafe { gap.add(filled).write(item) };
                            filled += 1;
                            *constructed = filled;
                        }
                        None => break,
                    }
                }
                filled
            })
        }
    }

    /// Insert everything `iter` yields at `index`, preserving its order.
    ///
    /// Sources whose [`size_hint`] is exact get one grow-or-shift decision
    /// and one construction pass; single-pass sources fall back to repeated
    /// single-element insertion with an advancing index, re-copying on each
    /// growth. That is the accepted cost of not knowing the count upfront.
    ///
    /// # Panics
    /// Panics if `index > len`.
    ///
    /// [`size_hint`]: Iterator::size_hint
    pub fn insert_from_iter<I>(&mut self, index: usize, iter: I) -> Result<(), ReserveError>
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        let mut iter = iter.into_iter();
        let (lower, upper) = iter.size_hint();
        let mut at = index;
        if upper == Some(lower) && lower > 0 {
            at += self.splice_exact(index, lower, &mut iter)?;
        }
        // Single-pass leftovers: an inexact source, or the surplus of a
        // source whose hint under-reported.
        for value in iter {
            self.insert(at, value)?;
            at += 1;
        }
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail down.
    ///
    /// Capacity is unchanged.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(
            index < len,
            "removal index (is {index}) should be < len (is {len})"
        );
        // SAFETY: The slot is read out exactly once, then the overlap-safe
        // memmove closes the gap.
        unsafe {
            let p = self.buf.ptr().add(index);
            let value = p.read();
            ptr::copy(p.add(1), p, len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Remove a range of elements, shifting the tail down to close the gap.
    ///
    /// `range` is bounded within the length; out-of-range ends are clamped.
    /// Capacity is unchanged.
    pub fn remove_range<R>(&mut self, range: R)
    where
        R: RangeBounds<usize>,
    {
        let len = self.len;
        let end = match range.end_bound() {
            Bound::Included(end) => end.saturating_add(1).min(len),
            Bound::Excluded(&end) => end.min(len),
            Bound::Unbounded => len,
        };
        let start = match range.start_bound() {
            Bound::Included(&start) => start.min(end),
            Bound::Excluded(start) => start.saturating_add(1).min(end),
            Bound::Unbounded => 0,
        };
        let count = end - start;
        if count == 0 {
            return;
        }
        // SAFETY: The live range is gated below the erased range while the
        // gap is open, so a panicking destructor leaks the tail rather than
        // double-dropping it.
        unsafe {
            let p = self.buf.ptr();
            self.len = start;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(start), count));
            ptr::copy(p.add(end), p.add(start), len - end);
            self.len = len - count;
        }
    }

    /// Keep the first `len` elements and destroy the rest.
    ///
    /// No effect if `len >= self.len()`. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        // Publish the shorter length first so a panicking destructor cannot
        // expose the dying tail.
        self.len = len;
        // SAFETY: The tail was live and is now outside the published range.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.ptr().add(len), tail));
        }
    }

    /// Destroy all elements. Capacity is unchanged.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Grow to `new_len` by appending clones of `value`, or shrink to it by
    /// destroying the tail.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            Ok(())
        } else {
            self.insert_n(self.len, new_len - self.len, value)
        }
    }

    /// Replace the contents with clones of `src`, reusing the buffer when it
    /// is large enough.
    ///
    /// Only reallocates when `src.len() > capacity`, in which case the
    /// rebuild is transactional; otherwise live slots are overwritten by
    /// assignment and the length adjusted.
    pub fn assign_from_slice(&mut self, src: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        if src.len() > self.capacity() {
            if src.len() > Self::MAX_LEN {
                return Err(ReserveError::CapacityOverflow {
                    required: src.len(),
                    max: Self::MAX_LEN,
                });
            }
            let mut txn = Transaction {
                buf: RawBuf::<T>::allocate(src.len(), &self.alloc)?,
                alloc: &self.alloc,
                gap_start: 0,
                constructed: 0,
            };
            for (i, item) in src.iter().enumerate() {
                // SAFETY: Slot `i` is fresh; marking after each write keeps
                // the rollback exact.
                unsafe { txn.buf.ptr().add(i).write(item.clone()) };
                txn.constructed += 1;
            }
            let new_buf = txn.commit();
            // SAFETY: The old live elements were copied from, not moved, so
            // they are destroyed before their memory is released.
            unsafe {
                let old_len = self.len;
                self.len = 0;
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.ptr(), old_len));
                self.buf.release(&self.alloc);
            }
            self.buf = new_buf;
            self.len = src.len();
        } else if self.len >= src.len() {
            for (dst, item) in self.as_mut_slice().iter_mut().zip(src) {
                dst.clone_from(item);
            }
            self.truncate(src.len());
        } else {
            let live = self.len;
            for (dst, item) in self.as_mut_slice().iter_mut().zip(&src[..live]) {
                dst.clone_from(item);
            }
            // SAFETY: The remainder lands in spare slots; the length grows
            // one element at a time so a panicking clone publishes only
            // fully-constructed elements.
            unsafe {
                for item in &src[live..] {
                    self.buf.ptr().add(self.len).write(item.clone());
                    self.len += 1;
                }
            }
        }
        Ok(())
    }

    /// Exchange contents with `other` by swapping the buffer handles.
    ///
    /// Constant time, touches no element memory, cannot fail. Raw pointers
    /// into either container stay valid but refer to the other afterwards.
    #[inline(always)]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T, A: RawAlloc> Drop for Tranche<T, A> {
    fn drop(&mut self) {
        // SAFETY: The live range is initialized; the block returns to the
        // allocator it came from after the elements are destroyed.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.ptr(), self.len));
            self.buf.release(&self.alloc);
        }
    }
}

// SAFETY: Tranche owns its elements and allocator.
unsafe impl<T: Send, A: RawAlloc + Send> Send for Tranche<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for Tranche<T, A> {}

impl<T> Default for Tranche<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAlloc> Deref for Tranche<T, A> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> DerefMut for Tranche<T, A> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAlloc> AsRef<[T]> for Tranche<T, A> {
    #[inline(always)]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> AsMut<[T]> for Tranche<T, A> {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAlloc> Borrow<[T]> for Tranche<T, A> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> BorrowMut<[T]> for Tranche<T, A> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: PartialEq, A: RawAlloc, B: RawAlloc> PartialEq<Tranche<T, B>> for Tranche<T, A> {
    fn eq(&self, other: &Tranche<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: RawAlloc> Eq for Tranche<T, A> {}

impl<T: PartialOrd, A: RawAlloc> PartialOrd for Tranche<T, A> {
    /// Lexicographic over the elements.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, A: RawAlloc> Ord for Tranche<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, A: RawAlloc> Hash for Tranche<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: Debug, A: RawAlloc> Debug for Tranche<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_slice(), f)
    }
}

impl<T: Clone, A: RawAlloc + Clone> Clone for Tranche<T, A> {
    fn clone(&self) -> Self {
        let mut new = Self::new_in(self.alloc.clone());
        unwrap_reserve::<T, _>(new.assign_from_slice(self.as_slice()));
        new
    }

    /// Reuses `self`'s buffer when it is large enough; see
    /// [`assign_from_slice`](Tranche::assign_from_slice).
    fn clone_from(&mut self, source: &Self) {
        unwrap_reserve::<T, _>(self.assign_from_slice(source.as_slice()));
    }
}

impl<T, A: RawAlloc> Extend<T> for Tranche<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let mut iter = iter.into_iter();
        let (lower, upper) = iter.size_hint();
        if upper == Some(lower) && lower != 0 {
            unwrap_reserve::<T, _>(self.splice_exact(self.len, lower, &mut iter));
        }
        for value in iter {
            unwrap_reserve::<T, _>(self.push(value));
        }
    }
}

impl<T, A: RawAlloc + Default> FromIterator<T> for Tranche<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut new = Self::new_in(A::default());
        new.extend(iter);
        new
    }
}

impl<T: Clone> From<&[T]> for Tranche<T, Global> {
    fn from(src: &[T]) -> Self {
        unwrap_reserve::<T, _>(Self::from_slice(src))
    }
}

impl<T, const N: usize> From<[T; N]> for Tranche<T, Global> {
    fn from(array: [T; N]) -> Self {
        Self::from_iter(array)
    }
}

impl<T, A: RawAlloc> IntoIterator for Tranche<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: Each field is read out exactly once; `this` is forgotten,
        // so the iterator becomes the sole owner of buffer and allocator.
        unsafe {
            IntoIter {
                buf: ptr::read(&this.buf),
                alloc: ptr::read(&this.alloc),
                start: 0,
                end: this.len,
            }
        }
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a Tranche<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.as_slice().iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut Tranche<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.as_mut_slice().iter_mut()
    }
}
