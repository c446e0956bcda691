use core::iter::FusedIterator;
use core::ptr;
use core::slice;

use crate::raw::{RawAlloc, RawBuf};

/// A double-ended iterator that consumes a [`Tranche`], yielding its elements
/// by value and releasing the buffer when dropped.
///
/// [`Tranche`]: crate::Tranche
pub struct IntoIter<T, A: RawAlloc> {
    pub(crate) buf: RawBuf<T>,
    pub(crate) alloc: A,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    /// Remaining elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[start, end)` holds the not-yet-yielded elements.
        unsafe { slice::from_raw_parts(self.buf.ptr().add(self.start), self.end - self.start) }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start >= self.end {
            return None;
        }
        // SAFETY: `start < end <= len`, so the slot is initialized; the read
        // transfers ownership and the cursor advance retires the slot.
        unsafe {
            let item = self.buf.ptr().add(self.start).read();
            self.start += 1;
            Some(item)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start >= self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: As in `next`, from the back.
        unsafe { Some(self.buf.ptr().add(self.end).read()) }
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

impl<T, A: RawAlloc> FusedIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // SAFETY: `[start, end)` is initialized and owned by the iterator;
        // everything outside it was already yielded. The buffer is released
        // back to the allocator it came from.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.buf.ptr().add(self.start),
                self.end - self.start,
            ));
            self.buf.release(&self.alloc);
        }
    }
}

// SAFETY: The iterator owns its elements and allocator.
unsafe impl<T: Send, A: RawAlloc + Send> Send for IntoIter<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for IntoIter<T, A> {}
