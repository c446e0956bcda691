//! The allocation seam and the owned storage block.
//!
//! [`RawAlloc`] is the narrow contract the container consumes for raw memory:
//! acquire a block for a [`Layout`], release it later with the same layout.
//! [`Global`] implements it over the global heap and is the default.
//!
//! [`RawBuf`] is the storage block itself: an owning pointer plus a slot
//! count, with no knowledge of which slots hold live elements. The container
//! layers the live-element count on top and is responsible for destroying
//! elements before releasing the block.

use alloc::alloc::{alloc, dealloc};
use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;
use core::ptr::NonNull;

use crate::error::ReserveError;

/// Raw memory acquisition failed.
///
/// Carries no detail; [`RawBuf::allocate`] converts it into a
/// [`ReserveError`] that records the refused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl core::error::Error for AllocError {}

/// A raw storage provider.
///
/// # Safety
/// A block returned by [`allocate`] must be valid for reads and writes of
/// `layout.size()` bytes at `layout.align()` alignment until it is passed to
/// [`deallocate`] with the same layout. [`deallocate`] never fails.
///
/// [`allocate`]: RawAlloc::allocate
/// [`deallocate`]: RawAlloc::deallocate
pub unsafe trait RawAlloc {
    /// Acquire a block for `layout`.
    ///
    /// `layout` is never zero-sized; the container handles empty and
    /// zero-sized-element cases without touching the allocator.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release a block previously returned by [`allocate`] with this exact
    /// `layout`.
    ///
    /// # Safety
    /// `ptr` must denote a block currently owned by this allocator, and
    /// `layout` must be the layout it was allocated with.
    ///
    /// [`allocate`]: RawAlloc::allocate
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global heap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

// SAFETY: Defers to the global allocator, which upholds the block contract.
unsafe impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);
        // SAFETY: `layout` is non-zero-sized.
        NonNull::new(unsafe { alloc(layout) }).ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller upholds that `ptr`/`layout` came from `allocate`.
        unsafe { dealloc(ptr.as_ptr(), layout) }
    }
}

/// An owned block of `cap` slots of `T`, with no live-element tracking.
///
/// Zero-sized `T` never allocates: the pointer stays dangling and the
/// capacity is `usize::MAX`, so capacity checks above this type never
/// trigger a grow.
///
/// `RawBuf` has no `Drop`; whoever owns one must pair it with the allocator
/// it came from and call [`release`](RawBuf::release).
#[derive(Debug)]
pub(crate) struct RawBuf<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

impl<T> RawBuf<T> {
    /// An unallocated buffer.
    pub(crate) const fn dangling() -> Self {
        let cap = if size_of::<T>() == 0 { usize::MAX } else { 0 };
        Self {
            ptr: NonNull::dangling(),
            cap,
            _marker: PhantomData,
        }
    }

    /// Acquire a buffer of exactly `cap` slots from `alloc`.
    ///
    /// `cap` must already be validated against the container's element
    /// maximum; this only converts it to a byte layout and performs the
    /// acquisition. Zero `cap` and zero-sized `T` skip the allocator.
    pub(crate) fn allocate<A: RawAlloc>(cap: usize, alloc: &A) -> Result<Self, ReserveError> {
        if size_of::<T>() == 0 || cap == 0 {
            return Ok(Self::dangling());
        }
        let layout = Layout::array::<T>(cap).map_err(|_| ReserveError::CapacityOverflow {
            required: cap,
            max: isize::MAX as usize / size_of::<T>(),
        })?;
        let ptr = alloc
            .allocate(layout)
            .map_err(|AllocError| ReserveError::AllocFailed {
                elements: cap,
                bytes: layout.size(),
            })?;
        Ok(Self {
            ptr: ptr.cast(),
            cap,
            _marker: PhantomData,
        })
    }

    /// First slot of the buffer; dangling when unallocated.
    #[inline(always)]
    pub(crate) const fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Slot count.
    #[inline(always)]
    pub(crate) const fn capacity(&self) -> usize {
        self.cap
    }

    /// Release the block back to `alloc` and reset to unallocated.
    ///
    /// Does not touch element state; the caller must have destroyed or moved
    /// out every live element first.
    ///
    /// # Safety
    /// `alloc` must be the allocator this buffer was acquired from.
    pub(crate) unsafe fn release<A: RawAlloc>(&mut self, alloc: &A) {
        if size_of::<T>() != 0 && self.cap != 0 {
            // SAFETY: A non-dangling buffer was allocated with exactly this
            // array layout, which was validated at acquisition time.
            unsafe {
                let layout = Layout::array::<T>(self.cap).unwrap_unchecked();
                alloc.deallocate(self.ptr.cast(), layout);
            }
        }
        *self = Self::dangling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_has_zero_capacity() {
        let buf: RawBuf<u32> = RawBuf::dangling();
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn dangling_zst_has_max_capacity() {
        let buf: RawBuf<()> = RawBuf::dangling();
        assert_eq!(buf.capacity(), usize::MAX);
    }

    #[test]
    fn allocate_and_release_round_trip() {
        let mut buf: RawBuf<u64> = RawBuf::allocate(16, &Global).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert!(!buf.ptr().is_null());
        unsafe { buf.release(&Global) };
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn allocate_zero_skips_allocator() {
        let mut buf: RawBuf<u64> = RawBuf::allocate(0, &Global).unwrap();
        assert_eq!(buf.capacity(), 0);
        // Releasing an unallocated buffer is a no-op.
        unsafe { buf.release(&Global) };
    }

    #[test]
    fn allocate_zst_never_allocates() {
        let mut buf: RawBuf<()> = RawBuf::allocate(7, &Global).unwrap();
        assert_eq!(buf.capacity(), usize::MAX);
        unsafe { buf.release(&Global) };
    }

    #[test]
    fn release_is_idempotent_after_reset() {
        let mut buf: RawBuf<u8> = RawBuf::allocate(4, &Global).unwrap();
        unsafe { buf.release(&Global) };
        unsafe { buf.release(&Global) };
        assert_eq!(buf.capacity(), 0);
    }

    /// A refusing allocator surfaces `AllocFailed` with the request recorded.
    #[test]
    fn refusal_reports_request() {
        struct Refuse;
        // SAFETY: Never hands out a block.
        unsafe impl RawAlloc for Refuse {
            fn allocate(&self, _: Layout) -> Result<NonNull<u8>, AllocError> {
                Err(AllocError)
            }
            unsafe fn deallocate(&self, _: NonNull<u8>, _: Layout) {
                unreachable!()
            }
        }
        let err = RawBuf::<u64>::allocate(8, &Refuse).unwrap_err();
        assert_eq!(
            err,
            ReserveError::AllocFailed {
                elements: 8,
                bytes: 64
            }
        );
    }
}
