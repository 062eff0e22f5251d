//! Statically typed zero-copy element views

use std::{
    fmt,
    marker::PhantomData,
    slice,
    sync::atomic::{AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicU16, AtomicU32, AtomicU64, AtomicU8},
};

use half::f16;

use crate::{
    error::{Result, StructError},
    memory::Buffer,
    types::PrimitiveKind,
};

mod sealed {
    pub trait Sealed {}
}

/// Rust types that match a numeric [`PrimitiveKind`] bit for bit
pub trait Element: sealed::Sealed + Copy + Send + Sync + 'static {
    const KIND: PrimitiveKind;

    /// Convert from the stored little-endian representation
    fn from_stored(self) -> Self;

    /// Convert to the stored little-endian representation
    fn to_stored(self) -> Self;
}

/// Elements with a same-sized atomic counterpart
pub trait AtomicElement: Element {
    type Atomic: Send + Sync;
}

macro_rules! int_element {
    ($($t:ty => $kind:ident, $atomic:ty;)*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                fn from_stored(self) -> Self {
                    <$t>::from_le(self)
                }

                fn to_stored(self) -> Self {
                    self.to_le()
                }
            }

            impl AtomicElement for $t {
                type Atomic = $atomic;
            }
        )*
    };
}

int_element! {
    i8 => I8, AtomicI8;
    u8 => U8, AtomicU8;
    i16 => I16, AtomicI16;
    u16 => U16, AtomicU16;
    i32 => I32, AtomicI32;
    u32 => U32, AtomicU32;
    i64 => I64, AtomicI64;
    u64 => U64, AtomicU64;
}

macro_rules! float_element {
    ($($t:ty => $kind:ident, $bits:ty;)*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                fn from_stored(self) -> Self {
                    <$t>::from_bits(<$bits>::from_le(self.to_bits()))
                }

                fn to_stored(self) -> Self {
                    <$t>::from_bits(self.to_bits().to_le())
                }
            }
        )*
    };
}

float_element! {
    f16 => F16, u16;
    f32 => F32, u32;
    f64 => F64, u64;
}

/// A fixed-width view of `len` elements of `T` that aliases the buffer.
///
/// The view's start address is a multiple of `size_of::<T>()`; binding
/// fails with an alignment error otherwise.
#[derive(Clone)]
pub struct TypedView<T: Element> {
    buffer: Buffer,
    offset: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> TypedView<T> {
    pub(crate) fn new(buffer: Buffer, offset: usize, len: usize) -> Result<Self> {
        let align = std::mem::align_of::<T>().max(T::KIND.byte_size());
        if !buffer.is_aligned_at(offset, align) {
            return Err(StructError::alignment(buffer.address() + offset, align));
        }
        Ok(Self {
            buffer,
            offset,
            len,
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pointer to the first element
    pub fn as_ptr(&self) -> *mut T {
        unsafe { self.buffer.as_ptr().add(self.offset) as *mut T }
    }

    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        Some(unsafe { self.as_ptr().add(index).read() }.from_stored())
    }

    pub fn set(&self, index: usize, value: T) -> Result<()> {
        if index >= self.len {
            return Err(StructError::index_out_of_bounds(index, self.len));
        }
        unsafe { self.as_ptr().add(index).write(value.to_stored()) };
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Overwrite the first `values.len()` elements
    pub fn copy_from_slice(&self, values: &[T]) -> Result<()> {
        if values.len() > self.len {
            return Err(StructError::index_out_of_bounds(values.len(), self.len));
        }
        for (i, v) in values.iter().enumerate() {
            unsafe { self.as_ptr().add(i).write(v.to_stored()) };
        }
        Ok(())
    }

    pub fn fill(&self, value: T) {
        for i in 0..self.len {
            unsafe { self.as_ptr().add(i).write(value.to_stored()) };
        }
    }

    /// Borrow the elements as a slice.
    ///
    /// # Safety
    /// No other view, accessor or execution context may write these bytes
    /// while the slice is alive. Values are in stored (little-endian) order.
    pub unsafe fn as_slice(&self) -> &[T] {
        slice::from_raw_parts(self.as_ptr(), self.len)
    }

    /// Borrow the elements mutably.
    ///
    /// # Safety
    /// No other view, accessor or execution context may read or write these
    /// bytes while the slice is alive. Values are in stored (little-endian)
    /// order.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [T] {
        slice::from_raw_parts_mut(self.as_ptr(), self.len)
    }
}

impl<T: AtomicElement> TypedView<T> {
    /// The elements as atomics, for coordination across threads that bind
    /// the same shared region. Atomic operations use native byte order,
    /// which matches the stored order on little-endian targets.
    pub fn atomics(&self) -> &[T::Atomic] {
        // Atomic types have the size of T and alignment equal to their
        // size, which `new` has checked.
        unsafe { slice::from_raw_parts(self.as_ptr() as *const T::Atomic, self.len) }
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for TypedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
