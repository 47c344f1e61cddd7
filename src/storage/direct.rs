/*
Native memory comes from slice-deque's mirrored buffer:
it's an anonymous mapping straight from the OS, page-aligned and outside of the allocator,
which is exactly what native I/O wants to see.

The mirroring itself is of no use to us, and slice-deque, as usual,
reports the overall size of both halves rather than one of them,
so we only ever hand out the first `len` elements of the first half.
*/
use std::ptr::{self, NonNull};
use std::slice;

use log::debug;
use slice_deque::Buffer as Pages;

use super::Memory;
use crate::error::{Error, Result};

pub enum DirectMemory<T> {
	/// Page memory allocated (and released) by the storage itself
	Native {
		pages: Pages<T>,
		len: usize,
	},
	/// Memory owned by the caller; we only keep a pointer to it
	Foreign {
		ptr: NonNull<T>,
		len: usize,
	},
}

impl<T: Copy + Default> DirectMemory<T> {
	pub(crate) fn allocate(len: usize) -> Result<Self> {
		if len == 0 {
			// nothing to map, and a dangling pointer is a perfectly fine empty slice
			return Ok(DirectMemory::Foreign { ptr: NonNull::dangling(), len: 0 });
		}
		// both halves have to fit into an allocation size in bytes
		let mirrored = len.checked_mul(2)
			.filter(|n| n.checked_mul(std::mem::size_of::<T>()).is_some())
			.ok_or(Error::CapacityOverflow { requested: len })?;
		let mut pages = Pages::uninitialized(mirrored)?;
		// slice-deque rounds the size up to the allocation granularity,
		// we're only interested in the first `len` elements though
		debug!("mapped {} bytes of native memory for {} elements", pages.len() / 2 * std::mem::size_of::<T>(), len);
		unsafe {
			let base: *mut T = pages.as_mut_slice().as_mut_ptr();
			for i in 0..len {
				ptr::write(base.add(i), T::default());
			}
		}
		Ok(DirectMemory::Native { pages, len })
	}

	/**
	Borrow `len` elements of caller-owned memory starting at `ptr`.

	# Safety

	`ptr` must be valid for reads and writes of `len` elements
	for as long as any buffer created over it is alive,
	and nothing else may access that memory in the meantime.
	*/
	pub(crate) unsafe fn foreign(ptr: *mut T, len: usize) -> Result<Self> {
		let ptr = NonNull::new(ptr).ok_or(Error::MissingArgument("pointer to direct memory"))?;
		Ok(DirectMemory::Foreign { ptr, len })
	}
}

impl<T: Copy> Memory<T> for DirectMemory<T> {
	fn len(&self) -> usize {
		match self {
			DirectMemory::Native { len, .. } => *len,
			DirectMemory::Foreign { len, .. } => *len,
		}
	}
	fn as_slice(&self) -> Result<&[T]> {
		Ok(match self {
			DirectMemory::Native { pages, len } => &(unsafe {
				pages.as_slice()
			})[ .. *len ],
			DirectMemory::Foreign { ptr, len } => unsafe {
				slice::from_raw_parts(ptr.as_ptr(), *len)
			},
		})
	}
	fn as_mut_slice(&mut self) -> Result<&mut [T]> {
		Ok(match self {
			DirectMemory::Native { pages, len } => &mut (unsafe {
				pages.as_mut_slice()
			})[ .. *len ],
			DirectMemory::Foreign { ptr, len } => unsafe {
				slice::from_raw_parts_mut(ptr.as_ptr(), *len)
			},
		})
	}
}
