/*!
Memory that buffers read from and write into.

Storage comes in three flavours that share one accessor trait, [`Memory`](trait.Memory.html):

- heap: a `Vec<T>` owned by the storage,
- direct: memory outside of the allocator, either page-mapped by us
  or handed over by the caller as a raw pointer,
- mapped: a file region mapped by someone else, see [`Mapping`](struct.Mapping.html).

Buffers never own storage exclusively: all views of the same storage hold
an `Rc<RefCell<Backing<T>>>`, and every access borrows it for the duration
of a single operation.
*/
use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::Result;

/// Uniform access to a contiguous run of elements, wherever it lives
pub trait Memory<T> {
	/// Number of elements available
	fn len(&self) -> usize;
	fn as_slice(&self) -> Result<&[T]>;
	fn as_mut_slice(&mut self) -> Result<&mut [T]>;
}

/// What kind of memory backs a buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
	Heap,
	Direct,
	Mapped,
}

pub enum Backing<T> {
	Heap(Vec<T>),
	Direct(DirectMemory<T>),
	Mapped(MappedMemory<T>),
}

impl<T: Copy> Backing<T> {
	pub fn kind(&self) -> StorageKind {
		match self {
			Backing::Heap(_) => StorageKind::Heap,
			Backing::Direct(_) => StorageKind::Direct,
			Backing::Mapped(_) => StorageKind::Mapped,
		}
	}
	// pointer to the first element, for native I/O that only reads
	pub(crate) fn base_ptr(&self) -> Result<NonNull<T>> {
		let slice = self.as_slice()?;
		// slices never hand out null pointers, even when empty
		Ok(NonNull::new(slice.as_ptr() as *mut T).unwrap_or_else(NonNull::dangling))
	}
	pub(crate) fn base_ptr_mut(&mut self) -> Result<NonNull<T>> {
		let slice = self.as_mut_slice()?;
		Ok(NonNull::new(slice.as_mut_ptr()).unwrap_or_else(NonNull::dangling))
	}
}

impl<T: Copy> Memory<T> for Backing<T> {
	fn len(&self) -> usize {
		match self {
			Backing::Heap(m) => Memory::len(m),
			Backing::Direct(m) => Memory::len(m),
			Backing::Mapped(m) => Memory::len(m),
		}
	}
	fn as_slice(&self) -> Result<&[T]> {
		match self {
			Backing::Heap(m) => Memory::as_slice(m),
			Backing::Direct(m) => Memory::as_slice(m),
			Backing::Mapped(m) => Memory::as_slice(m),
		}
	}
	fn as_mut_slice(&mut self) -> Result<&mut [T]> {
		match self {
			Backing::Heap(m) => Memory::as_mut_slice(m),
			Backing::Direct(m) => Memory::as_mut_slice(m),
			Backing::Mapped(m) => Memory::as_mut_slice(m),
		}
	}
}

pub(crate) type Shared<T> = Rc<RefCell<Backing<T>>>;

pub(crate) fn share<T>(backing: Backing<T>) -> Shared<T> {
	Rc::new(RefCell::new(backing))
}

/**
Remaining region of a buffer expressed in bytes, for zero-copy native I/O.

`base` points to the start of the storage, the region itself
is `base + offset .. base + offset + len`.
Pointers are only good for as long as the storage is alive
and, for mapped storage, until the mapping is invalidated.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRegion {
	pub base: NonNull<u8>,
	pub offset: usize,
	pub len: usize,
	/// Whether the region may be written through (i.e. the view isn't read-only)
	pub writable: bool,
}

impl RawRegion {
	/// Pointer to the first byte of the region
	pub fn as_ptr(&self) -> *mut u8 {
		self.base.as_ptr().wrapping_add(self.offset)
	}
}

mod heap;

mod direct;
pub use direct::*;

mod mmap;
pub use mmap::*;

#[cfg(test)]
pub(crate) use mmap::tests::FakeRegion;
