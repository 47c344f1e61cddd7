use std::any::type_name;
use std::cell::{Ref, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::mem::size_of;
use std::ops::Range;
use std::ptr::NonNull;

// https://github.com/rust-lang/rust/issues/54236
use copy_in_place::*;
use log::trace;

use crate::cursor::Cursor;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use crate::storage::{share, Backing, DirectMemory, Memory, RawRegion, Shared, StorageKind};

mod bytes;

// how elements of a buffer are laid out in its storage
enum Access<T> {
	// storage holds elements of the buffer's own type
	Elements(Shared<T>),
	// storage holds bytes, every element takes `T::SIZE` of them, in buffer's byte order
	Bytes(Shared<u8>),
}

impl<T> Clone for Access<T> {
	fn clone(&self) -> Self {
		match self {
			Access::Elements(s) => Access::Elements(s.clone()),
			Access::Bytes(s) => Access::Bytes(s.clone()),
		}
	}
}

/**
Fixed-capacity container of `T`s with a position/limit/mark cursor.

Relative operations (`get()`, `put()`, bulk transfers) work at the position and advance it;
absolute ones (`get_at()`, `put_at()`) take an index below the limit and leave the cursor alone.

Views created with [`duplicate()`](#method.duplicate), [`slice()`](#method.slice),
[`as_read_only()`](#method.as_read_only), or [`Buffer::<u8>::as_view()`](#method.as_view)
share storage with the buffer they came from, but have cursors of their own:
writes through one view are visible through the others.

## Example usage

```
use cursor_buffers::{Buffer, Error};

# fn main() -> Result<(), Error> {
let mut buf = Buffer::<u32>::allocate(4);
buf.put(1)?.put(2)?.put(3)?;
buf.flip();

assert_eq!(buf.get()?, 1);
// hand the rest over without copying anything
let mut rest = buf.slice();
assert_eq!(rest.capacity(), 2);
rest.put_at(0, 20)?;
assert_eq!(buf.get()?, 20);
# Ok(())
# }
```

Buffers are not thread-safe: storage is reference-counted with `Rc`,
and two views can only touch it at the same time if neither writes.
*/
pub struct Buffer<T: Element> {
	access: Access<T>,
	kind: StorageKind,
	// where element 0 resides within storage, in storage units (elements or bytes)
	offset: usize,
	cursor: Cursor,
	read_only: bool,
	order: ByteOrder,
}

impl<T: Element> Buffer<T> {
	fn over(backing: Backing<T>, cursor: Cursor) -> Self {
		let kind = backing.kind();
		Buffer {
			access: Access::Elements(share(backing)),
			kind,
			offset: 0,
			cursor,
			read_only: false,
			order: ByteOrder::default(),
		}
	}

	/// New heap buffer of `capacity` zeroed elements
	pub fn allocate(capacity: usize) -> Self {
		trace!("allocating heap buffer of {} {}", capacity, type_name::<T>());
		Self::over(Backing::Heap(vec![T::default(); capacity]), Cursor::new(capacity))
	}

	/// New buffer of `capacity` zeroed elements in page-mapped memory outside of the allocator
	pub fn allocate_direct(capacity: usize) -> Result<Self> {
		trace!("allocating direct buffer of {} {}", capacity, type_name::<T>());
		let memory = DirectMemory::allocate(capacity)?;
		Ok(Self::over(Backing::Direct(memory), Cursor::new(capacity)))
	}

	/// Take over `data`; the whole of it is available for reading and writing
	pub fn wrap(data: Vec<T>) -> Self {
		let capacity = data.len();
		Self::over(Backing::Heap(data), Cursor::new(capacity))
	}

	/**
	Take over `data`, with the cursor limited to `offset .. offset+len`.

	Capacity is still the whole length of `data`.
	*/
	pub fn wrap_range(data: Vec<T>, offset: usize, len: usize) -> Result<Self> {
		let capacity = data.len();
		let limit = offset.checked_add(len)
			.ok_or(Error::IndexOutOfRange { index: offset, bound: capacity })?;
		let cursor = Cursor::with_range(capacity, offset, limit)?;
		Ok(Self::over(Backing::Heap(data), cursor))
	}

	/// Heap buffer holding a copy of `data`
	pub fn from_slice(data: &[T]) -> Self {
		Self::wrap(data.to_vec())
	}

	/**
	Direct buffer over `len` elements of caller-owned memory at `ptr`.

	Fails with [`Error::MissingArgument`](enum.Error.html) if `ptr` is null.

	# Safety

	`ptr` must be valid for reads and writes of `len` elements of `T`
	for as long as this buffer or any view created from it is alive,
	and the memory must not be accessed other than through these buffers in the meantime.
	*/
	pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Result<Self> {
		let memory = DirectMemory::foreign(ptr, len)?;
		Ok(Self::over(Backing::Direct(memory), Cursor::new(len)))
	}

	pub(crate) fn with_order(mut self, order: ByteOrder) -> Self {
		self.order = order;
		self
	}

	pub(crate) fn into_read_only(mut self) -> Self {
		self.read_only = true;
		self
	}

	// cursor

	pub fn cursor(&self) -> &Cursor {
		&self.cursor
	}
	pub fn capacity(&self) -> usize {
		self.cursor.capacity()
	}
	pub fn position(&self) -> usize {
		self.cursor.position()
	}
	pub fn limit(&self) -> usize {
		self.cursor.limit()
	}
	pub fn remaining(&self) -> usize {
		self.cursor.remaining()
	}
	pub fn has_remaining(&self) -> bool {
		self.cursor.has_remaining()
	}
	pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
		self.cursor.set_position(position)?;
		Ok(self)
	}
	pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self> {
		self.cursor.set_limit(limit)?;
		Ok(self)
	}
	/// Prepare for writing from scratch
	pub fn clear(&mut self) -> &mut Self {
		self.cursor.clear();
		self
	}
	/// Prepare whatever was written so far for reading
	pub fn flip(&mut self) -> &mut Self {
		self.cursor.flip();
		self
	}
	/// Prepare for re-reading the same data
	pub fn rewind(&mut self) -> &mut Self {
		self.cursor.rewind();
		self
	}
	pub fn mark(&mut self) -> &mut Self {
		self.cursor.mark();
		self
	}
	pub fn reset(&mut self) -> Result<&mut Self> {
		self.cursor.reset()?;
		Ok(self)
	}
	pub fn discard_mark(&mut self) -> &mut Self {
		self.cursor.discard_mark();
		self
	}

	// properties

	pub fn is_read_only(&self) -> bool {
		self.read_only
	}
	/// Whether storage lives outside of the heap (direct or mapped memory)
	pub fn is_direct(&self) -> bool {
		self.kind != StorageKind::Heap
	}
	pub fn storage_kind(&self) -> StorageKind {
		self.kind
	}
	/// Byte order used to interpret storage bytes, see [`Buffer::<u8>::set_order()`](#method.set_order)
	pub fn order(&self) -> ByteOrder {
		self.order
	}

	// storage access; indices are relative to element 0 and were checked by the caller

	// storage index of element `i`
	fn at(&self, i: usize) -> usize {
		match self.access {
			Access::Elements(_) => self.offset + i,
			Access::Bytes(_) => self.offset + i * T::SIZE,
		}
	}

	fn writable(&self) -> Result<()> {
		if self.read_only {
			Err(Error::ReadOnly)
		} else {
			Ok(())
		}
	}

	fn read(&self, i: usize) -> Result<T> {
		let at = self.at(i);
		match &self.access {
			Access::Elements(s) => {
				let storage = s.try_borrow()?;
				let slice = storage.as_slice()?;
				Ok(slice[at])
			},
			Access::Bytes(s) => {
				let storage = s.try_borrow()?;
				let slice = storage.as_slice()?;
				Ok(T::decode(&slice[ at .. at + T::SIZE ], self.order))
			},
		}
	}

	fn write(&self, i: usize, value: T) -> Result<()> {
		let at = self.at(i);
		match &self.access {
			Access::Elements(s) => {
				let mut storage = s.try_borrow_mut()?;
				storage.as_mut_slice()?[at] = value;
			},
			Access::Bytes(s) => {
				let mut storage = s.try_borrow_mut()?;
				value.encode(&mut storage.as_mut_slice()?[ at .. at + T::SIZE ], self.order);
			},
		}
		Ok(())
	}

	fn read_run(&self, start: usize, dst: &mut [T]) -> Result<()> {
		let at = self.at(start);
		match &self.access {
			Access::Elements(s) => {
				let storage = s.try_borrow()?;
				dst.copy_from_slice(&storage.as_slice()?[ at .. at + dst.len() ]);
			},
			Access::Bytes(s) => {
				let storage = s.try_borrow()?;
				let raw = &storage.as_slice()?[ at .. at + dst.len() * T::SIZE ];
				for (d, chunk) in dst.iter_mut().zip(raw.chunks_exact(T::SIZE)) {
					*d = T::decode(chunk, self.order);
				}
			},
		}
		Ok(())
	}

	fn write_run(&self, start: usize, src: &[T]) -> Result<()> {
		let at = self.at(start);
		match &self.access {
			Access::Elements(s) => {
				let mut storage = s.try_borrow_mut()?;
				storage.as_mut_slice()?[ at .. at + src.len() ].copy_from_slice(src);
			},
			Access::Bytes(s) => {
				let mut storage = s.try_borrow_mut()?;
				let raw = &mut storage.as_mut_slice()?[ at .. at + src.len() * T::SIZE ];
				for (v, chunk) in src.iter().zip(raw.chunks_exact_mut(T::SIZE)) {
					v.encode(chunk, self.order);
				}
			},
		}
		Ok(())
	}

	// get/put

	/// Read the element at the position and advance past it
	pub fn get(&mut self) -> Result<T> {
		let i = self.cursor.ensure_get(1)?;
		let value = self.read(i)?;
		self.cursor.advance(1);
		Ok(value)
	}

	/// Write `value` at the position and advance past it
	pub fn put(&mut self, value: T) -> Result<&mut Self> {
		self.writable()?;
		let i = self.cursor.ensure_put(1)?;
		self.write(i, value)?;
		self.cursor.advance(1);
		Ok(self)
	}

	pub fn get_at(&self, index: usize) -> Result<T> {
		let i = self.cursor.check_index(index, 1)?;
		self.read(i)
	}

	pub fn put_at(&mut self, index: usize, value: T) -> Result<&mut Self> {
		self.writable()?;
		let i = self.cursor.check_index(index, 1)?;
		self.write(i, value)?;
		Ok(self)
	}

	/// Fill the whole of `dst`, or fail without reading anything if there's not enough remaining
	pub fn get_into(&mut self, dst: &mut [T]) -> Result<&mut Self> {
		let i = self.cursor.ensure_get(dst.len())?;
		self.read_run(i, dst)?;
		self.cursor.advance(dst.len());
		Ok(self)
	}

	/// Write the whole of `src`, or fail without writing anything if there's not enough room
	pub fn put_slice(&mut self, src: &[T]) -> Result<&mut Self> {
		self.writable()?;
		let i = self.cursor.ensure_put(src.len())?;
		self.write_run(i, src)?;
		self.cursor.advance(src.len());
		Ok(self)
	}

	/**
	Move all remaining elements of `src` into this buffer, advancing both.

	`src` may share storage with `self`, overlapping regions included.
	*/
	pub fn put_buffer(&mut self, src: &mut Buffer<T>) -> Result<&mut Self> {
		self.writable()?;
		let n = src.remaining();
		let i = self.cursor.ensure_put(n)?;
		let staged = src.to_vec()?;
		self.write_run(i, &staged)?;
		self.cursor.advance(n);
		src.cursor.advance(n);
		Ok(self)
	}

	/// Copy of the remaining elements; the cursor doesn't move
	pub fn to_vec(&self) -> Result<Vec<T>> {
		let mut out = vec![T::default(); self.remaining()];
		self.read_run(self.position(), &mut out)?;
		Ok(out)
	}

	/*
	before:
	|xxxyyyy   |
	    |   |limit
	    |position

	after:
	|yyyyyyy   |
	     |    |limit
	     |position
	*/
	/// Move the remaining elements to the front and make the rest of the buffer writable
	pub fn compact(&mut self) -> Result<&mut Self> {
		self.writable()?;
		let (position, limit) = (self.position(), self.limit());
		let src = self.at(position) .. self.at(limit);
		match &self.access {
			Access::Elements(s) => compact_storage(s, src, self.offset)?,
			Access::Bytes(s) => compact_storage(s, src, self.offset)?,
		}
		self.cursor.compacted(limit - position);
		Ok(self)
	}

	// views

	fn view(&self, offset: usize, cursor: Cursor, read_only: bool) -> Self {
		Buffer {
			access: self.access.clone(),
			kind: self.kind,
			offset,
			cursor,
			read_only,
			order: self.order,
		}
	}

	/// View of the same storage with a copy of this buffer's cursor
	pub fn duplicate(&self) -> Self {
		trace!("duplicating {:?}", self);
		self.view(self.offset, self.cursor, self.read_only)
	}

	/// Like `duplicate()`, but nothing can be written through the new view
	pub fn as_read_only(&self) -> Self {
		trace!("read-only view of {:?}", self);
		self.view(self.offset, self.cursor, true)
	}

	/// View of the remaining elements, with its own element 0 at the current position
	pub fn slice(&self) -> Self {
		trace!("slicing {:?}", self);
		self.slice_range(self.position(), self.limit())
	}

	fn slice_range(&self, from: usize, to: usize) -> Self {
		self.view(self.at(from), Cursor::new(to - from), self.read_only)
	}

	// native access

	/// Heap buffers that aren't read-only expose their backing `Vec`
	pub fn has_array(&self) -> bool {
		!self.read_only && self.heap_storage().is_some()
	}

	fn heap_storage(&self) -> Option<&Shared<T>> {
		match &self.access {
			Access::Elements(s) if self.kind == StorageKind::Heap => Some(s),
			_ => None,
		}
	}

	fn array_storage(&self) -> Result<&Shared<T>> {
		self.writable()?;
		self.heap_storage().ok_or(Error::UnsupportedOperation("buffer is not backed by an array"))
	}

	/// The whole backing array; element 0 of this buffer is at [`array_offset()`](#method.array_offset)
	pub fn array(&self) -> Result<Ref<[T]>> {
		let storage = self.array_storage()?.try_borrow()?;
		Ok(Ref::map(storage, heap_slice))
	}

	pub fn array_mut(&mut self) -> Result<RefMut<[T]>> {
		let storage = self.array_storage()?.try_borrow_mut()?;
		Ok(RefMut::map(storage, heap_slice_mut))
	}

	pub fn array_offset(&self) -> Result<usize> {
		self.array_storage()?;
		Ok(self.offset)
	}

	/// Run `f` over the remaining elements without copying them
	pub fn with_remaining<R, F: FnOnce(&[T]) -> R>(&self, f: F) -> Result<R> {
		let range = self.at(self.position()) .. self.at(self.limit());
		match &self.access {
			Access::Elements(s) => {
				let storage = s.try_borrow()?;
				let slice = storage.as_slice()?;
				Ok(f(&slice[range]))
			},
			Access::Bytes(_) => Err(Error::UnsupportedOperation("byte-backed view has no element slice")),
		}
	}

	/// Run `f` over the remaining elements, allowing it to modify them in place
	pub fn with_remaining_mut<R, F: FnOnce(&mut [T]) -> R>(&mut self, f: F) -> Result<R> {
		self.writable()?;
		let range = self.at(self.position()) .. self.at(self.limit());
		match &self.access {
			Access::Elements(s) => {
				let mut storage = s.try_borrow_mut()?;
				let slice = storage.as_mut_slice()?;
				Ok(f(&mut slice[range]))
			},
			Access::Bytes(_) => Err(Error::UnsupportedOperation("byte-backed view has no element slice")),
		}
	}

	/**
	Location of the remaining elements in memory, in bytes.

	This is what native I/O gets to read from or write into without copying.
	Writing through the region of a read-only view is not allowed (see `RawRegion::writable`).
	*/
	pub fn raw_region(&self) -> Result<RawRegion> {
		let (base, unit) = match &self.access {
			Access::Elements(s) => (base_of(s, self.read_only)?.cast::<u8>(), size_of::<T>()),
			Access::Bytes(s) => (base_of(s, self.read_only)?, 1),
		};
		Ok(RawRegion {
			base,
			offset: self.at(self.position()) * unit,
			len: self.remaining() * T::SIZE,
			writable: !self.read_only,
		})
	}
}

// read-only views only need to look at the storage
fn base_of<U: Copy>(storage: &Shared<U>, read_only: bool) -> Result<NonNull<U>> {
	if read_only {
		storage.try_borrow()?.base_ptr()
	} else {
		storage.try_borrow_mut()?.base_ptr_mut()
	}
}

// array_storage() made sure these only ever see heap storage
fn heap_slice<T>(backing: &Backing<T>) -> &[T] {
	match backing {
		Backing::Heap(v) => v,
		_ => &[],
	}
}

fn heap_slice_mut<T>(backing: &mut Backing<T>) -> &mut [T] {
	match backing {
		Backing::Heap(v) => v,
		_ => &mut [],
	}
}

fn compact_storage<U: Copy>(storage: &Shared<U>, src: Range<usize>, dest: usize) -> Result<()> {
	let mut storage = storage.try_borrow_mut()?;
	let slice = storage.as_mut_slice()?;
	if src.end - src.start != 0 {
		//slice.copy_within(src, dest)
		copy_in_place(slice, src, dest);
	}
	Ok(())
}

/// Buffers are equal when their remaining elements are; NaN counts as equal to NaN
impl<T: Element> PartialEq for Buffer<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self.to_vec(), other.to_vec()) {
			(Ok(a), Ok(b)) => a.len() == b.len()
				&& a.iter().zip(&b).all(|(x, y)| same(x, y)),
			_ => false,
		}
	}
}

#[allow(clippy::eq_op)]
fn same<T: PartialEq>(x: &T, y: &T) -> bool {
	x == y || (x != x && y != y)
}

/// Lexicographic order of the remaining elements
impl<T: Element> PartialOrd for Buffer<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		match (self.to_vec(), other.to_vec()) {
			(Ok(a), Ok(b)) => a.partial_cmp(&b),
			_ => None,
		}
	}
}

impl<T: Element> fmt::Debug for Buffer<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:?}Buffer<{}>[pos={} lim={} cap={}{}]",
			self.kind, type_name::<T>(),
			self.position(), self.limit(), self.capacity(),
			if self.read_only { " ro" } else { "" },
		)
	}
}
