/*!
Byte buffers, on top of everything else, can be read and written as any other element type
in either byte order, be viewed as buffers of other elements,
and may be backed by mapped files.
*/
use std::rc::Rc;

use log::trace;
use memchr::memchr;

use super::{Access, Buffer};
use crate::cursor::Cursor;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::order::ByteOrder;
use crate::storage::{Backing, MappedMemory, Mapping, Memory, Shared};

macro_rules! typed_access {
	($($t:ty => $get:ident, $get_at:ident, $put:ident, $put_at:ident;)*) => {$(
		pub fn $get(&mut self) -> Result<$t> {
			self.get_as::<$t>()
		}
		pub fn $get_at(&self, index: usize) -> Result<$t> {
			self.get_as_at::<$t>(index)
		}
		pub fn $put(&mut self, value: $t) -> Result<&mut Self> {
			self.put_as::<$t>(value)
		}
		pub fn $put_at(&mut self, index: usize, value: $t) -> Result<&mut Self> {
			self.put_as_at::<$t>(index, value)
		}
	)*}
}

impl Buffer<u8> {
	/**
	Byte buffer over a mapped file region.

	The buffer covers the whole region; every access fails with
	[`Error::InvalidatedMapping`](enum.Error.html) once [`Mapping::invalidate()`](struct.Mapping.html#method.invalidate) is called.
	*/
	pub fn map(mapping: Rc<Mapping>) -> Result<Self> {
		let memory = MappedMemory::new(mapping)?;
		let len = Memory::len(&memory);
		Ok(Self::over(Backing::Mapped(memory), Cursor::new(len)))
	}

	// both kinds of access keep bytes in the very same storage
	fn bytes(&self) -> &Shared<u8> {
		match &self.access {
			Access::Elements(s) | Access::Bytes(s) => s,
		}
	}

	/// Changes how multi-byte values are read and written from now on
	pub fn set_order(&mut self, order: ByteOrder) -> &mut Self {
		self.order = order;
		self
	}

	fn decode_at<E: Element>(&self, i: usize) -> Result<E> {
		let at = self.at(i);
		let storage = self.bytes().try_borrow()?;
		let slice = storage.as_slice()?;
		Ok(E::decode(&slice[ at .. at + E::SIZE ], self.order))
	}

	fn encode_at<E: Element>(&self, i: usize, value: E) -> Result<()> {
		let at = self.at(i);
		let mut storage = self.bytes().try_borrow_mut()?;
		value.encode(&mut storage.as_mut_slice()?[ at .. at + E::SIZE ], self.order);
		Ok(())
	}

	/// Read `E::SIZE` bytes at the position as an `E`, and advance past them
	pub fn get_as<E: Element>(&mut self) -> Result<E> {
		let i = self.cursor.ensure_get(E::SIZE)?;
		let value = self.decode_at(i)?;
		self.cursor.advance(E::SIZE);
		Ok(value)
	}

	/// Read `E::SIZE` bytes starting at `index` as an `E`; the index need not be aligned
	pub fn get_as_at<E: Element>(&self, index: usize) -> Result<E> {
		let i = self.cursor.check_index(index, E::SIZE)?;
		self.decode_at(i)
	}

	pub fn put_as<E: Element>(&mut self, value: E) -> Result<&mut Self> {
		self.writable()?;
		let i = self.cursor.ensure_put(E::SIZE)?;
		self.encode_at(i, value)?;
		self.cursor.advance(E::SIZE);
		Ok(self)
	}

	pub fn put_as_at<E: Element>(&mut self, index: usize, value: E) -> Result<&mut Self> {
		self.writable()?;
		let i = self.cursor.check_index(index, E::SIZE)?;
		self.encode_at(i, value)?;
		Ok(self)
	}

	typed_access! {
		i8 => get_i8, get_i8_at, put_i8, put_i8_at;
		u16 => get_u16, get_u16_at, put_u16, put_u16_at;
		i16 => get_i16, get_i16_at, put_i16, put_i16_at;
		u32 => get_u32, get_u32_at, put_u32, put_u32_at;
		i32 => get_i32, get_i32_at, put_i32, put_i32_at;
		u64 => get_u64, get_u64_at, put_u64, put_u64_at;
		i64 => get_i64, get_i64_at, put_i64, put_i64_at;
		f32 => get_f32, get_f32_at, put_f32, put_f32_at;
		f64 => get_f64, get_f64_at, put_f64, put_f64_at;
	}

	/**
	Remaining bytes as a buffer of `E`s, in this buffer's current byte order.

	Trailing bytes that don't make up a whole `E` are left out.
	Changing the byte order of this buffer later on doesn't affect the view.
	*/
	pub fn as_view<E: Element>(&self) -> Result<Buffer<E>> {
		self.view_of(self.remaining() / E::SIZE)
	}

	/// Like [`as_view()`](#method.as_view), but exactly `count` elements long
	pub fn view_of<E: Element>(&self, count: usize) -> Result<Buffer<E>> {
		let available = self.remaining();
		match count.checked_mul(E::SIZE) {
			Some(requested) if requested <= available => {},
			requested => return Err(Error::AlignmentOrBounds {
				requested: requested.unwrap_or(usize::max_value()),
				available,
			}),
		}
		trace!("viewing {} bytes of {:?} as {} elements", count * E::SIZE, self, count);
		Ok(Buffer {
			access: Access::Bytes(self.bytes().clone()),
			kind: self.kind,
			offset: self.at(self.position()),
			cursor: Cursor::new(count),
			read_only: self.read_only,
			order: self.order,
		})
	}

	// address of byte 0 of this buffer
	fn address(&self) -> Result<usize> {
		let base = self.bytes().try_borrow()?.base_ptr()?;
		Ok(base.as_ptr() as usize + self.offset)
	}

	/**
	How far the memory address of byte `index` is past a multiple of `unit`.

	`unit` must be a power of two; `index` may be anything up to the capacity.
	*/
	pub fn alignment_offset(&self, index: usize, unit: usize) -> Result<usize> {
		if !unit.is_power_of_two() {
			return Err(Error::UnsupportedOperation("unit size must be a power of two"));
		}
		if index > self.capacity() {
			return Err(Error::IndexOutOfRange { index, bound: self.capacity() });
		}
		Ok(self.address()?.wrapping_add(index) & (unit - 1))
	}

	/*
	before:
	|  xxxxxxxxxx    |
	|   |   |   |   |  unit boundaries
	   |position |limit

	after:
	    |xxxxxxx|
	    |       |limit
	    |position
	*/
	/// Slice of the remaining bytes trimmed on both ends to memory addresses aligned to `unit`
	pub fn aligned_slice(&self, unit: usize) -> Result<Buffer<u8>> {
		let (position, limit) = (self.position(), self.limit());
		let position_mod = self.alignment_offset(position, unit)?;
		let limit_mod = self.alignment_offset(limit, unit)?;
		let mut from = if position_mod > 0 { position + (unit - position_mod) } else { position };
		let mut to = limit - limit_mod;
		if from > limit || to < position {
			// not a single aligned unit in there
			from = position;
			to = position;
		}
		Ok(self.slice_range(from, to))
	}

	/// Offset of the first `needle` among the remaining bytes, relative to the position
	pub fn find(&self, needle: u8) -> Result<Option<usize>> {
		let range = self.at(self.position()) .. self.at(self.limit());
		let storage = self.bytes().try_borrow()?;
		let slice = storage.as_slice()?;
		Ok(memchr(needle, &slice[range]))
	}

	fn mapping(&self) -> Result<Rc<Mapping>> {
		match &*self.bytes().try_borrow()? {
			Backing::Mapped(m) => Ok(m.mapping().clone()),
			_ => Err(Error::UnsupportedOperation("buffer is not memory-mapped")),
		}
	}

	/// Write changes made through this buffer back to the mapped file
	pub fn force(&self) -> Result<()> {
		self.mapping()?.flush(self.offset, self.capacity())
	}

	/// Whether contents of this buffer are likely resident in physical memory
	pub fn is_loaded(&self) -> Result<bool> {
		self.mapping()?.is_loaded(self.offset, self.capacity())
	}

	/// Ask for contents of this buffer to be brought into physical memory
	pub fn load(&self) -> Result<()> {
		self.mapping()?.load(self.offset, self.capacity())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::order::ByteOrder::*;
	use crate::storage::{FakeRegion, StorageKind};

	#[test]
	fn big_endian_read_as_little() {
		let mut buf = Buffer::<u8>::allocate(8);
		assert_eq!(buf.order(), BigEndian);
		buf.put_u32_at(0, 0x0102_0304).unwrap();
		assert_eq!(buf.get_at(0).unwrap(), 1);
		assert_eq!(buf.get_u32_at(0).unwrap(), 0x0102_0304);

		buf.set_order(LittleEndian);
		assert_eq!(buf.get_u32_at(0).unwrap(), 0x0403_0201);
	}

	#[test]
	fn relative_typed_access() {
		let mut buf = Buffer::<u8>::allocate(15);
		buf.put_u16(0xbeef).unwrap()
			.put_i32(-7).unwrap()
			.put_f64(2.5).unwrap()
			.put(0xff).unwrap();
		assert_eq!(buf.position(), 15);
		buf.flip();
		assert_eq!(buf.get_u16().unwrap(), 0xbeef);
		assert_eq!(buf.get_i32().unwrap(), -7);
		assert_eq!(buf.get_f64().unwrap(), 2.5);
		assert_eq!(buf.get_i8().unwrap(), -1);
	}

	#[test]
	fn typed_access_bounds() {
		let mut buf = Buffer::<u8>::allocate(6);
		buf.set_position(3).unwrap();
		assert!(matches!(buf.put_u32(1), Err(Error::BufferOverflow { requested: 4, remaining: 3 })));
		assert!(matches!(buf.get_u64(), Err(Error::BufferUnderflow { requested: 8, remaining: 3 })));
		assert_eq!(buf.position(), 3);

		// unaligned absolute access is fine as long as it fits below the limit
		buf.put_u32_at(1, 0xdead_beef).unwrap();
		assert_eq!(buf.get_u32_at(1).unwrap(), 0xdead_beef);
		assert!(matches!(buf.get_u32_at(3), Err(Error::IndexOutOfRange { index: 3, bound: 6 })));

		assert!(matches!(buf.as_read_only().put_u16_at(0, 1), Err(Error::ReadOnly)));
	}

	#[test]
	fn int_view() {
		let mut buf = Buffer::<u8>::allocate(10);
		buf.set_order(LittleEndian);
		buf.put(0xaa).unwrap();
		let mut ints = buf.as_view::<u32>().unwrap();
		// 9 remaining bytes make up two whole u32s
		assert_eq!(ints.capacity(), 2);
		assert_eq!(ints.order(), LittleEndian);
		ints.put(0x1122_3344).unwrap();
		assert_eq!(buf.get_at(1).unwrap(), 0x44);
		assert_eq!(buf.get_at(4).unwrap(), 0x11);

		// changing byte order afterwards only affects the byte buffer
		buf.set_order(BigEndian);
		assert_eq!(ints.get_at(0).unwrap(), 0x1122_3344);
		assert_eq!(buf.get_u32_at(1).unwrap(), 0x4433_2211);

		buf.put_u32_at(5, 7).unwrap();
		assert_eq!(ints.get_at(1).unwrap(), 0x0700_0000);
	}

	#[test]
	fn view_bounds() {
		let mut buf = Buffer::<u8>::allocate(16);
		buf.set_position(4).unwrap();
		assert!(matches!(buf.view_of::<u64>(2), Err(Error::AlignmentOrBounds { requested: 16, available: 12 })));
		assert!(matches!(buf.view_of::<u64>(usize::max_value()), Err(Error::AlignmentOrBounds { .. })));
		assert_eq!(buf.view_of::<u16>(6).unwrap().capacity(), 6);
	}

	#[test]
	fn view_follows_buffer_contract() {
		let buf = Buffer::<u8>::allocate(12);
		let mut shorts = buf.as_view::<i16>().unwrap();
		shorts.put_slice(&[1, 2, 3, 4, 5, 6]).unwrap();
		assert!(matches!(shorts.put(7), Err(Error::BufferOverflow { .. })));
		shorts.flip();
		shorts.get().unwrap();
		shorts.get().unwrap();
		shorts.compact().unwrap();
		assert_eq!(shorts.position(), 4);
		shorts.flip();
		assert_eq!(shorts.to_vec().unwrap(), vec![3, 4, 5, 6]);
		assert_eq!(buf.get_i16_at(0).unwrap(), 3);

		shorts.set_position(1).unwrap();
		let mut tail = shorts.slice();
		tail.put_at(0, -1).unwrap();
		assert_eq!(buf.get_i16_at(2).unwrap(), -1);

		let mut dst = [0i16; 3];
		tail.get_into(&mut dst).unwrap();
		assert_eq!(dst, [-1, 5, 6]);

		assert!(buf.as_read_only().as_view::<i16>().unwrap().is_read_only());
		assert!(!shorts.has_array());
		assert!(matches!(shorts.with_remaining(|_| ()), Err(Error::UnsupportedOperation(_))));
	}

	#[test]
	fn view_raw_region() {
		let mut buf = Buffer::<u8>::allocate(16);
		buf.set_position(2).unwrap();
		let mut longs = buf.as_view::<u64>().unwrap();
		longs.get().unwrap();
		let region = longs.raw_region().unwrap();
		assert_eq!(region.offset, 10);
		assert_eq!(region.len, 0);
	}

	#[test]
	fn alignment() {
		let buf = Buffer::<u8>::allocate_direct(64).unwrap();
		// native memory is page aligned
		assert_eq!(buf.alignment_offset(0, 8).unwrap(), 0);
		assert_eq!(buf.alignment_offset(13, 8).unwrap(), 5);
		assert!(matches!(buf.alignment_offset(0, 3), Err(Error::UnsupportedOperation(_))));
		assert!(matches!(buf.alignment_offset(65, 8), Err(Error::IndexOutOfRange { .. })));
	}

	#[test]
	fn alignment_while_borrowed() {
		let buf = Buffer::<u8>::allocate_direct(16).unwrap();
		let dup = buf.duplicate();
		let offset = buf.with_remaining(|_| dup.alignment_offset(3, 4)).unwrap().unwrap();
		assert_eq!(offset, 3);
	}

	#[test]
	fn aligned_slice() {
		let mut buf = Buffer::<u8>::allocate_direct(64).unwrap();
		buf.set_position(3).unwrap();
		buf.set_limit(30).unwrap();
		let aligned = buf.aligned_slice(8).unwrap();
		assert_eq!(aligned.capacity(), 16);
		assert_eq!(aligned.alignment_offset(0, 8).unwrap(), 0);

		buf.set_position(9).unwrap();
		buf.set_limit(15).unwrap();
		assert_eq!(buf.aligned_slice(8).unwrap().capacity(), 0);
	}

	#[test]
	fn find() {
		let mut buf = Buffer::from_slice(b"lorem ipsum dolor");
		assert_eq!(buf.find(b' ').unwrap(), Some(5));
		buf.set_position(6).unwrap();
		assert_eq!(buf.find(b' ').unwrap(), Some(5));
		buf.set_limit(11).unwrap();
		assert_eq!(buf.find(b' ').unwrap(), None);
	}

	#[test]
	fn mapped() {
		let region = FakeRegion::new(32);
		let flushed = region.flushed.clone();
		let mapping = Mapping::new(region).unwrap();
		let mut buf = Buffer::map(mapping.clone()).unwrap();
		assert_eq!(buf.capacity(), 32);
		assert_eq!(buf.storage_kind(), StorageKind::Mapped);
		assert!(buf.is_direct());

		buf.put_u64(42).unwrap();
		let mut tail = buf.slice();
		tail.put(1).unwrap();
		tail.force().unwrap();
		assert!(tail.is_loaded().unwrap());
		tail.load().unwrap();
		assert_eq!(*flushed.borrow(), vec![(8, 24)]);

		mapping.invalidate();
		assert!(matches!(buf.get_at(0), Err(Error::InvalidatedMapping)));
		assert!(matches!(tail.put(2), Err(Error::InvalidatedMapping)));
		assert_eq!(tail.position(), 1);
		assert!(matches!(buf.force(), Err(Error::InvalidatedMapping)));
		// cursor-only operations still work
		buf.flip();
		assert_eq!(buf.limit(), 8);
	}

	#[test]
	fn not_mapped() {
		let buf = Buffer::<u8>::allocate(4);
		assert!(matches!(buf.force(), Err(Error::UnsupportedOperation(_))));
	}
}
