use std::cell::Cell;
use std::io;
use std::rc::Rc;

use cursor_buffers::*;

fn allocate_all<T: Element>(n: usize) -> Vec<Buffer<T>> {
	let mut out = vec![
		Buffer::<T>::allocate(n),
		Buffer::<T>::allocate_direct(n).unwrap(),
		BufferBuilder::new().capacity(n).build::<T>().unwrap(),
	];
	if T::SIZE > 1 {
		out.push(Buffer::<u8>::allocate(n * T::SIZE).as_view::<T>().unwrap());
	}
	out
}

#[test]
fn fresh_buffers() {
	for buf in allocate_all::<u64>(7) {
		assert_eq!(buf.capacity(), 7, "{:?}", buf);
		assert_eq!(buf.limit(), 7);
		assert_eq!(buf.position(), 0);
		assert_eq!(buf.cursor().mark_value(), None);
	}
}

#[test]
fn write_flip_read() {
	for mut buf in allocate_all::<i32>(10) {
		let written = [3, -1, 4, -1, 5, 9];
		for &v in &written {
			buf.put(v).unwrap();
		}
		buf.flip();
		let mut read = vec![];
		while buf.has_remaining() {
			read.push(buf.get().unwrap());
		}
		assert_eq!(read, written);
		assert!(matches!(buf.get(), Err(Error::BufferUnderflow { .. })));
	}
}

#[test]
fn mark_reset_restores_position() {
	for mut buf in allocate_all::<f64>(8) {
		buf.set_position(3).unwrap();
		buf.mark();
		for _ in 0..4 {
			buf.get().unwrap();
		}
		buf.reset().unwrap();
		assert_eq!(buf.position(), 3);
	}
}

#[test]
fn slice_writes_show_through() {
	for mut buf in allocate_all::<u16>(9) {
		buf.set_position(4).unwrap();
		let k = buf.remaining();
		let mut s = buf.slice();
		assert_eq!(s.capacity(), k);
		for i in 0..k {
			s.put(100 + i as u16).unwrap();
		}
		for i in 0..k {
			assert_eq!(buf.get_at(4 + i).unwrap(), 100 + i as u16);
		}
	}
}

#[test]
fn compact_after_partial_read() {
	for mut buf in allocate_all::<u8>(10) {
		for i in 0..10 {
			buf.put(i).unwrap();
		}
		buf.flip();
		for _ in 0..3 {
			buf.get().unwrap();
		}
		buf.compact().unwrap();
		assert_eq!(buf.position(), 7);
		assert_eq!(buf.limit(), buf.capacity());
		assert_eq!(buf.get_at(0).unwrap(), 3);
		assert_eq!(buf.get_at(6).unwrap(), 9);
	}
}

#[test]
fn read_only_put_leaves_state() {
	for buf in allocate_all::<i16>(4) {
		let mut ro = buf.as_read_only();
		ro.set_position(1).unwrap();
		ro.mark();
		let before = *ro.cursor();
		assert!(matches!(ro.put(5), Err(Error::ReadOnly)));
		assert!(matches!(ro.put_at(2, 5), Err(Error::ReadOnly)));
		assert_eq!(*ro.cursor(), before);
	}
}

#[test]
fn byte_order_swap() {
	let mut buf = Buffer::<u8>::allocate(4);
	buf.put_as::<u32>(0x0102_0304).unwrap();
	buf.flip();
	let mut le = buf.duplicate();
	le.set_order(ByteOrder::LittleEndian);
	assert_eq!(buf.get_as::<u32>().unwrap(), 0x0102_0304);
	assert_eq!(le.get_as::<u32>().unwrap(), 0x0403_0201);
}

// anonymous memory standing in for a file mapping
struct Region {
	memory: Buffer<u8>,
	base: *mut u8,
	flushes: Rc<Cell<usize>>,
}

unsafe impl MappedRegion for Region {
	fn as_ptr(&self) -> *mut u8 {
		self.base
	}
	fn len(&self) -> usize {
		self.memory.capacity()
	}
	fn flush(&self, _offset: usize, _len: usize) -> io::Result<()> {
		self.flushes.set(self.flushes.get() + 1);
		Ok(())
	}
}

#[test]
fn mapping_lifecycle() {
	let memory = Buffer::<u8>::allocate_direct(4096).unwrap();
	let region = memory.raw_region().unwrap();
	let flushes = Rc::new(Cell::new(0));
	let mapping = Mapping::new(Region {
		memory,
		base: region.as_ptr(),
		flushes: flushes.clone(),
	}).unwrap();

	let mut buf = Buffer::map(mapping.clone()).unwrap();
	assert_eq!(buf.capacity(), 4096);
	buf.put_f32(1.25).unwrap();
	buf.force().unwrap();
	assert_eq!(flushes.get(), 1);

	let mut view = buf.duplicate();
	view.flip();
	assert_eq!(view.get_f32().unwrap(), 1.25);

	mapping.invalidate();
	assert!(!mapping.is_valid());
	view.rewind();
	assert!(matches!(view.get_f32(), Err(Error::InvalidatedMapping)));
	assert_eq!(view.position(), 0);
	assert!(matches!(buf.put(0), Err(Error::InvalidatedMapping)));
	assert!(matches!(buf.raw_region(), Err(Error::InvalidatedMapping)));
}

#[test]
fn native_io_region() {
	let mut buf = Buffer::<u8>::allocate_direct(32).unwrap();
	buf.put_slice(b"header").unwrap();
	let region = buf.raw_region().unwrap();
	assert_eq!((region.offset, region.len), (6, 26));

	// pretend a native read filled in 4 bytes
	unsafe {
		std::ptr::copy_nonoverlapping(b"body".as_ptr(), region.as_ptr(), 4);
	}
	let n = buf.position() + 4;
	buf.set_position(n).unwrap();
	buf.flip();
	assert_eq!(buf.to_vec().unwrap(), b"headerbody".to_vec());
}
