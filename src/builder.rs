use log::debug;

use crate::buffer::Buffer;
use crate::element::Element;
use crate::error::Result;
use crate::order::ByteOrder;

/**
Configures and creates buffers.

```
use cursor_buffers::{BufferBuilder, ByteOrder};

let buf = BufferBuilder::new()
	.capacity(4096)
	.order(ByteOrder::LittleEndian)
	.direct(true)
	.build::<u8>()
	.unwrap();
assert!(buf.is_direct());
assert_eq!(buf.order(), ByteOrder::LittleEndian);
```
*/
#[derive(Clone, Copy, Debug)]
pub struct BufferBuilder {
	capacity: usize,
	order: ByteOrder,
	direct: bool,
	read_only: bool,
}

impl Default for BufferBuilder {
	fn default() -> Self {
		BufferBuilder::new()
	}
}

impl BufferBuilder {
	pub fn new() -> Self {
		BufferBuilder {
			capacity: 8192,
			order: ByteOrder::default(),
			direct: false,
			read_only: false,
		}
	}

	/// Number of elements; ignored by [`build_from()`](#method.build_from)
	pub fn capacity(mut self, capacity: usize) -> Self {
		self.capacity = capacity;
		self
	}

	pub fn order(mut self, order: ByteOrder) -> Self {
		self.order = order;
		self
	}

	/// Use page-mapped memory outside of the heap
	pub fn direct(mut self, direct: bool) -> Self {
		self.direct = direct;
		self
	}

	pub fn read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	fn finish<T: Element>(&self, buf: Buffer<T>) -> Buffer<T> {
		let buf = buf.with_order(self.order);
		if self.read_only {
			buf.into_read_only()
		} else {
			buf
		}
	}

	fn allocate<T: Element>(&self, capacity: usize) -> Result<Buffer<T>> {
		if self.direct {
			Buffer::allocate_direct(capacity)
		} else {
			Ok(Buffer::allocate(capacity))
		}
	}

	/// Zero-filled buffer
	pub fn build<T: Element>(self) -> Result<Buffer<T>> {
		debug!("building buffer with {:?}", self);
		let buf = self.allocate(self.capacity)?;
		Ok(self.finish(buf))
	}

	/// Buffer holding a copy of `data`, exactly as long as `data` is
	pub fn build_from<T: Element>(self, data: &[T]) -> Result<Buffer<T>> {
		debug!("building buffer of {} elements with {:?}", data.len(), self);
		let mut buf = self.allocate(data.len())?;
		buf.put_slice(data)?;
		buf.flip();
		Ok(self.finish(buf))
	}
}
