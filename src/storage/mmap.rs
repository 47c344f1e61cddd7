/*
We don't map files ourselves: whoever does (a file channel, an mmap wrapper, a test)
hands us a `MappedRegion`, and we wrap it into a `Mapping`
that all buffers over that region keep a reference to.

Tearing the mapping down is two-step:
- `Mapping::invalidate()` is the notification, after which every access fails,
- the region itself is dropped (and presumably unmapped by its owner)
  only when the last buffer referencing the `Mapping` goes away,
  so slices handed out before the invalidation never dangle.
*/
use std::cell::Cell;
use std::fmt;
use std::io;
use std::ptr::NonNull;
use std::rc::Rc;
use std::slice;

use log::{debug, warn};

use super::Memory;
use crate::error::{Error, Result};

/**
A mapped file region provided by the mapping collaborator.

Offsets and lengths passed to the methods are in bytes, relative to `as_ptr()`.

# Safety

Implementors guarantee that `as_ptr()` is valid for reads and writes of `len()` bytes,
and stays the same, for as long as the region is alive.
*/
pub unsafe trait MappedRegion {
	fn as_ptr(&self) -> *mut u8;
	fn len(&self) -> usize;
	/// Write modified contents of the given range back to the storage device
	fn flush(&self, offset: usize, len: usize) -> io::Result<()>;
	/// Whether the given range is likely resident in physical memory
	fn is_loaded(&self, _offset: usize, _len: usize) -> bool {
		false
	}
	/// Hint to bring the given range into physical memory
	fn load(&self, _offset: usize, _len: usize) -> io::Result<()> {
		Ok(())
	}
}

/// Mapped region shared by every buffer created over it, plus its validity flag
pub struct Mapping {
	region: Box<dyn MappedRegion>,
	valid: Cell<bool>,
}

impl Mapping {
	pub fn new<R: MappedRegion + 'static>(region: R) -> Result<Rc<Self>> {
		if region.as_ptr().is_null() {
			return Err(Error::MissingArgument("mapped region address"));
		}
		debug!("wrapping mapped region of {} bytes", region.len());
		Ok(Rc::new(Mapping {
			region: Box::new(region),
			valid: Cell::new(true),
		}))
	}

	pub fn len(&self) -> usize {
		self.region.len()
	}

	pub fn is_valid(&self) -> bool {
		self.valid.get()
	}

	/// Called when the mapping is torn down; every later access through any buffer fails
	pub fn invalidate(&self) {
		if self.valid.replace(false) {
			debug!("mapped region of {} bytes invalidated", self.region.len());
		}
	}

	pub(crate) fn check(&self) -> Result<()> {
		if self.valid.get() {
			Ok(())
		} else {
			warn!("access to invalidated mapped region");
			Err(Error::InvalidatedMapping)
		}
	}

	pub(crate) fn flush(&self, offset: usize, len: usize) -> Result<()> {
		self.check()?;
		Ok(self.region.flush(offset, len)?)
	}

	pub(crate) fn is_loaded(&self, offset: usize, len: usize) -> Result<bool> {
		self.check()?;
		Ok(self.region.is_loaded(offset, len))
	}

	pub(crate) fn load(&self, offset: usize, len: usize) -> Result<()> {
		self.check()?;
		Ok(self.region.load(offset, len)?)
	}
}

impl fmt::Debug for Mapping {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Mapping")
			.field("len", &self.region.len())
			.field("valid", &self.valid.get())
			.finish()
	}
}

pub struct MappedMemory<T> {
	ptr: NonNull<T>,
	len: usize,
	mapping: Rc<Mapping>,
}

impl MappedMemory<u8> {
	pub(crate) fn new(mapping: Rc<Mapping>) -> Result<Self> {
		let ptr = NonNull::new(mapping.region.as_ptr())
			.ok_or(Error::MissingArgument("mapped region address"))?;
		let len = mapping.len();
		Ok(MappedMemory { ptr, len, mapping })
	}
}

impl<T> MappedMemory<T> {
	pub fn mapping(&self) -> &Rc<Mapping> {
		&self.mapping
	}
}

impl<T: Copy> Memory<T> for MappedMemory<T> {
	fn len(&self) -> usize {
		self.len
	}
	fn as_slice(&self) -> Result<&[T]> {
		self.mapping.check()?;
		Ok(unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) })
	}
	fn as_mut_slice(&mut self) -> Result<&mut [T]> {
		self.mapping.check()?;
		Ok(unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) })
	}
}
