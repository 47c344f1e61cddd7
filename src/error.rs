use std::cell::{BorrowError, BorrowMutError};
use std::io;

use quick_error::quick_error;
use slice_deque::AllocError;

quick_error! {
	/// Everything that can go wrong while moving data in or out of a buffer.
	///
	/// Errors are always raised before any cursor or content mutation takes place.
	#[derive(Debug)]
	pub enum Error {
		/// Absolute index, position or limit outside of the permitted range
		IndexOutOfRange { index: usize, bound: usize } {
			display("index {} is out of range (bound {})", index, bound)
		}
		/// Relative read past the limit
		BufferUnderflow { requested: usize, remaining: usize } {
			display("buffer underflow: {} elements requested, {} remaining", requested, remaining)
		}
		/// Relative write past the limit
		BufferOverflow { requested: usize, remaining: usize } {
			display("buffer overflow: {} elements requested, {} remaining", requested, remaining)
		}
		ReadOnly {
			display("buffer is read-only")
		}
		InvalidMark {
			display("mark is not set")
		}
		InvalidatedMapping {
			display("backing mapping has been invalidated")
		}
		/// Typed view request that does not fit into the remaining bytes
		AlignmentOrBounds { requested: usize, available: usize } {
			display("view of {} bytes requested, {} available", requested, available)
		}
		MissingArgument(what: &'static str) {
			display("missing argument: {}", what)
		}
		UnsupportedOperation(what: &'static str) {
			display("unsupported operation: {}", what)
		}
		/// Storage is already borrowed by another view of the same storage
		BorrowConflict {
			display("storage is already borrowed")
			from(BorrowError)
			from(BorrowMutError)
		}
		/// Requested capacity can't even be expressed as an allocation size
		CapacityOverflow { requested: usize } {
			display("capacity of {} elements is too large to allocate", requested)
		}
		Alloc(err: AllocError) {
			display("native allocation failed: {:?}", err)
			from()
		}
		Io(err: io::Error) {
			display("mapping I/O error: {}", err)
			cause(err)
			from()
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
