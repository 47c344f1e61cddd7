use crate::error::{Error, Result};

/**
Position, limit, capacity, and mark of a buffer.

The cursor never looks at the data itself, it only keeps
`mark <= position <= limit <= capacity` true at all times.

```text
|  xxxyyy    |
   |  | |    |capacity
   |  | |limit
   |  |position
   |mark
```
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Cursor {
	capacity: usize,
	limit: usize,
	position: usize,
	mark: Option<usize>,
}

impl Cursor {
	/// Fresh cursor: position 0, limit equal to `capacity`, no mark
	pub fn new(capacity: usize) -> Self {
		Cursor {
			capacity,
			limit: capacity,
			position: 0,
			mark: None,
		}
	}

	/// Cursor over `position..limit` of a `capacity`-sized storage
	pub fn with_range(capacity: usize, position: usize, limit: usize) -> Result<Self> {
		if limit > capacity {
			return Err(Error::IndexOutOfRange { index: limit, bound: capacity });
		}
		if position > limit {
			return Err(Error::IndexOutOfRange { index: position, bound: limit });
		}
		Ok(Cursor {
			capacity, limit, position,
			mark: None,
		})
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
	pub fn limit(&self) -> usize {
		self.limit
	}
	pub fn position(&self) -> usize {
		self.position
	}
	pub fn mark_value(&self) -> Option<usize> {
		self.mark
	}

	/// Moves the limit; position is pulled back to the new limit if it was past it.
	pub fn set_limit(&mut self, limit: usize) -> Result<()> {
		if limit > self.capacity {
			return Err(Error::IndexOutOfRange { index: limit, bound: self.capacity });
		}
		self.limit = limit;
		if self.position > limit {
			self.position = limit;
		}
		if self.mark.map_or(false, |m| m > limit) {
			self.mark = None;
		}
		Ok(())
	}

	pub fn set_position(&mut self, position: usize) -> Result<()> {
		if position > self.limit {
			return Err(Error::IndexOutOfRange { index: position, bound: self.limit });
		}
		self.position = position;
		if self.mark.map_or(false, |m| m > position) {
			self.mark = None;
		}
		Ok(())
	}

	pub fn clear(&mut self) {
		self.position = 0;
		self.limit = self.capacity;
		self.mark = None;
	}

	/*
	before:
	|xxxxxx    |
	       |position
	           |limit

	after:
	|xxxxxx    |
	 |     |limit
	 |position
	*/
	pub fn flip(&mut self) {
		self.limit = self.position;
		self.position = 0;
		self.mark = None;
	}

	pub fn rewind(&mut self) {
		self.position = 0;
		self.mark = None;
	}

	pub fn mark(&mut self) {
		self.mark = Some(self.position);
	}

	pub fn discard_mark(&mut self) {
		self.mark = None;
	}

	pub fn reset(&mut self) -> Result<()> {
		match self.mark {
			Some(m) => {
				self.position = m;
				Ok(())
			},
			None => Err(Error::InvalidMark),
		}
	}

	pub fn remaining(&self) -> usize {
		self.limit - self.position
	}

	pub fn has_remaining(&self) -> bool {
		self.position < self.limit
	}

	// position of the first of `n` elements about to be read
	pub(crate) fn ensure_get(&self, n: usize) -> Result<usize> {
		if n > self.remaining() {
			return Err(Error::BufferUnderflow { requested: n, remaining: self.remaining() });
		}
		Ok(self.position)
	}

	// position of the first of `n` elements about to be written
	pub(crate) fn ensure_put(&self, n: usize) -> Result<usize> {
		if n > self.remaining() {
			return Err(Error::BufferOverflow { requested: n, remaining: self.remaining() });
		}
		Ok(self.position)
	}

	// only ever called after ensure_get()/ensure_put() succeeded for the same `n`
	pub(crate) fn advance(&mut self, n: usize) {
		debug_assert!(n <= self.remaining());
		self.position += n;
	}

	// absolute access to `n` elements starting at `index`, all of which must be below the limit
	pub(crate) fn check_index(&self, index: usize, n: usize) -> Result<usize> {
		match index.checked_add(n) {
			Some(end) if end <= self.limit => Ok(index),
			_ => Err(Error::IndexOutOfRange { index, bound: self.limit }),
		}
	}

	// compact() leaves `kept` elements in front and opens the rest for writing
	pub(crate) fn compacted(&mut self, kept: usize) {
		self.position = kept;
		self.limit = self.capacity;
		self.mark = None;
	}
}
