use super::Memory;
use crate::error::Result;

impl<T> Memory<T> for Vec<T> {
	fn len(&self) -> usize {
		Vec::len(self)
	}
	fn as_slice(&self) -> Result<&[T]> {
		Ok(&self[..])
	}
	fn as_mut_slice(&mut self) -> Result<&mut [T]> {
		Ok(&mut self[..])
	}
}
