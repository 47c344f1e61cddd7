/*!
Interface to character set coders.

Coders themselves live elsewhere; this is only the shape they take when
they move data between byte buffers and buffers of UTF-16 code units.
Both sides go through the usual cursor protocol: a coder reads from the position
of its input up to the limit, writes at the position of its output,
and leaves both positions just past whatever it has consumed and produced.
*/
use crate::buffer::Buffer;
use crate::error::Result;

/// Buffer of UTF-16 code units
pub type CharBuffer = Buffer<u16>;

/// Why a coder stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoderResult {
	/// All of the input has been consumed, or what's left is an incomplete sequence
	Underflow,
	/// There's no room left in the output
	Overflow,
}

/// Bytes in, characters out
pub trait CharsetDecoder {
	fn decode(&mut self, input: &mut Buffer<u8>, output: &mut CharBuffer, end_of_input: bool) -> Result<CoderResult>;
}

/// Characters in, bytes out
pub trait CharsetEncoder {
	fn encode(&mut self, input: &mut CharBuffer, output: &mut Buffer<u8>, end_of_input: bool) -> Result<CoderResult>;
}
