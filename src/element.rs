use std::fmt::Debug;
use std::mem::size_of;

use crate::order::ByteOrder;

/**
Primitive that can be stored in a [`Buffer`](struct.Buffer.html).

Besides being plain `Copy` data, every element knows how to lay itself out
as `SIZE` bytes in either byte order, which is what lets a byte buffer
be read and written as any other element type.
*/
pub trait Element: Copy + Default + PartialEq + PartialOrd + Debug + 'static {
	/// Width of the element in bytes
	const SIZE: usize;
	/// Decode from exactly `SIZE` bytes
	fn decode(bytes: &[u8], order: ByteOrder) -> Self;
	/// Encode into exactly `SIZE` bytes
	fn encode(self, bytes: &mut [u8], order: ByteOrder);
}

macro_rules! element {
	($($t:ty),*) => {$(
		impl Element for $t {
			const SIZE: usize = size_of::<$t>();

			#[inline]
			fn decode(bytes: &[u8], order: ByteOrder) -> Self {
				let mut raw = [0u8; size_of::<$t>()];
				raw.copy_from_slice(bytes);
				match order {
					ByteOrder::BigEndian => <$t>::from_be_bytes(raw),
					ByteOrder::LittleEndian => <$t>::from_le_bytes(raw),
				}
			}

			#[inline]
			fn encode(self, bytes: &mut [u8], order: ByteOrder) {
				let raw = match order {
					ByteOrder::BigEndian => self.to_be_bytes(),
					ByteOrder::LittleEndian => self.to_le_bytes(),
				};
				bytes.copy_from_slice(&raw);
			}
		}
	)*}
}

element!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

#[cfg(test)]
mod tests {
	use super::*;
	use crate::order::ByteOrder::*;

	#[test]
	fn sizes() {
		assert_eq!(<u8 as Element>::SIZE, 1);
		assert_eq!(<i16 as Element>::SIZE, 2);
		assert_eq!(<f32 as Element>::SIZE, 4);
		assert_eq!(<u64 as Element>::SIZE, 8);
	}

	#[test]
	fn big_endian_puts_msb_first() {
		let mut raw = [0u8; 4];
		0x0102_0304u32.encode(&mut raw, BigEndian);
		assert_eq!(raw, [1, 2, 3, 4]);
		assert_eq!(u32::decode(&raw, LittleEndian), 0x0403_0201);
	}

	#[test]
	fn little_endian_puts_lsb_first() {
		let mut raw = [0u8; 2];
		(-2i16).encode(&mut raw, LittleEndian);
		assert_eq!(raw, [0xfe, 0xff]);
		assert_eq!(i16::decode(&raw, LittleEndian), -2);
	}

	#[test]
	fn floats_keep_bit_pattern() {
		let mut raw = [0u8; 8];
		1.5f64.encode(&mut raw, BigEndian);
		assert_eq!(raw, 1.5f64.to_bits().to_be_bytes());
		assert_eq!(f64::decode(&raw, BigEndian), 1.5);
	}
}
