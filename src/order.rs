use std::fmt;

/// Order in which the bytes of a multi-byte value are laid out in memory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
	/// Most significant byte first
	BigEndian,
	/// Least significant byte first
	LittleEndian,
}

impl ByteOrder {
	/// Byte order of the platform we're running on
	pub fn native() -> Self {
		if cfg!(target_endian = "big") {
			ByteOrder::BigEndian
		} else {
			ByteOrder::LittleEndian
		}
	}
}

// every buffer starts out big-endian, regardless of the platform
impl Default for ByteOrder {
	fn default() -> Self {
		ByteOrder::BigEndian
	}
}

impl fmt::Display for ByteOrder {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ByteOrder::BigEndian => f.write_str("BIG_ENDIAN"),
			ByteOrder::LittleEndian => f.write_str("LITTLE_ENDIAN"),
		}
	}
}
