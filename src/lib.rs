/*!
Fixed-capacity buffers of primitive values with a position/limit/mark cursor.

A buffer is written into with `put()`s, [`flip()`](struct.Buffer.html#method.flip)ped,
and read back with `get()`s; [`compact()`](struct.Buffer.html#method.compact) keeps unread data around
before the next round of writes.
Byte buffers can also be read and written as wider numbers in either [`ByteOrder`](enum.ByteOrder.html),
or viewed as buffers of those numbers altogether.

Storage can be the heap, native memory outside of the allocator,
or a mapped file region; views (`slice()`, `duplicate()`, `as_read_only()`)
share storage instead of copying it.

## Example usage

```
use cursor_buffers::{Buffer, ByteOrder, Error};

# fn main() -> Result<(), Error> {
let mut buf = Buffer::<u8>::allocate(16);
buf.put_u32(0x0102_0304)?;
buf.put_u16(0xffee)?;
buf.flip();

// read the first word back with the other byte order
buf.set_order(ByteOrder::LittleEndian);
assert_eq!(buf.get_u32()?, 0x0403_0201);

// what's left, as a buffer of u16s
let mut shorts = buf.as_view::<u16>()?;
assert_eq!(shorts.get()?, 0xeeff);
# Ok(())
# }
```
*/

mod error;
pub use error::*;

mod cursor;
pub use cursor::*;

mod order;
pub use order::*;

mod element;
pub use element::*;

pub mod storage;
pub use storage::{MappedRegion, Mapping, RawRegion, StorageKind};

mod buffer;
pub use buffer::*;

mod builder;
pub use builder::*;

pub mod charset;
