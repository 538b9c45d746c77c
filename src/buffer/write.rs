// SPDX-License-Identifier: Apache-2.0

use super::Buffer;
use crate::error::{Error, Result};
use crate::byte_str::ByteString;

macro_rules! gen_int_writes {
	($($name:ident $le_name:ident $ty:ident),+ $(,)?) => {
		$(
		pub fn $name(&mut self, value: $ty) -> Result {
			self.write_from_slice(&value.to_be_bytes())
		}

		pub fn $le_name(&mut self, value: $ty) -> Result {
			self.write_from_slice(&value.to_le_bytes())
		}
		)+
	};
}

impl Buffer {
	pub fn write_i8(&mut self, value: i8) -> Result {
		self.write_u8(value as u8)
	}

	pub fn write_u8(&mut self, value: u8) -> Result {
		let n = self.write_segments(1, |seg| {
			if seg.push(value) { Ok(1) } else { Ok(0) }
		})?;
		if n == 0 { return Err(Error::illegal_state("tail segment out of capacity")) }
		Ok(())
	}

	gen_int_writes! {
		write_i16 write_i16_le i16,
		write_u16 write_u16_le u16,
		write_i32 write_i32_le i32,
		write_u32 write_u32_le u32,
		write_i64 write_i64_le i64,
		write_u64 write_u64_le u64,
		write_isize write_isize_le isize,
		write_usize write_usize_le usize,
	}

	pub fn write_utf8(&mut self, value: &str) -> Result {
		self.write_from_slice(value.as_bytes())
	}

	pub fn write_byte_string(&mut self, value: &ByteString) -> Result {
		self.write_from_slice(value.as_slice())
	}
}
