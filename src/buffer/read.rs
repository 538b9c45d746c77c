// SPDX-License-Identifier: Apache-2.0

use std::cmp::min;
use super::Buffer;
use crate::error::{Error, Result};
use crate::byte_str::ByteString;
use crate::codec::utf8::{decode_lossy, decode_code_point};

macro_rules! gen_int_reads {
	($($s_name:ident $s_le_name:ident $s_ty:ident $u_name:ident $u_le_name:ident $u_ty:ident),+ $(,)?) => {
		$(
		pub fn $s_name(&mut self) -> Result<$s_ty> {
			self.$u_name().map(|n| n as $s_ty)
		}

		pub fn $s_le_name(&mut self) -> Result<$s_ty> {
			self.$u_le_name().map(|n| n as $s_ty)
		}

		pub fn $u_name(&mut self) -> Result<$u_ty> {
			Ok($u_ty::from_be_bytes(self.read_array()?))
		}

		pub fn $u_le_name(&mut self) -> Result<$u_ty> {
			Ok($u_ty::from_le_bytes(self.read_array()?))
		}
		)+
	};
}

impl Buffer {
	/// Reads one byte, failing [`ErrorKind::Eof`] if the buffer is empty.
	pub fn read_u8(&mut self) -> Result<u8> {
		if self.is_empty() {
			return Err(Error::eof());
		}
		let mut byte = 0u8;
		self.read_segments(1, |seg| {
			byte = seg.pop().expect("non-empty segment");
			Ok(1)
		})?;
		Ok(byte)
	}

	pub fn read_i8(&mut self) -> Result<i8> {
		self.read_u8().map(|n| n as i8)
	}

	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut array = [0u8; N];
		self.read_into_slice_exact(&mut array)?;
		Ok(array)
	}

	gen_int_reads! {
		read_i16 read_i16_le i16 read_u16 read_u16_le u16,
		read_i32 read_i32_le i32 read_u32 read_u32_le u32,
		read_i64 read_i64_le i64 read_u64 read_u64_le u64,
		read_isize read_isize_le isize read_usize read_usize_le usize,
	}

	/// Reads up to `dst.len()` bytes into `dst`, returning the number read.
	pub fn read_into_slice(&mut self, dst: &mut [u8]) -> Result<usize> {
		let n = min(dst.len(), self.count());
		self.read_into_slice_exact(&mut dst[..n])?;
		Ok(n)
	}

	/// Reads exactly `dst.len()` bytes, failing [`ErrorKind::Eof`] without
	/// consuming anything if that many aren't available.
	pub fn read_into_slice_exact(&mut self, dst: &mut [u8]) -> Result {
		if dst.len() > self.count() {
			return Err(Error::eof());
		}
		let mut off = 0;
		self.read_segments(dst.len(), |seg| {
			let len = min(dst.len() - off, seg.len());
			seg.with_data(|data| dst[off..off + len].copy_from_slice(&data[..len]));
			seg.consume(len);
			off += len;
			Ok(len)
		})?;
		debug_assert_eq!(off, dst.len());
		Ok(())
	}

	/// Reads up to `byte_count` bytes into a new [`ByteString`].
	pub fn read_byte_str(&mut self, byte_count: usize) -> Result<ByteString> {
		let len = min(byte_count, self.count());
		let mut dst = Vec::with_capacity(len);
		self.read_segments(len, |seg| {
			let n = min(len - dst.len(), seg.len());
			seg.with_data(|data| dst.extend_from_slice(&data[..n]));
			seg.consume(n);
			Ok(n)
		})?;
		Ok(ByteString::from(dst))
	}

	/// Reads at most `byte_count` bytes, decoding them as UTF-8 into `str`
	/// with replacement (§4.4): malformed sequences become U+FFFD rather
	/// than failing the read. Returns the number of bytes consumed.
	///
	/// The requested bytes are gathered into a contiguous buffer before
	/// decoding; decoding each segment independently would spuriously
	/// misplace a replacement whenever a multi-byte code point straddles a
	/// segment boundary.
	pub fn read_utf8(&mut self, str: &mut String, byte_count: usize) -> Result<usize> {
		let len = min(byte_count, self.count());
		let mut bytes = Vec::with_capacity(len);
		self.read_segments(len, |seg| {
			let n = min(len - bytes.len(), seg.len());
			seg.with_data(|data| bytes.extend_from_slice(&data[..n]));
			seg.consume(n);
			Ok(n)
		})?;
		str.push_str(&decode_lossy(&bytes));
		Ok(len)
	}

	/// Reads a single UTF-8 code point, replacing a malformed sequence with
	/// U+FFFD (§4.4). Fails with [`ErrorKind::Eof`](crate::ErrorKind::Eof) if
	/// fewer bytes than the leading byte calls for are buffered — but still
	/// consumes that leading byte before returning the error, per spec.
	pub fn read_utf8_code_point(&mut self) -> Result<char> {
		if self.is_empty() {
			return Err(Error::eof());
		}
		let avail = min(4, self.count());
		let mut bytes = [0u8; 4];
		for i in 0..avail {
			bytes[i] = self.get(i).expect("index within count");
		}
		match decode_code_point(&bytes[..avail]) {
			Ok((c, n)) => {
				self.skip(n)?;
				Ok(c)
			}
			Err(e) => {
				self.skip(1)?;
				Err(e)
			}
		}
	}

	/// Reads all remaining bytes as UTF-8 into `str`.
	pub fn read_all_utf8(&mut self, str: &mut String) -> Result {
		while self.read_utf8(str, usize::MAX)? > 0 { }
		Ok(())
	}

	/// Reads a UTF-8 line up to (and consuming) the next `\n` or `\r\n`, or
	/// to the end of the buffer if no terminator is found. Returns whether a
	/// terminator was found.
	pub fn read_utf8_line(&mut self, str: &mut String) -> Result<bool> {
		if let Some(mut line_end) = self.index_of(b'\n', 0) {
			let mut skip = 1;
			if line_end > 0 && self.get(line_end - 1) == Some(b'\r') {
				line_end -= 1;
				skip += 1;
			}
			self.read_utf8(str, line_end)?;
			self.skip(skip)?;
			Ok(true)
		} else {
			self.read_all_utf8(str)?;
			Ok(false)
		}
	}

	/// As [`read_utf8_line`](Self::read_utf8_line), but fails
	/// [`ErrorKind::Eof`] without consuming anything if no line terminator
	/// is present.
	pub fn read_utf8_line_strict(&mut self, str: &mut String) -> Result<()> {
		if self.index_of(b'\n', 0).is_none() {
			return Err(Error::eof());
		}
		let found = self.read_utf8_line(str)?;
		debug_assert!(found);
		Ok(())
	}
}
