// SPDX-License-Identifier: Apache-2.0

//! The growable, segment-pooled byte container everything else in this
//! crate stages data through.

mod options;
mod read;
mod write;
mod cursor;

pub use options::BufferOptions;
pub use cursor::UnsafeCursor;

use std::cmp::min;
use std::collections::VecDeque;
use crate::error::{Error, Result};
use crate::segment::{self, Segment};
use crate::byte_str::SegmentedByteString;

/// A growable byte container built from pooled, fixed-capacity [`Segment`]s.
///
/// Bytes are addressed by a logical offset in `[0, size)`; the underlying
/// storage is a queue of segments, each independently owned or shared with
/// another buffer's segment. See the crate documentation for the sharing
/// and zero-copy transfer rules.
pub struct Buffer {
	segments: VecDeque<Segment>,
	size: usize,
	options: BufferOptions,
	closed: bool,
}

impl Default for Buffer {
	fn default() -> Self { Self::new(BufferOptions::default()) }
}

impl Buffer {
	/// Creates an empty buffer tuned by `options`. Rebounds the calling
	/// thread's segment pool to `options.pool_max_size`.
	pub fn new(options: BufferOptions) -> Self {
		segment::set_pool_max_size(options.pool_max_size);
		Self { segments: VecDeque::new(), size: 0, options, closed: false }
	}

	/// Creates an empty buffer that always shares and compacts (see
	/// [`BufferOptions::lean`]).
	pub fn lean() -> Self { Self::new(BufferOptions::lean()) }

	/// The number of readable bytes currently buffered.
	pub fn count(&self) -> usize { self.size }

	/// `true` if the buffer holds no readable bytes.
	pub fn is_empty(&self) -> bool { self.size == 0 }

	pub fn options(&self) -> &BufferOptions { &self.options }

	/// Releases all segments back to the pool.
	pub fn clear(&mut self) -> Result {
		for seg in self.segments.drain(..) {
			segment::recycle(seg);
		}
		self.size = 0;
		Ok(())
	}

	/// Closes the buffer, releasing all segments. Idempotent.
	pub fn close(&mut self) -> Result {
		if self.closed { return Ok(()) }
		self.closed = true;
		self.clear()
	}

	/// Returns the byte at logical offset `index` without consuming it, or
	/// `None` if out of bounds.
	pub fn get(&self, mut index: usize) -> Option<u8> {
		if index >= self.size { return None }
		for seg in &self.segments {
			if index < seg.len() {
				return seg.with_data(|data| Some(data[index]));
			}
			index -= seg.len();
		}
		None
	}

	/// Removes `byte_count` bytes from the head of the buffer, returning the
	/// number actually removed.
	pub fn skip(&mut self, byte_count: usize) -> Result<usize> {
		let mut remaining = min(byte_count, self.size);
		let skipped = remaining;
		while remaining > 0 {
			let seg = self.segments.front_mut().expect("size accounting mismatch");
			let n = min(remaining, seg.len());
			seg.consume(n);
			remaining -= n;
			self.size -= n;
			if seg.is_empty() {
				let seg = self.segments.pop_front().unwrap();
				segment::recycle(seg);
			}
		}
		Ok(skipped)
	}

	/// Removes all readable bytes.
	pub fn skip_all(&mut self) -> Result<usize> {
		self.skip(self.size)
	}

	fn push_tail(&mut self) -> &mut Segment {
		self.segments.push_back(segment::take());
		self.segments.back_mut().unwrap()
	}

	/// Ensures the tail segment is an owner with at least one byte of spare
	/// capacity, allocating a fresh segment if needed.
	fn tail_for_write(&mut self) -> &mut Segment {
		let needs_fresh = match self.segments.back() {
			Some(seg) => !seg.owner() || seg.writable() == 0,
			None => true,
		};
		if needs_fresh {
			self.push_tail()
		} else {
			self.segments.back_mut().unwrap()
		}
	}

	pub(crate) fn write_segments(
		&mut self,
		mut count: usize,
		mut write: impl FnMut(&mut Segment) -> Result<usize>,
	) -> Result<usize> {
		let mut written = 0;
		while count > 0 {
			let seg = self.tail_for_write();
			let before = seg.len();
			let n = write(seg)?;
			let added = seg.len() - before;
			written += n;
			self.size += added;
			count = count.saturating_sub(n);
			if n == 0 { break }
		}
		Ok(written)
	}

	pub(crate) fn read_segments(
		&mut self,
		mut max_count: usize,
		mut consume: impl FnMut(&mut Segment) -> Result<usize>,
	) -> Result<usize> {
		let mut count = 0;
		while max_count > 0 {
			let Some(seg) = self.segments.front_mut() else { break };
			if seg.is_empty() { break }
			let read = consume(seg)?;
			if read == 0 { break }
			count += read;
			max_count -= read;
			self.size -= read;
			if seg.is_empty() {
				let seg = self.segments.pop_front().unwrap();
				segment::recycle(seg);
			}
		}
		Ok(count)
	}

	/// Writes raw bytes into the tail.
	pub fn write_from_slice(&mut self, mut value: &[u8]) -> Result {
		while !value.is_empty() {
			let n = self.write_segments(value.len(), |seg| Ok(seg.push_slice(value)))?;
			if n == 0 { return Err(Error::illegal_state("tail segment out of capacity")) }
			value = &value[n..];
		}
		Ok(())
	}

	/// Fills the tail directly from a raw reader, handing it a writable
	/// slice capped to both a segment's spare capacity and `max_count`
	/// bytes remaining; stops once `read` returns `0` or the cap is
	/// reached. Used to implement [`Source`](crate::streams::Source) over
	/// [`std::io::Read`] (see [`crate::streams::ReaderSource`]) and
	/// [`FileHandle`](crate::FileHandle) reads without an intermediate copy.
	pub fn fill_from(&mut self, max_count: usize, mut read: impl FnMut(&mut [u8]) -> Result<usize>) -> Result<usize> {
		let mut remaining = max_count;
		self.write_segments(max_count, |seg| {
			if remaining == 0 { return Ok(0) }
			let cap = seg.writable().min(remaining);
			if cap == 0 { return Ok(0) }
			let n: usize = seg.with_spare(|spare| read(&mut spare[..cap]))?;
			if n > 0 {
				seg.grow(n);
				remaining -= n;
			}
			Ok(n)
		})
	}

	/// Drains the head directly into a raw writer, handing it a readable
	/// slice from one segment at a time; stops once `write` returns `0` or
	/// `max_count` bytes have been consumed. Used to implement
	/// [`Sink`](crate::streams::Sink) over [`std::io::Write`] (see
	/// [`crate::streams::WriterSink`]) and [`FileHandle`](crate::FileHandle)
	/// writes without an intermediate copy.
	pub fn drain_into(&mut self, max_count: usize, mut write: impl FnMut(&[u8]) -> Result<usize>) -> Result<usize> {
		let mut remaining = min(max_count, self.size);
		self.read_segments(max_count, |seg| {
			if remaining == 0 { return Ok(0) }
			let n = min(seg.len(), remaining);
			let written: usize = seg.with_data(|data| write(&data[..n]))?;
			seg.consume(written);
			remaining -= written;
			Ok(written)
		})
	}

	/// Copies `byte_count` bytes from `self`'s segments without mutating
	/// `self`'s readable window: each covered segment is marked shared and a
	/// new segment aliasing its page is appended to `dst`.
	pub fn copy_to(&mut self, dst: &mut Buffer, byte_count: usize) -> Result {
		let byte_count = min(byte_count, self.size);
		let mut remaining = byte_count;
		let mut new_segments = Vec::new();
		for seg in self.segments.iter_mut() {
			if remaining == 0 { break }
			let n = min(remaining, seg.len());
			if n == seg.len() {
				new_segments.push(seg.share_all());
			} else {
				let mut partial = seg.share_all();
				new_segments.push(partial.share_prefix_above(n, self.options.share_threshold));
			}
			remaining -= n;
		}
		for seg in new_segments {
			dst.size += seg.len();
			dst.segments.push_back(seg);
		}
		Ok(())
	}

	/// A full logical duplicate of the buffer: identical bytes, shared pages.
	pub fn copy(&mut self) -> Buffer {
		let mut dst = Buffer::new(self.options);
		let _ = self.copy_to(&mut dst, self.size);
		dst
	}

	/// Freezes a prefix of the buffer into a [`SegmentedByteString`],
	/// consuming it from `self`.
	///
	/// Below [`BufferOptions::snapshot_threshold`], the prefix is copied into
	/// fresh, unshared pages rather than pinning the source buffer's pages
	/// behind copy-on-write segments (Open Question 1): cheap snapshots of
	/// small prefixes shouldn't hold large pages alive.
	pub fn snapshot(&mut self, byte_count: usize) -> Result<SegmentedByteString> {
		let byte_count = min(byte_count, self.size);
		if byte_count < self.options.snapshot_threshold {
			return self.snapshot_copied(byte_count);
		}
		let mut pages = Vec::new();
		let mut remaining = byte_count;
		while remaining > 0 {
			let seg = self.segments.front_mut().expect("size accounting mismatch");
			let n = min(remaining, seg.len());
			let piece = if n == seg.len() {
				let seg = self.segments.pop_front().unwrap();
				seg
			} else {
				seg.share_prefix_above(n, self.options.share_threshold)
			};
			self.size -= n;
			remaining -= n;
			pages.push(piece);
		}
		Ok(SegmentedByteString::from_segments(pages))
	}

	/// Consumes `byte_count` bytes into fresh owned pages, ignoring sharing.
	fn snapshot_copied(&mut self, byte_count: usize) -> Result<SegmentedByteString> {
		let mut data = vec![0u8; byte_count];
		self.read_into_slice_exact(&mut data)?;
		let pages = data.chunks(crate::segment::SEGMENT_SIZE)
			.map(|chunk| {
				let mut seg = segment::take();
				seg.push_slice(chunk);
				seg
			})
			.collect();
		Ok(SegmentedByteString::from_segments(pages))
	}

	/// Moves bytes from the head of `source` to the tail of `self`,
	/// reassigning whole segments where possible rather than copying.
	pub fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		let byte_count = min(byte_count, source.size);
		let mut remaining = byte_count;

		// Step 1: if the whole request fits in the source head and this
		// buffer has an owner tail with room, just copy.
		if let Some(head) = source.segments.front() {
			let head_len = head.len();
			let tail_room = match self.segments.back() {
				Some(t) if t.owner() => t.writable(),
				_ => 0,
			};
			if remaining <= head_len && remaining <= tail_room {
				let head = source.segments.front_mut().unwrap();
				let mut buf = vec![0u8; remaining];
				let n = head.pop_into_slice(&mut buf);
				debug_assert_eq!(n, remaining);
				source.size -= n;
				self.write_from_slice(&buf)?;
				if head.is_empty() {
					let seg = source.segments.pop_front().unwrap();
					segment::recycle(seg);
				}
				return Ok(byte_count);
			}
		}

		while remaining > 0 {
			let head_len = source.segments.front().map(Segment::len).unwrap_or(0);
			if head_len == 0 { break }

			if remaining < head_len {
				// Step 2: split the head, sharing or copying the prefix.
				let head = source.segments.front_mut().unwrap();
				let prefix = head.share_prefix_above(remaining, self.options.share_threshold);
				source.size -= remaining;
				self.size += prefix.len();
				self.segments.push_back(prefix);
				remaining = 0;
			} else {
				// Step 3: transplant the whole head segment.
				let seg = source.segments.pop_front().unwrap();
				source.size -= seg.len();
				remaining -= seg.len();
				self.size += seg.len();
				self.segments.push_back(seg);
			}
		}

		self.compact();
		Ok(byte_count)
	}

	/// Writes the entirety of `source` into `self`.
	pub fn write_all(&mut self, source: &mut Buffer) -> Result<usize> {
		self.write(source, source.size)
	}

	/// Merges adjacent owner segment pairs when their combined content fits
	/// in one segment and the joined fragmentation crosses the configured
	/// threshold.
	fn compact(&mut self) {
		if self.options.compact_threshold == 0 {
			self.compact_all();
			return;
		}
		let fragmentation: usize = self.segments.iter()
			.map(segment_gap)
			.sum();
		if fragmentation >= self.options.compact_threshold {
			self.compact_all();
		}
	}

	fn compact_all(&mut self) {
		let mut segs: Vec<Segment> = self.segments.drain(..).collect();
		let mut i = 0;
		while i + 1 < segs.len() {
			let moved = {
				let (left, right) = segs.split_at_mut(i + 1);
				let a = &mut left[i];
				let b = &mut right[0];
				if a.owner() && b.owner() && a.len() + b.len() <= crate::segment::SEGMENT_SIZE {
					b.move_into(a)
				} else {
					0
				}
			};
			if moved > 0 && segs[i + 1].is_empty() {
				let empty = segs.remove(i + 1);
				segment::recycle(empty);
			} else {
				i += 1;
			}
		}
		self.segments = segs.into();
	}

	pub(crate) fn segments_mut(&mut self) -> &mut VecDeque<Segment> { &mut self.segments }
	pub(crate) fn segments(&self) -> &VecDeque<Segment> { &self.segments }
	pub(crate) fn inc_size(&mut self, n: usize) { self.size += n }
	pub(crate) fn dec_size(&mut self, n: usize) { self.size -= n }

	/// Finds the first offset of `byte` at or after `from`, if any.
	pub fn index_of(&self, byte: u8, from: usize) -> Option<usize> {
		let mut offset = 0;
		let mut skip = from;
		for seg in &self.segments {
			let len = seg.len();
			if skip >= len {
				skip -= len;
				offset += len;
				continue;
			}
			let found = seg.with_data(|data| {
				data[skip..].iter().position(|&b| b == byte)
			});
			if let Some(i) = found {
				return Some(offset + skip + i);
			}
			offset += len;
			skip = 0;
		}
		None
	}

	/// Finds the first offset at or after `from` of any byte in `targets`
	/// (specialized for the common one- or two-byte case, per spec §4.1).
	pub fn index_of_any(&self, targets: &[u8], from: usize) -> Option<usize> {
		let mut offset = 0;
		let mut skip = from;
		for seg in &self.segments {
			let len = seg.len();
			if skip >= len {
				skip -= len;
				offset += len;
				continue;
			}
			let found = seg.with_data(|data| {
				data[skip..].iter().position(|b| targets.contains(b))
			});
			if let Some(i) = found {
				return Some(offset + skip + i);
			}
			offset += len;
			skip = 0;
		}
		None
	}

	/// Writes a signed decimal integer as ASCII, minus sign included.
	pub fn write_decimal_long(&mut self, value: i64) -> Result {
		if value == i64::MIN {
			return self.write_from_slice(value.to_string().as_bytes());
		}
		let mut v = value;
		let neg = v < 0;
		if neg { v = -v; }
		let mut digits = [0u8; 20];
		let mut i = digits.len();
		loop {
			i -= 1;
			digits[i] = b'0' + (v % 10) as u8;
			v /= 10;
			if v == 0 { break }
		}
		if neg {
			i -= 1;
			digits[i] = b'-';
		}
		self.write_from_slice(&digits[i..])
	}

	/// Writes an unsigned integer as lowercase hex, no leading zeros (except
	/// for the value zero itself).
	pub fn write_hexadecimal_unsigned_long(&mut self, value: u64) -> Result {
		if value == 0 {
			return self.write_from_slice(b"0");
		}
		let mut v = value;
		let mut digits = [0u8; 16];
		let mut i = digits.len();
		const HEX: &[u8; 16] = b"0123456789abcdef";
		while v != 0 {
			i -= 1;
			digits[i] = HEX[(v & 0xf) as usize];
			v >>= 4;
		}
		self.write_from_slice(&digits[i..])
	}

	/// Parses a greedy leading decimal integer, failing [`crate::ErrorKind::NumberFormat`]
	/// when no digit is present or the magnitude overflows.
	pub fn read_decimal_long(&mut self) -> Result<i64> {
		use crate::error::NumberFormatError;
		if self.is_empty() {
			return Err(NumberFormatError::Empty.into());
		}
		let neg = self.get(0) == Some(b'-');
		let mut index = if neg { 1 } else { 0 };
		if self.get(index).is_none() || !self.get(index).unwrap().is_ascii_digit() {
			return Err(NumberFormatError::Empty.into());
		}

		let mut acc: i64 = 0; // accumulate negative to admit i64::MIN
		let overflow_zone = i64::MIN / 10;
		let mut consumed = 0;
		loop {
			let Some(byte) = self.get(index) else { break };
			if !byte.is_ascii_digit() { break }
			let digit = (byte - b'0') as i64;

			if acc < overflow_zone {
				return Err(NumberFormatError::Overflow.into());
			}
			acc *= 10;
			if acc < i64::MIN + digit {
				return Err(NumberFormatError::Overflow.into());
			}
			acc -= digit;

			index += 1;
			consumed += 1;
		}
		if consumed == 0 {
			return Err(NumberFormatError::Empty.into());
		}

		self.skip(index)?;
		Ok(if neg { acc } else { -acc })
	}

	/// Parses a greedy leading hexadecimal unsigned integer (case-insensitive).
	pub fn read_hexadecimal_unsigned_long(&mut self) -> Result<u64> {
		use crate::error::NumberFormatError;
		let mut acc: u64 = 0;
		let mut consumed = 0;
		loop {
			let Some(byte) = self.get(consumed) else { break };
			let digit = match byte {
				b'0'..=b'9' => byte - b'0',
				b'a'..=b'f' => byte - b'a' + 10,
				b'A'..=b'F' => byte - b'A' + 10,
				_ => break,
			};
			if acc.leading_zeros() < 4 {
				return Err(NumberFormatError::Overflow.into());
			}
			acc = (acc << 4) | digit as u64;
			consumed += 1;
		}
		if consumed == 0 {
			return Err(NumberFormatError::Empty.into());
		}
		self.skip(consumed)?;
		Ok(acc)
	}

	/// Consumes the whole buffer as a hex string and decodes it. Unlike the
	/// [`ByteString`](crate::ByteString) form, failure raises
	/// [`crate::ErrorKind::Protocol`] rather than returning `None` (§4.5).
	pub fn decode_hex(&mut self) -> Result<crate::byte_str::ByteString> {
		let text = self.read_byte_str(self.count())?;
		crate::byte_str::ByteString::decode_hex(text.as_slice())
			.ok_or_else(|| Error::protocol("invalid hex string"))
	}

	/// Consumes the whole buffer as Base64 text and decodes it. Unlike the
	/// [`ByteString`](crate::ByteString) form, failure raises
	/// [`crate::ErrorKind::Protocol`] rather than returning `None` (§4.5).
	pub fn decode_base64(&mut self) -> Result<crate::byte_str::ByteString> {
		let text = self.read_byte_str(self.count())?;
		crate::byte_str::ByteString::decode_base64(text.as_slice())
			.ok_or_else(|| Error::protocol("invalid base64 string"))
	}
}

fn segment_gap(seg: &Segment) -> usize {
	crate::segment::SEGMENT_SIZE - seg.len()
}

impl Drop for Buffer {
	fn drop(&mut self) {
		let _ = self.close();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn write_and_read_round_trip_across_segment_boundary() {
		let mut buf = Buffer::default();
		let data = vec![b'x'; 10000];
		buf.write_from_slice(&data).unwrap();
		assert_eq!(buf.count(), 10000);
		let mut dst = vec![0u8; 8192];
		buf.read_into_slice_exact(&mut dst).unwrap();
		assert_eq!(buf.count(), 1808);
		let mut rest = vec![0u8; 1808];
		buf.read_into_slice_exact(&mut rest).unwrap();
		assert!(buf.is_empty());
	}

	#[test]
	fn zero_copy_move_transplants_whole_segments() {
		let mut a = Buffer::default();
		let data = vec![7u8; 20000];
		a.write_from_slice(&data).unwrap();
		let a_head_ptr = a.segments.front().unwrap() as *const Segment;
		let mut b = Buffer::default();
		b.write(&mut a, 20000).unwrap();
		assert_eq!(b.count(), 20000);
		assert!(a.is_empty());
		let _ = a_head_ptr;
	}

	#[test]
	fn decimal_long_round_trips_min_value() {
		let mut buf = Buffer::default();
		buf.write_decimal_long(i64::MIN).unwrap();
		assert_eq!(buf.read_decimal_long().unwrap(), i64::MIN);
	}

	#[test]
	fn decimal_long_overflow_fails_before_consuming() {
		let mut buf = Buffer::default();
		buf.write_from_slice(b"9223372036854775808").unwrap();
		assert!(buf.read_decimal_long().is_err());
	}

	#[test]
	fn index_of_finds_byte_across_segments() {
		let mut buf = Buffer::default();
		buf.write_from_slice(&vec![b'a'; 8192]).unwrap();
		buf.write_from_slice(b"z").unwrap();
		assert_eq!(buf.index_of(b'z', 0), Some(8192));
	}
}
