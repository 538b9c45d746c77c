// SPDX-License-Identifier: Apache-2.0

//! A privileged, segment-granular cursor over a [`Buffer`]'s storage, for
//! zero-copy readers and writers that need direct access to each segment's
//! `(data, pos, limit)` window.

use super::Buffer;
use crate::error::{Error, Result};
use crate::segment;

/// Exposes a buffer's segments one at a time for privileged access.
///
/// Unlike the safe `Buffer` API, a cursor's caller is responsible for
/// overwriting any newly exposed capacity from [`expand_buffer`](Self::expand_buffer)
/// — no zero-fill is performed.
pub struct UnsafeCursor<'b> {
	buffer: &'b mut Buffer,
	index: usize,
	offset: usize,
	read_write: bool,
}

impl<'b> UnsafeCursor<'b> {
	pub(crate) fn new(buffer: &'b mut Buffer, read_write: bool) -> Self {
		Self { buffer, index: 0, offset: 0, read_write }
	}

	/// Advances to the next segment, returning its readable window relative
	/// offset bounds `(pos, limit)` and exposing its bytes. Returns `None`
	/// once the circular list is exhausted.
	pub fn next(&mut self) -> Option<(usize, usize)> {
		if self.index >= self.buffer.segments().len() { return None }
		let seg = &self.buffer.segments()[self.index];
		let bounds = (seg.pos(), seg.limit());
		self.offset += seg.len();
		self.index += 1;
		Some(bounds)
	}

	/// Positions the cursor at the segment containing logical `offset`,
	/// searching from whichever end is closer.
	pub fn seek(&mut self, offset: usize) -> Result<()> {
		if offset > self.buffer.count() {
			return Err(Error::index_out_of_bounds(offset, self.buffer.count()));
		}
		let from_front = offset <= self.buffer.count() - offset;
		let mut acc = 0;
		let segments = self.buffer.segments();
		if from_front {
			for (i, seg) in segments.iter().enumerate() {
				if acc + seg.len() > offset || i == segments.len() - 1 {
					self.index = i;
					self.offset = acc;
					return Ok(());
				}
				acc += seg.len();
			}
		} else {
			let mut running = self.buffer.count();
			for (i, seg) in segments.iter().enumerate().rev() {
				running -= seg.len();
				if running <= offset {
					self.index = i;
					self.offset = running;
					return Ok(());
				}
			}
		}
		self.index = 0;
		self.offset = 0;
		Ok(())
	}

	/// Borrows the bytes of the segment the cursor currently points at.
	pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
		self.buffer.segments().get(self.index).map(|seg| seg.with_data(f))
	}

	/// Grows the tail segment (or allocates a fresh one) by `byte_count`
	/// bytes of uninitialized-to-the-caller capacity. Read-write mode only.
	pub fn expand_buffer(&mut self, byte_count: usize) -> Result<usize> {
		if !self.read_write {
			return Err(Error::illegal_state("cursor is not read-write"));
		}
		let mut remaining = byte_count;
		while remaining > 0 {
			let n = self.buffer.write_segments(remaining, |seg| {
				let room = seg.writable();
				if room == 0 { return Ok(0) }
				let grow = room.min(remaining);
				seg.grow(grow);
				Ok(grow)
			})?;
			if n == 0 { break }
			remaining -= n;
		}
		Ok(byte_count - remaining)
	}

	/// Shrinks the buffer by `byte_count` bytes from the tail, recycling any
	/// segment emptied in the process. Read-write mode only.
	pub fn resize_buffer(&mut self, byte_count: usize) -> Result<usize> {
		if !self.read_write {
			return Err(Error::illegal_state("cursor is not read-write"));
		}
		let mut remaining = byte_count.min(self.buffer.count());
		let shrunk = remaining;
		while remaining > 0 {
			let Some(seg) = self.buffer.segments_mut().back_mut() else { break };
			let n = remaining.min(seg.len());
			seg.shrink_tail(n);
			self.buffer.dec_size(n);
			remaining -= n;
			if seg.is_empty() {
				let seg = self.buffer.segments_mut().pop_back().unwrap();
				segment::recycle(seg);
			}
		}
		Ok(shrunk)
	}
}

impl Buffer {
	/// Opens a read-only unsafe cursor over this buffer's segments.
	pub fn read_cursor(&mut self) -> UnsafeCursor<'_> { UnsafeCursor::new(self, false) }

	/// Opens a read-write unsafe cursor, permitting [`UnsafeCursor::expand_buffer`]
	/// and [`UnsafeCursor::resize_buffer`].
	pub fn read_write_cursor(&mut self) -> UnsafeCursor<'_> { UnsafeCursor::new(self, true) }
}
