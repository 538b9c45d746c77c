// SPDX-License-Identifier: Apache-2.0

//! Raw and buffered [`Source`]/[`Sink`] streams (§4.1, §4.3): the thin
//! unbuffered traits a transport implements, and the buffered wrappers most
//! callers actually use.

use std::cmp::min;
use std::mem;
use crate::{Buffer, ByteString, Error, SEGMENT_SIZE};
pub use crate::error::{ErrorKind, Result};
use crate::pattern::{Options, Selection, TypedOptions};

mod seeking;
pub use seeking::*;

/// A raw, unbuffered data source.
pub trait Source {
	/// Reads up to `count` bytes from this source into `sink`, returning the
	/// number of bytes actually read. Zero means end of stream.
	fn read(&mut self, sink: &mut Buffer, count: usize) -> Result<usize>;

	/// Reads until end of stream, returning the total bytes read.
	fn read_all(&mut self, sink: &mut Buffer) -> Result<usize> {
		let mut total = 0;
		loop {
			let read = self.read(sink, usize::MAX)?;
			if read == 0 { return Ok(total) }
			total += read;
		}
	}

	/// Closes the source. Idempotent; streams also close on drop.
	fn close_source(&mut self) -> Result { Ok(()) }
}

/// Wraps any [`Source`] in a [`BufferedSource`].
pub trait SourceBuffer: Source + Sized {
	fn buffer(self) -> BufferedSource<Self> { buffer_source(self) }
}

impl<S: Source> SourceBuffer for S { }

/// A raw, unbuffered data sink.
pub trait Sink {
	/// Writes up to `count` bytes from `source` into this sink, returning
	/// the number of bytes actually written.
	fn write(&mut self, source: &mut Buffer, count: usize) -> Result<usize>;

	/// Writes all of `source`'s buffered bytes.
	fn write_all(&mut self, source: &mut Buffer) -> Result<usize> {
		self.write(source, source.count())
	}

	/// Pushes any data this sink is holding on to its final destination.
	fn flush(&mut self) -> Result { Ok(()) }

	/// Flushes, then closes the sink. Idempotent; streams also close on drop.
	fn close_sink(&mut self) -> Result { self.flush() }
}

/// Wraps any [`Sink`] in a [`BufferedSink`].
pub trait SinkBuffer: Sink + Sized {
	fn buffer(self) -> BufferedSink<Self> { buffer_sink(self) }
}

impl<S: Sink> SinkBuffer for S { }

/// Shared access to the buffer a [`BufSource`]/[`BufSink`] reads into or
/// writes from.
pub trait BufStream {
	fn buf(&self) -> &Buffer;
	fn buf_mut(&mut self) -> &mut Buffer;
}

fn calc_read_count(byte_count: usize, buf: &Buffer) -> usize {
	min(byte_count, SEGMENT_SIZE.saturating_sub(buf.count()))
}

macro_rules! gen_int_reads {
	($($be_name:ident$($le_name:ident)?->$ty:ident,)+) => {
		$(gen_int_reads! { $be_name$($le_name)?->$ty })+
	};
	($be_name:ident$le_name:ident->$ty:ident) => {
		gen_int_reads! { $be_name->$ty "big-endian " }
		gen_int_reads! { $le_name->$ty "little-endian " }
	};
	($name:ident->$ty:ident$($endian:literal)?) => {
		#[doc = concat!(" Reads one ",$($endian,)?"[`",stringify!($ty),"`].")]
		fn $name(&mut self) -> Result<$ty> {
			self.require(mem::size_of::<$ty>())?;
			self.buf_mut().$name()
		}
	}
}

/// A buffered data source (§4.3): a [`Source`] fronted by a [`Buffer`] that
/// lets callers look ahead before committing to consume bytes.
pub trait BufSource: BufStream + Source {
	/// Attempts to buffer at least `byte_count` bytes, returning whether
	/// that many are now available. Never reports end of stream as an
	/// error — see [`require`](Self::require) for that.
	fn request(&mut self, byte_count: usize) -> Result<bool>;

	/// Buffers at least `byte_count` bytes, failing with
	/// [`ErrorKind::Eof`] if the source runs out first.
	fn require(&mut self, byte_count: usize) -> Result {
		if self.request(byte_count)? {
			Ok(())
		} else {
			Err(Error::eof())
		}
	}

	/// Reads everything remaining into `sink`.
	fn read_all(&mut self, sink: &mut impl Sink) -> Result<usize>;

	gen_int_reads! {
		read_i8 -> i8,
		read_u8 -> u8,
		read_i16 read_i16_le -> i16,
		read_u16 read_u16_le -> u16,
		read_i32 read_i32_le -> i32,
		read_u32 read_u32_le -> u32,
		read_i64 read_i64_le -> i64,
		read_u64 read_u64_le -> u64,
		read_isize read_isize_le -> isize,
		read_usize read_usize_le -> usize,
	}

	/// Reads exactly `byte_count` bytes into a [`ByteString`].
	fn read_byte_str(&mut self, byte_count: usize) -> Result<ByteString> {
		self.require(byte_count)?;
		self.buf_mut().read_byte_str(byte_count)
	}

	/// Discards `byte_count` bytes, returning how many were actually
	/// available to discard.
	fn skip(&mut self, mut byte_count: usize) -> Result<usize> {
		let mut n = 0;
		while byte_count > 0 && self.request(calc_read_count(byte_count, self.buf()))? {
			let skipped = self.buf_mut().skip(byte_count)?;
			if skipped == 0 { break }
			n += skipped;
			byte_count -= skipped;
		}
		Ok(n)
	}

	/// Reads into `dst`, returning the number of bytes read (short on EOF).
	fn read_into_slice(&mut self, mut dst: &mut [u8]) -> Result<usize> {
		let mut n = 0;
		while !dst.is_empty() && self.request(calc_read_count(dst.len(), self.buf()))? {
			let read = self.buf_mut().read_into_slice(dst)?;
			if read == 0 { break }
			n += read;
			dst = &mut dst[read..];
		}
		Ok(n)
	}

	/// Fills `dst` completely, failing with [`ErrorKind::Eof`] if the
	/// source runs out first.
	fn read_into_slice_exact(&mut self, dst: &mut [u8]) -> Result {
		self.require(dst.len())?;
		self.buf_mut().read_into_slice_exact(dst)
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut array = [0; N];
		self.read_into_slice_exact(&mut array)?;
		Ok(array)
	}

	/// Reads everything remaining, decoding it as UTF-8 with replacement.
	fn read_all_utf8(&mut self, str: &mut String) -> Result {
		while self.read_utf8(str, usize::MAX)? > 0 { }
		Ok(())
	}

	/// Reads up to `byte_count` bytes, decoding them as UTF-8 with
	/// replacement. Returns the number of bytes consumed.
	fn read_utf8(&mut self, str: &mut String, mut byte_count: usize) -> Result<usize> {
		let mut n = 0;
		while byte_count > 0 && self.request(calc_read_count(byte_count, self.buf()))? {
			let read = self.buf_mut().read_utf8(str, byte_count)?;
			if read == 0 { break }
			n += read;
			byte_count -= read;
		}
		Ok(n)
	}

	/// Reads a single UTF-8 code point, replacing a malformed sequence with
	/// U+FFFD. Pulls up to 4 bytes from upstream first so a code point
	/// split across a segment boundary (or not yet buffered at all) can
	/// still be read whole.
	fn read_utf8_code_point(&mut self) -> Result<char> {
		self.request(4)?;
		self.buf_mut().read_utf8_code_point()
	}

	/// Reads a line of UTF-8 text, returning whether a terminator was found.
	/// The terminator itself is not appended to `str`.
	fn read_utf8_line(&mut self, str: &mut String) -> Result<bool> {
		loop {
			if self.buf_mut().read_utf8_line(str)? {
				return Ok(true)
			}
			if !self.request(self.buf().count() + SEGMENT_SIZE)? {
				return Ok(false)
			}
		}
	}

	/// Like [`read_utf8_line`](Self::read_utf8_line), but fails with
	/// [`ErrorKind::Eof`] if the source ends before a terminator is found.
	fn read_utf8_line_strict(&mut self, str: &mut String) -> Result {
		if self.read_utf8_line(str)? {
			Ok(())
		} else {
			Err(Error::eof())
		}
	}

	/// Peeks at the head of the buffer against `options`, returning the
	/// matched candidate's original index without consuming anything else.
	/// On a match, the matched bytes are consumed; on no match, nothing is.
	fn select(&mut self, options: &Options) -> Result<i32> {
		let mut have = 0;
		loop {
			have = have.max(self.buf().count());
			let head = self.peek_bytes(have);
			match options.select_prefix(&head, true) {
				Selection::Match(index) => {
					self.buf_mut().skip(options.len_of(index))?;
					return Ok(index as i32)
				}
				Selection::Truncated => {
					if !self.request(have + SEGMENT_SIZE)? {
						let head = self.peek_bytes(self.buf().count());
						return Ok(match options.select_prefix(&head, false) {
							Selection::Match(index) => {
								self.buf_mut().skip(options.len_of(index))?;
								index as i32
							}
							_ => -1,
						})
					}
					have = self.buf().count();
				}
				Selection::NoMatch => return Ok(-1),
			}
		}
	}

	/// Like [`select`](Self::select), but returns the matched candidate's
	/// associated value instead of its index.
	fn select_typed<'a, T>(&mut self, options: &'a TypedOptions<T>) -> Result<Option<&'a T>> {
		match self.select(options.options())? {
			-1 => Ok(None),
			index => Ok(Some(options.value(index as usize))),
		}
	}

	/// Copies up to `byte_count` buffered bytes without consuming them.
	fn peek_bytes(&self, byte_count: usize) -> Vec<u8> {
		let count = byte_count.min(self.buf().count());
		(0..count).map(|i| self.buf().get(i).expect("index within count")).collect()
	}
}

macro_rules! gen_int_writes {
	($($be_name:ident$($le_name:ident)?->$ty:ident,)+) => {
		$(gen_int_writes! { $be_name$($le_name)?->$ty })+
	};
	($be_name:ident$le_name:ident->$ty:ident) => {
		gen_int_writes! { $be_name->$ty "big-endian " }
		gen_int_writes! { $le_name->$ty "little-endian " }
	};
	($name:ident->$ty:ident$($endian:literal)?) => {
		#[doc = concat!(" Writes one ",$($endian,)?"[`",stringify!($ty),"`].")]
		fn $name(&mut self, value: $ty) -> Result {
			self.buf_mut().$name(value)
		}
	}
}

/// A buffered data sink (§4.3): writes accumulate in a [`Buffer`] and are
/// pushed to the underlying [`Sink`] by [`emit`](Self::emit) or
/// [`flush`](Sink::flush).
pub trait BufSink: BufStream + Sink {
	fn write_all(&mut self, source: &mut impl Source) -> Result<usize>;

	gen_int_writes! {
		write_i8 -> i8,
		write_u8 -> u8,
		write_i16 write_i16_le -> i16,
		write_u16 write_u16_le -> u16,
		write_i32 write_i32_le -> i32,
		write_u32 write_u32_le -> u32,
		write_i64 write_i64_le -> i64,
		write_u64 write_u64_le -> u64,
		write_isize write_isize_le -> isize,
		write_usize write_usize_le -> usize,
	}

	fn write_byte_string(&mut self, value: &ByteString) -> Result {
		self.buf_mut().write_byte_string(value)
	}

	fn write_from_slice(&mut self, value: &[u8]) -> Result {
		self.buf_mut().write_from_slice(value)
	}

	fn write_utf8(&mut self, value: &str) -> Result {
		self.buf_mut().write_utf8(value)
	}

	/// Pushes buffered data to the underlying sink, retaining anything
	/// that doesn't fill a complete segment.
	fn emit_complete_segments(&mut self) -> Result;

	/// Pushes all buffered data to the underlying sink, without flushing
	/// the sink itself.
	fn emit(&mut self) -> Result;
}

// Impls

impl Source for &[u8] {
	fn read(&mut self, sink: &mut Buffer, mut count: usize) -> Result<usize> {
		count = min(count, self.len());
		sink.write_from_slice(&self[..count])?;
		*self = &self[count..];
		Ok(count)
	}
}

/// Adapts any [`std::io::Read`] into a [`Source`], filling segments directly
/// from it without an intermediate copy.
pub struct ReaderSource<R> {
	inner: R,
}

impl<R> ReaderSource<R> {
	pub fn new(inner: R) -> Self { Self { inner } }

	pub fn into_inner(self) -> R { self.inner }
}

impl<R: std::io::Read> Source for ReaderSource<R> {
	fn read(&mut self, sink: &mut Buffer, count: usize) -> Result<usize> {
		let inner = &mut self.inner;
		sink.fill_from(count, |spare| inner.read(spare).map_err(Error::from))
	}
}

impl<R: std::io::Seek> Seekable for ReaderSource<R> {
	fn seek(&mut self, offset: SeekOffset) -> Result<usize> {
		Ok(self.inner.seek(offset.into_seek_from()).map_err(Error::from)? as usize)
	}
}

/// Adapts any [`std::io::Write`] into a [`Sink`], draining segments directly
/// into it without an intermediate copy.
pub struct WriterSink<W> {
	inner: W,
}

impl<W> WriterSink<W> {
	pub fn new(inner: W) -> Self { Self { inner } }

	pub fn into_inner(self) -> W { self.inner }
}

impl<W: std::io::Write> Sink for WriterSink<W> {
	fn write(&mut self, source: &mut Buffer, count: usize) -> Result<usize> {
		let inner = &mut self.inner;
		source.drain_into(count, |data| inner.write(data).map_err(Error::from))
	}

	fn flush(&mut self) -> Result {
		self.inner.flush().map_err(Error::from)
	}
}

impl<W: std::io::Seek> Seekable for WriterSink<W> {
	fn seek(&mut self, offset: SeekOffset) -> Result<usize> {
		Ok(self.inner.seek(offset.into_seek_from()).map_err(Error::from)? as usize)
	}
}

/// Converts some type into a [`Source`].
pub trait IntoSource<S: Source> {
	fn into_source(self) -> S;
}

impl<S: Source, T: Into<S>> IntoSource<S> for T {
	fn into_source(self) -> S { self.into() }
}

/// Converts some type into a [`Sink`].
pub trait IntoSink<S: Sink> {
	fn into_sink(self) -> S;
}

impl<S: Sink, T: Into<S>> IntoSink<S> for T {
	fn into_sink(self) -> S { self.into() }
}

pub use crate::buffered_wrappers::{buffer_source, buffer_sink, BufferedSource, BufferedSink, PeekSource, Blackhole};
