// SPDX-License-Identifier: Apache-2.0

//! The crate-wide error type. `Error` carries an [`ErrorKind`] plus an optional
//! boxed source, the same shape the pool/stream errors this crate grew out of
//! used (kind + `source: Option<Box<dyn Error>>`).

use std::error;
use std::fmt::{self, Display, Formatter};
use amplify_derive::Display;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// The taxonomy of failures the core can report.
#[derive(Copy, Clone, Debug, Display)]
pub enum ErrorKind {
	/// A read requested more bytes than were available.
	#[display("premature end of stream")]
	Eof,
	/// An underlying read/write/flush/close failed.
	#[display("i/o error")]
	Io,
	/// A path resolution produced no file.
	#[display("file not found")]
	FileNotFound,
	/// Malformed wire-level input (Base64, Options, ...).
	#[display("protocol error")]
	Protocol,
	/// A decimal/hex parse encountered a non-digit or overflowed.
	#[display("number format error")]
	NumberFormat,
	/// Invalid parameters (negative counts, out-of-range offsets, ...).
	#[display("illegal argument")]
	IllegalArgument,
	/// An operation on a closed stream, or reading an invalidated peek cursor.
	#[display("illegal state")]
	IllegalState,
	/// Offset/count checks on byte arrays and byte strings.
	#[display("index out of bounds")]
	IndexOutOfBounds,
}

#[derive(Debug, Display)]
#[display("{kind}")]
pub struct Error {
	kind: ErrorKind,
	source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		self.source.as_ref().map(|e| e.as_ref() as &(dyn error::Error + 'static))
	}
}

impl Error {
	pub fn new(kind: ErrorKind, source: impl error::Error + Send + Sync + 'static) -> Self {
		Self { kind, source: Some(Box::new(source)) }
	}

	pub fn bare(kind: ErrorKind) -> Self {
		Self { kind, source: None }
	}

	pub fn kind(&self) -> ErrorKind { self.kind }

	pub fn eof() -> Self { Self::bare(ErrorKind::Eof) }

	pub fn io(source: std::io::Error) -> Self { Self::new(ErrorKind::Io, source) }

	pub fn file_not_found() -> Self { Self::bare(ErrorKind::FileNotFound) }

	pub fn protocol(message: &'static str) -> Self {
		Self::new(ErrorKind::Protocol, Message(message))
	}

	pub fn number_format(source: NumberFormatError) -> Self {
		Self::new(ErrorKind::NumberFormat, source)
	}

	pub fn illegal_argument(message: &'static str) -> Self {
		Self::new(ErrorKind::IllegalArgument, Message(message))
	}

	pub fn illegal_state(message: &'static str) -> Self {
		Self::new(ErrorKind::IllegalState, Message(message))
	}

	pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
		Self::new(ErrorKind::IndexOutOfBounds, IndexError { index, len })
	}

	/// Downcasts the source into a [`std::io::Error`], if any.
	pub fn io_source(&self) -> Option<&std::io::Error> {
		error::Error::source(self)?.downcast_ref()
	}
}

impl From<std::io::Error> for Error {
	fn from(value: std::io::Error) -> Self {
		if value.kind() == std::io::ErrorKind::UnexpectedEof {
			Self::eof()
		} else {
			Self::io(value)
		}
	}
}

#[derive(Copy, Clone, Debug)]
struct Message(&'static str);

impl Display for Message {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl error::Error for Message { }

#[derive(Copy, Clone, Debug)]
struct IndexError {
	index: usize,
	len: usize,
}

impl Display for IndexError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "index {} out of bounds for length {}", self.index, self.len)
	}
}

impl error::Error for IndexError { }

/// An error parsing a decimal or hexadecimal integer from a [`Buffer`](crate::Buffer)
/// or [`ByteString`](crate::ByteString). `readDecimalLong`/`readHexadecimalUnsignedLong`
/// parse greedily and stop at the first non-digit rather than rejecting it, so
/// the only failures are no leading digit at all, or overflow.
#[derive(Copy, Clone, Debug, thiserror::Error)]
pub enum NumberFormatError {
	#[error("no digits found")]
	Empty,
	#[error("number too large to fit in a 64-bit integer")]
	Overflow,
}

impl From<NumberFormatError> for Error {
	fn from(value: NumberFormatError) -> Self { Error::number_format(value) }
}
