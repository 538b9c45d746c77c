// SPDX-License-Identifier: Apache-2.0

//! Immutable byte-string values: a contiguous [`ByteString`] and a
//! page-sharing [`SegmentedByteString`] that presents the same contract.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;
use once_cell::unsync::OnceCell;
use crate::codec::{base64, hex};
use crate::segment::Segment;

/// An immutable, owned sequence of bytes with lazily cached UTF-8 decoding
/// and hash code, ordered lexicographically over unsigned bytes (the same
/// order `Vec<u8>`/`[u8]` already use in Rust).
#[derive(Clone, Eq)]
pub struct ByteString {
	data: Vec<u8>,
	utf8: OnceCell<String>,
	hash: Cell<Option<u64>>,
}

impl ByteString {
	pub fn empty() -> Self { Self::from(Vec::new()) }

	pub fn len(&self) -> usize { self.data.len() }
	pub fn is_empty(&self) -> bool { self.data.is_empty() }
	pub fn as_slice(&self) -> &[u8] { &self.data }

	pub fn get(&self, index: usize) -> Option<u8> { self.data.get(index).copied() }

	/// Decodes the bytes as UTF-8 with replacement, caching the result.
	/// Malformed sequences become U+FFFD rather than failing (§4.4) — the
	/// same contract [`crate::Buffer::read_utf8`] follows.
	pub fn utf8(&self) -> &str {
		self.utf8.get_or_init(|| crate::codec::utf8::decode_lossy(&self.data))
	}

	pub fn hex(&self) -> String { hex::encode(&self.data) }

	pub fn base64(&self) -> String { base64::encode_standard(&self.data) }

	pub fn base64_url(&self) -> String { base64::encode_url(&self.data) }

	/// Decodes a hex string (either case, per §6) into a [`ByteString`].
	/// Returns `None` on an odd length or a non-hex-digit byte (§4.5).
	pub fn decode_hex(input: impl AsRef<[u8]>) -> Option<ByteString> {
		hex::decode(input.as_ref()).map(ByteString::from)
	}

	/// Decodes Base64 (standard or URL alphabet, interchangeably, tolerating
	/// embedded whitespace and optional padding) into a [`ByteString`].
	/// Returns `None` on format failure when called on a byte-string (§4.5).
	pub fn decode_base64(input: impl AsRef<[u8]>) -> Option<ByteString> {
		base64::decode(input.as_ref()).map(ByteString::from)
	}

	/// Returns `self` unchanged (cloned cheaply via the reference-counted
	/// source convention) if already lowercase, else a new lowercased copy.
	pub fn to_ascii_lowercase(&self) -> ByteString {
		if self.data.iter().any(u8::is_ascii_uppercase) {
			ByteString::from(self.data.to_ascii_lowercase())
		} else {
			self.clone()
		}
	}

	pub fn to_ascii_uppercase(&self) -> ByteString {
		if self.data.iter().any(u8::is_ascii_lowercase) {
			ByteString::from(self.data.to_ascii_uppercase())
		} else {
			self.clone()
		}
	}

	pub fn substring(&self, begin: usize, end: Option<usize>) -> ByteString {
		let end = end.unwrap_or(self.len()).min(self.len());
		let begin = begin.min(end);
		ByteString::from(self.data[begin..end].to_vec())
	}

	pub fn starts_with(&self, prefix: &[u8]) -> bool { self.data.starts_with(prefix) }
	pub fn ends_with(&self, suffix: &[u8]) -> bool { self.data.ends_with(suffix) }

	pub fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
		if needle.is_empty() { return Some(from.min(self.len())) }
		if from >= self.data.len() { return None }
		self.data[from..]
			.windows(needle.len())
			.position(|w| w == needle)
			.map(|i| i + from)
	}

	pub fn last_index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
		if needle.is_empty() { return Some(from.min(self.len())) }
		let upper = (from + needle.len()).min(self.data.len());
		if upper < needle.len() { return None }
		self.data[..upper]
			.windows(needle.len())
			.enumerate()
			.filter(|(_, w)| *w == needle)
			.next_back()
			.map(|(i, _)| i)
	}

	pub fn range_equals(&self, offset: usize, other: &[u8], other_offset: usize, len: usize) -> bool {
		if offset + len > self.data.len() || other_offset + len > other.len() {
			return false;
		}
		self.data[offset..offset + len] == other[other_offset..other_offset + len]
	}

	fn hash_code(&self) -> u64 {
		if let Some(h) = self.hash.get() { return h }
		let mut hasher = DefaultHasher::new();
		self.data.hash(&mut hasher);
		let h = hasher.finish();
		self.hash.set(Some(h));
		h
	}

	/// Projects the leading 4 bytes (zero-padded) into `[0, n)`.
	pub fn to_index(&self, n: u32) -> u32 {
		let mut bytes = [0u8; 4];
		let len = self.len().min(4);
		bytes[..len].copy_from_slice(&self.data[..len]);
		let value = u32::from_be_bytes(bytes);
		((value as u64 * n as u64) >> 32) as u32
	}

	/// Projects the leading 7 bytes (zero-padded) into `[0.0, 1.0)`.
	pub fn to_fraction(&self) -> f64 {
		let mut bytes = [0u8; 8];
		let len = self.len().min(7);
		bytes[..len].copy_from_slice(&self.data[..len]);
		let value = u64::from_be_bytes(bytes) >> 8;
		(value as f64) / ((1u64 << 56) as f64)
	}
}

impl From<Vec<u8>> for ByteString {
	fn from(data: Vec<u8>) -> Self {
		Self { data, utf8: OnceCell::new(), hash: Cell::new(None) }
	}
}

impl From<&[u8]> for ByteString {
	fn from(data: &[u8]) -> Self { Self::from(data.to_vec()) }
}

impl From<&str> for ByteString {
	fn from(s: &str) -> Self {
		Self { data: s.as_bytes().to_vec(), utf8: OnceCell::from(s.to_owned()), hash: Cell::new(None) }
	}
}

impl PartialEq for ByteString {
	fn eq(&self, other: &Self) -> bool { self.data == other.data }
}

impl PartialOrd for ByteString {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ByteString {
	fn cmp(&self, other: &Self) -> Ordering { self.data.cmp(&other.data) }
}

impl Hash for ByteString {
	fn hash<H: Hasher>(&self, state: &mut H) { state.write_u64(self.hash_code()) }
}

const PREVIEW_LIMIT: usize = 64;

impl Debug for ByteString {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", render_preview(&self.data))
	}
}

/// Renders `[text=...]` when the leading bytes decode cleanly as printable
/// UTF-8, else `[hex=...]`, truncated past [`PREVIEW_LIMIT`] bytes.
fn render_preview(data: &[u8]) -> String {
	let preview_len = data.len().min(PREVIEW_LIMIT);
	let truncated = data.len() > PREVIEW_LIMIT;
	let preview = &data[..preview_len];

	if let Ok(s) = simdutf8::basic::from_utf8(preview) {
		if s.chars().all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t')) {
			let mut escaped = String::with_capacity(s.len());
			for c in s.chars() {
				match c {
					'\\' => escaped.push_str("\\\\"),
					'\n' => escaped.push_str("\\n"),
					'\r' => escaped.push_str("\\r"),
					c => escaped.push(c),
				}
			}
			if truncated { escaped.push('\u{2026}'); }
			return format!("[text={escaped}]");
		}
	}

	let mut hex = self::hex::encode(preview);
	if truncated { hex.push('\u{2026}'); }
	format!("[hex={hex}]")
}

/// A byte-string variant over shared pages plus a directory of cumulative
/// byte counts, avoiding a copy when built from a [`Buffer`](crate::Buffer)
/// snapshot.
pub struct SegmentedByteString {
	pages: Vec<Segment>,
	/// Cumulative byte count after each page (monotonically increasing,
	/// last entry equals the total size).
	directory: Vec<usize>,
	materialized: OnceCell<ByteString>,
}

impl SegmentedByteString {
	pub(crate) fn from_segments(pages: Vec<Segment>) -> Self {
		let mut directory = Vec::with_capacity(pages.len());
		let mut total = 0;
		for seg in &pages {
			total += seg.len();
			directory.push(total);
		}
		Self { pages, directory, materialized: OnceCell::new() }
	}

	pub fn len(&self) -> usize { self.directory.last().copied().unwrap_or(0) }
	pub fn is_empty(&self) -> bool { self.len() == 0 }

	/// Locates the page containing logical offset `index` via binary search
	/// over the directory, then the offset within that page.
	pub fn get(&self, index: usize) -> Option<u8> {
		if index >= self.len() { return None }
		let page = self.directory.partition_point(|&end| end <= index);
		let start = if page == 0 { 0 } else { self.directory[page - 1] };
		self.pages[page].with_data(|data| data[index - start])
	}

	/// Writes each page into `dst` as a new shared segment — no bytes are
	/// copied.
	pub fn write_into(&self, dst: &mut crate::Buffer) {
		for seg in &self.pages {
			let alias = seg.alias();
			dst.inc_size(alias.len());
			dst.segments_mut().push_back(alias);
		}
	}

	fn materialize(&self) -> &ByteString {
		self.materialized.get_or_init(|| {
			let mut data = Vec::with_capacity(self.len());
			for seg in &self.pages {
				seg.with_data(|d| data.extend_from_slice(d));
			}
			ByteString::from(data)
		})
	}

	pub fn utf8(&self) -> String {
		self.materialize().utf8().to_owned()
	}

	pub fn hex(&self) -> String { self.materialize().hex() }
	pub fn base64(&self) -> String { self.materialize().base64() }
	pub fn base64_url(&self) -> String { self.materialize().base64_url() }

	pub fn to_byte_string(&self) -> ByteString { self.materialize().clone() }

	pub fn to_ascii_lowercase(&self) -> ByteString { self.materialize().to_ascii_lowercase() }
	pub fn to_ascii_uppercase(&self) -> ByteString { self.materialize().to_ascii_uppercase() }

	pub fn substring(&self, begin: usize, end: Option<usize>) -> ByteString {
		self.materialize().substring(begin, end)
	}

	pub fn starts_with(&self, prefix: &[u8]) -> bool { self.materialize().starts_with(prefix) }
	pub fn ends_with(&self, suffix: &[u8]) -> bool { self.materialize().ends_with(suffix) }

	pub fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
		self.materialize().index_of(needle, from)
	}

	pub fn last_index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
		self.materialize().last_index_of(needle, from)
	}

	pub fn range_equals(&self, offset: usize, other: &[u8], other_offset: usize, len: usize) -> bool {
		self.materialize().range_equals(offset, other, other_offset, len)
	}

	pub fn to_index(&self, n: u32) -> u32 { self.materialize().to_index(n) }
	pub fn to_fraction(&self) -> f64 { self.materialize().to_fraction() }
}

impl PartialEq for SegmentedByteString {
	fn eq(&self, other: &Self) -> bool { *self.materialize() == *other.materialize() }
}

impl Eq for SegmentedByteString { }

impl PartialOrd for SegmentedByteString {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for SegmentedByteString {
	fn cmp(&self, other: &Self) -> Ordering { self.materialize().cmp(other.materialize()) }
}

impl Hash for SegmentedByteString {
	fn hash<H: Hasher>(&self, state: &mut H) { self.materialize().hash(state) }
}

impl Debug for SegmentedByteString {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Debug::fmt(self.materialize(), f)
	}
}

impl Clone for SegmentedByteString {
	/// Clones cheaply: pages are re-aliased, not copied.
	fn clone(&self) -> Self {
		Self::from_segments(self.pages.iter().map(Segment::alias).collect())
	}
}
