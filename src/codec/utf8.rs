// SPDX-License-Identifier: Apache-2.0

//! The UTF-8 codec: size accounting over UTF-16 code units, lossy
//! replacement decoding, and a single-code-point reader used by
//! [`Buffer::read_utf8_code_point`](crate::Buffer::read_utf8_code_point).
//!
//! Lossy decoding walks the input with [`Utf8OrBytes`], an iterator over
//! alternating valid/malformed runs modeled on `orio::util::utf8::Utf8OrBytes`:
//! each run's valid prefix is found with `simdutf8::compat::from_utf8` (the
//! same validating entry point [`crate::Path`]/[`crate::ByteString`] use for
//! their own UTF-8 checks), and each malformed run's length is found by
//! [`decode_code_point`]'s maximal-subpart table rather than an unsafe split
//! on the validator's error. Overlong encodings, surrogate code points, and
//! out-of-range code points each collapse to one U+FFFD; a sequence missing
//! its trailing continuation bytes at the end of input collapses to a
//! single U+FFFD covering the whole incomplete tail.

use crate::error::{Error, Result};

pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// The UTF-8 byte weight of one UTF-16 code unit `u`, given the code unit
/// immediately following it (`None` at the end of input). Unpaired or
/// reversed surrogates count as one byte, the width of the `?` replacement
/// byte they encode to.
fn code_unit_weight(u: u16, next: Option<u16>) -> usize {
	match u {
		0x0000..=0x007F => 1,
		0x0080..=0x07FF => 2,
		0xD800..=0xDBFF => match next {
			Some(lo @ 0xDC00..=0xDFFF) => { let _ = lo; 4 }
			_ => 1,
		},
		0xDC00..=0xDFFF => 1, // unpaired low surrogate
		_ => 3,
	}
}

/// Computes the UTF-8 byte length that [`encode_utf16_lossy`] would produce
/// for `units`, without allocating.
pub fn size_in_utf8(units: &[u16]) -> usize {
	let mut size = 0;
	let mut i = 0;
	while i < units.len() {
		let next = units.get(i + 1).copied();
		let weight = code_unit_weight(units[i], next);
		size += weight;
		i += if weight == 4 { 2 } else { 1 };
	}
	size
}

/// Transcodes UTF-16 code units to UTF-8 bytes, combining surrogate pairs
/// with the conventional formula and replacing unpaired or reversed
/// surrogates with a single `?` (0x3F) byte.
pub fn encode_utf16_lossy(units: &[u16]) -> Vec<u8> {
	let mut out = Vec::with_capacity(size_in_utf8(units));
	let mut i = 0;
	while i < units.len() {
		let u = units[i];
		match u {
			0xD800..=0xDBFF => {
				match units.get(i + 1) {
					Some(&lo @ 0xDC00..=0xDFFF) => {
						let c = 0x10000 + (((u as u32 & 0x3FF) << 10) | (lo as u32 & 0x3FF));
						// Safety: the formula above always yields a scalar value.
						let c = char::from_u32(c).unwrap_or(REPLACEMENT_CHAR);
						let mut buf = [0u8; 4];
						out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
						i += 2;
						continue;
					}
					_ => out.push(b'?'),
				}
			}
			0xDC00..=0xDFFF => out.push(b'?'),
			_ => match char::from_u32(u as u32) {
				Some(c) => {
					let mut buf = [0u8; 4];
					out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
				}
				None => out.push(b'?'),
			},
		}
		i += 1;
	}
	out
}

/// An iterator over alternating runs of valid UTF-8 and malformed byte
/// sequences, modeled on `orio::util::utf8::Utf8OrBytes`. A `Some(Ok(_))`
/// run is validated by `simdutf8`; a `Some(Err(_))` run is exactly one
/// malformed subpart, its length found by [`decode_code_point`].
pub struct Utf8OrBytes<'a> {
	bytes: &'a [u8],
}

impl<'a> Utf8OrBytes<'a> {
	pub fn new(bytes: &'a [u8]) -> Self { Self { bytes } }
}

impl<'a> From<&'a [u8]> for Utf8OrBytes<'a> {
	fn from(bytes: &'a [u8]) -> Self { Self::new(bytes) }
}

impl<'a> Iterator for Utf8OrBytes<'a> {
	type Item = Result<&'a str, &'a [u8]>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.bytes.is_empty() {
			return None;
		}

		match simdutf8::compat::from_utf8(self.bytes) {
			Ok(valid) => {
				self.bytes = &[];
				Some(Ok(valid))
			}
			Err(err) if err.valid_up_to() > 0 => {
				let (valid, rest) = self.bytes.split_at(err.valid_up_to());
				self.bytes = rest;
				Some(Ok(std::str::from_utf8(valid).expect("simdutf8 reported this prefix valid")))
			}
			Err(_) => {
				// The run starts right at the malformed subpart; decode_code_point
				// either gives its exact length or, on a sequence truncated by the
				// end of input, errors — in which case the whole remaining tail is
				// the one incomplete subpart.
				let consumed = decode_code_point(self.bytes).map(|(_, n)| n).unwrap_or(self.bytes.len()).max(1);
				let (invalid, rest) = self.bytes.split_at(consumed);
				self.bytes = rest;
				Some(Err(invalid))
			}
		}
	}
}

/// Decodes `bytes` as UTF-8, replacing each malformed subpart with a single
/// U+FFFD.
pub fn decode_lossy(bytes: &[u8]) -> String {
	let mut out = String::with_capacity(bytes.len());
	for run in Utf8OrBytes::new(bytes) {
		match run {
			Ok(s) => out.push_str(s),
			Err(_) => out.push(REPLACEMENT_CHAR),
		}
	}
	out
}

/// Decodes one code point from the head of `bytes`, returning the code
/// point (or the replacement character for a malformed sequence) and the
/// number of bytes consumed.
///
/// Follows the same maximal-subpart rule the standard library's lossy
/// decoder uses (and [`decode_lossy`] delegates to): the first continuation
/// byte's valid range depends on the lead byte (`E0`, `ED`, `F0`, and `F4`
/// each narrow it to rule out overlong, surrogate, and out-of-range code
/// points respectively); a continuation byte outside that range is not
/// consumed as part of the broken sequence; it starts the next one.
///
/// Fails with [`crate::ErrorKind::Eof`] if fewer bytes are available than
/// the leading byte calls for and what's present doesn't itself break the
/// sequence early.
pub fn decode_code_point(bytes: &[u8]) -> Result<(char, usize)> {
	let Some(&lead) = bytes.first() else {
		return Err(Error::eof());
	};

	if lead < 0x80 {
		return Ok((lead as char, 1));
	}

	let (width, lead_bits, byte2_min, byte2_max) = match lead {
		0xC2..=0xDF => (2, (lead & 0x1F) as u32, 0x80u8, 0xBFu8),
		0xE0 => (3, (lead & 0x0F) as u32, 0xA0, 0xBF),
		0xE1..=0xEC | 0xEE..=0xEF => (3, (lead & 0x0F) as u32, 0x80, 0xBF),
		0xED => (3, (lead & 0x0F) as u32, 0x80, 0x9F),
		0xF0 => (4, (lead & 0x07) as u32, 0x90, 0xBF),
		0xF1..=0xF3 => (4, (lead & 0x07) as u32, 0x80, 0xBF),
		0xF4 => (4, (lead & 0x07) as u32, 0x80, 0x8F),
		// C0, C1 (always overlong), F5-FF (always out of range), and stray
		// continuation bytes 0x80-0xBF: never a valid lead, one byte each.
		_ => return Ok((REPLACEMENT_CHAR, 1)),
	};

	let Some(&b1) = bytes.get(1) else {
		return Err(Error::eof());
	};
	if b1 < byte2_min || b1 > byte2_max {
		return Ok((REPLACEMENT_CHAR, 1));
	}
	let mut code = (lead_bits << 6) | (b1 & 0x3F) as u32;

	for i in 2..width {
		let Some(&b) = bytes.get(i) else {
			return Err(Error::eof());
		};
		if b & 0xC0 != 0x80 {
			return Ok((REPLACEMENT_CHAR, i));
		}
		code = (code << 6) | (b & 0x3F) as u32;
	}

	match char::from_u32(code) {
		Some(c) => Ok((c, width)),
		None => Ok((REPLACEMENT_CHAR, width)),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn ascii_round_trips() {
		let (c, n) = decode_code_point(b"A").unwrap();
		assert_eq!((c, n), ('A', 1));
	}

	#[test]
	fn overlong_nul_is_two_replacements() {
		let bytes = [0xC0, 0x80];
		let (c, n) = decode_code_point(&bytes).unwrap();
		assert_eq!(c, REPLACEMENT_CHAR);
		assert_eq!(n, 1);
		let (c, n) = decode_code_point(&bytes[1..]).unwrap();
		assert_eq!(c, REPLACEMENT_CHAR);
		assert_eq!(n, 1);
	}

	#[test]
	fn surrogate_code_point_is_replaced() {
		// ED's second byte must be 0x80-0x9F to stay out of surrogate range;
		// 0xA0 breaks that, so only the lead byte is the bad subpart (one
		// U+FFFD per byte below, matching `decode_lossy`/stdlib behavior).
		let bytes = [0xED, 0xA0, 0x80]; // would encode U+D800
		let (c, n) = decode_code_point(&bytes).unwrap();
		assert_eq!(c, REPLACEMENT_CHAR);
		assert_eq!(n, 1);
		assert_eq!(decode_lossy(&bytes), "\u{FFFD}\u{FFFD}\u{FFFD}");
	}

	#[test]
	fn truncated_sequence_at_end_is_eof() {
		let bytes = [0xE2, 0x82]; // incomplete 3-byte sequence (€ missing last byte)
		assert!(decode_code_point(&bytes).is_err());
	}

	#[test]
	fn surrogate_pair_encodes_to_four_bytes() {
		// U+1F600 GRINNING FACE as a UTF-16 surrogate pair.
		let units = [0xD83D, 0xDE00];
		let bytes = encode_utf16_lossy(&units);
		assert_eq!(bytes.len(), 4);
		assert_eq!(decode_lossy(&bytes), "\u{1F600}");
	}

	#[test]
	fn unpaired_surrogate_encodes_to_question_mark() {
		let units = [0xD800u16];
		assert_eq!(encode_utf16_lossy(&units), b"?");
	}
}
