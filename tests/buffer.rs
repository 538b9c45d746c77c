// SPDX-License-Identifier: Apache-2.0

#[macro_use]
mod common;

use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use corio::{Buffer, BufferOptions, SEGMENT_SIZE};

macro_rules! gen_round_trip {
	($($fn_name:ident $write:ident $read:ident: $ty:ident),+ $(,)?) => {
		$(
		#[quickcheck]
		fn $fn_name(value: $ty) -> TestResult {
			let mut buf = Buffer::default();
			if let Err(e) = buf.$write(value) { return TestResult::error(e.to_string()) }
			match buf.$read() {
				Ok(read) => qc_assert_eq!(value, read),
				Err(e) => TestResult::error(e.to_string()),
			}
		}
		)+
	};
}

gen_round_trip! {
	byte write_u8 read_u8: u8,
	s_byte write_i8 read_i8: i8,
	short write_u16 read_u16: u16,
	s_short write_i16 read_i16: i16,
	int write_u32 read_u32: u32,
	s_int write_i32 read_i32: i32,
	long write_u64 read_u64: u64,
	s_long write_i64 read_i64: i64,
	size write_usize read_usize: usize,
	s_size write_isize read_isize: isize,
}

#[quickcheck]
fn utf8_round_trip(str: String) -> TestResult {
	let mut buf = Buffer::default();
	let len = str.len();
	if let Err(e) = buf.write_utf8(&str) { return TestResult::error(e.to_string()) }
	let mut read = String::new();
	match buf.read_utf8(&mut read, len) {
		Ok(n) => qc_assert_eq!((n, str), (len, read)),
		Err(e) => TestResult::error(e.to_string()),
	}
}

#[test]
fn utf8_across_segment_boundary_decodes_whole() {
	let mut buf = Buffer::default();
	// Pad to one byte short of a segment boundary, then straddle it with a
	// multi-byte code point that a naive per-segment decode would split.
	let padding = "a".repeat(SEGMENT_SIZE - 1);
	let text = format!("{padding}\u{20ac}tail");
	buf.write_utf8(&text).unwrap();

	let mut out = String::new();
	buf.read_all_utf8(&mut out).unwrap();
	assert_eq!(out, text);
}

#[test]
fn read_utf8_replaces_overlong_encoding_instead_of_failing() {
	// C0 80 is an overlong two-byte encoding of NUL (§4.4, §8 scenario 4):
	// each byte is, on its own, an invalid lead byte, so decoding must
	// produce two replacement characters rather than an error.
	let mut buf = Buffer::default();
	buf.write_from_slice(&[0xC0, 0x80]).unwrap();
	let mut out = String::new();
	let n = buf.read_utf8(&mut out, 2).unwrap();
	assert_eq!(n, 2);
	assert_eq!(out, "\u{FFFD}\u{FFFD}");
	assert!(buf.is_empty());
}

#[test]
fn read_utf8_code_point_round_trips_and_replaces_malformed_sequences() {
	let mut buf = Buffer::default();
	buf.write_utf8("a\u{20ac}").unwrap();
	assert_eq!(buf.read_utf8_code_point().unwrap(), 'a');
	assert_eq!(buf.read_utf8_code_point().unwrap(), '\u{20ac}');
	assert!(buf.is_empty());

	buf.write_from_slice(&[0xC0, 0x80]).unwrap();
	assert_eq!(buf.read_utf8_code_point().unwrap(), '\u{FFFD}');
	assert_eq!(buf.read_utf8_code_point().unwrap(), '\u{FFFD}');
	assert!(buf.is_empty());
}

#[test]
fn read_utf8_code_point_on_empty_buffer_fails_eof() {
	let mut buf = Buffer::default();
	assert!(buf.read_utf8_code_point().is_err());
}

#[test]
fn read_utf8_code_point_truncated_sequence_consumes_lead_byte_on_error() {
	let mut buf = Buffer::default();
	// Incomplete 3-byte sequence (missing the last continuation byte).
	buf.write_from_slice(&[0xE2, 0x82]).unwrap();
	assert!(buf.read_utf8_code_point().is_err());
	// The leading byte was consumed; one byte remains.
	assert_eq!(buf.count(), 1);
}

#[test]
fn write_moves_whole_segments_without_copying() {
	let mut src = Buffer::default();
	let data = vec![7u8; 20_000];
	src.write_from_slice(&data).unwrap();

	let mut dst = Buffer::default();
	let moved = dst.write(&mut src, usize::MAX).unwrap();

	assert_eq!(moved, data.len());
	assert_eq!(src.count(), 0);
	assert_eq!(dst.count(), data.len());

	let read_back = dst.read_byte_str(data.len()).unwrap();
	assert_eq!(read_back.as_slice(), data.as_slice());
}

#[test]
fn copy_shares_pages_without_consuming_source() {
	let mut src = Buffer::default();
	src.write_from_slice(&vec![1u8; 5_000]).unwrap();

	let mut copy = src.copy();
	assert_eq!(copy.count(), src.count());

	let original = src.read_byte_str(5_000).unwrap();
	let copied = copy.read_byte_str(5_000).unwrap();
	assert_eq!(original, copied);
}

#[test]
fn snapshot_below_threshold_copies_rather_than_shares() {
	let options = BufferOptions::default().set_snapshot_threshold(1024);
	let mut buf = Buffer::new(options);
	buf.write_from_slice(&vec![9u8; 100]).unwrap();

	let snap = buf.snapshot(100).unwrap();
	assert_eq!(snap.len(), 100);
	assert_eq!(snap.to_byte_string().as_slice(), vec![9u8; 100].as_slice());
}

#[test]
fn snapshot_at_or_above_threshold_shares_pages() {
	let options = BufferOptions::default().set_snapshot_threshold(0);
	let mut buf = Buffer::new(options);
	let data = vec![3u8; SEGMENT_SIZE + 10];
	buf.write_from_slice(&data).unwrap();

	let snap = buf.snapshot(data.len()).unwrap();
	assert_eq!(snap.len(), data.len());
	assert_eq!(snap.to_byte_string().as_slice(), data.as_slice());
}

#[test]
fn index_of_any_finds_needle_across_segments() {
	let mut buf = Buffer::default();
	let padding = vec![0u8; SEGMENT_SIZE - 2];
	buf.write_from_slice(&padding).unwrap();
	buf.write_from_slice(b"!?").unwrap();

	assert_eq!(buf.index_of_any(b"!?", 0), Some(padding.len()));
}

#[test]
fn decimal_round_trip_handles_i64_min() {
	let mut buf = Buffer::default();
	buf.write_decimal_long(i64::MIN).unwrap();
	buf.write_u8(b',').unwrap();
	assert_eq!(buf.read_decimal_long().unwrap(), i64::MIN);
	assert_eq!(buf.read_u8().unwrap(), b',');
}

#[test]
fn hexadecimal_round_trip() {
	let mut buf = Buffer::default();
	buf.write_hexadecimal_unsigned_long(0xdead_beef).unwrap();
	buf.write_u8(b'!').unwrap();
	assert_eq!(buf.read_hexadecimal_unsigned_long().unwrap(), 0xdead_beef);
	assert_eq!(buf.read_u8().unwrap(), b'!');
}

#[test]
fn buffer_decode_hex_round_trips() {
	let mut buf = Buffer::default();
	buf.write_from_slice(b"68656c6c6f").unwrap();
	assert_eq!(buf.decode_hex().unwrap().as_slice(), b"hello");
}

#[test]
fn buffer_decode_base64_fails_on_malformed_input() {
	let mut buf = Buffer::default();
	buf.write_from_slice(b"abc").unwrap();
	assert!(buf.decode_base64().is_err());
}

#[test]
fn read_eof_on_empty_buffer() {
	let mut buf = Buffer::default();
	assert!(buf.read_u8().is_err());
}
