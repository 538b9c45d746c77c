// SPDX-License-Identifier: Apache-2.0

//! Lowercase-output, case-insensitive-input hex encoding, split into
//! separate encode/decode entry points over `base16ct`.

pub fn encode(data: &[u8]) -> String {
	base16ct::lower::encode_string(data)
}

/// Decodes a hex string of either case, accepting mixed case within the
/// same input. Returns `None` on an odd length or non-hex-digit byte.
pub fn decode(input: &[u8]) -> Option<Vec<u8>> {
	base16ct::mixed::decode_vec(input).ok()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn round_trips() {
		let data = b"\x00\x01\xfe\xff hello";
		assert_eq!(decode(encode(data).as_bytes()).unwrap(), data);
	}

	#[test]
	fn decode_accepts_mixed_case() {
		assert_eq!(decode(b"dEaDbEeF").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
	}

	#[test]
	fn decode_rejects_odd_length() {
		assert!(decode(b"abc").is_none());
	}
}
