// SPDX-License-Identifier: Apache-2.0

use corio::{ByteString, Options, TypedOptions};
use corio::buffer_source;
use corio::pattern::Selection;
use corio::streams::BufSource;

fn opts(strs: &[&str]) -> Options {
	let candidates: Vec<ByteString> = strs.iter().map(|s| ByteString::from(*s)).collect();
	Options::new(&candidates).unwrap()
}

#[test]
fn select_prefix_matches_candidate_in_original_order() {
	// "GET" (index 0) and "GET /" (index 1) both prefix the input; the one
	// first in the caller's original order wins over the longer one.
	let options = opts(&["GET", "GET /", "POST"]);
	assert_eq!(options.select_prefix(b"GET /index", true), Selection::Match(0));
}

#[test]
fn select_prefix_falls_back_to_the_shortest_covering_candidate() {
	let options = opts(&["application/json", "application"]);
	assert_eq!(options.select_prefix(b"application/xml", true), Selection::Match(1));
}

#[test]
fn len_of_reports_the_matched_candidate_byte_length() {
	let options = opts(&["a", "abc"]);
	match options.select_prefix(b"abc", true) {
		Selection::Match(index) => assert_eq!(options.len_of(index), 3),
		other => panic!("expected a match, got {other:?}"),
	}
}

#[test]
fn typed_options_hands_back_the_value_for_the_matched_candidate() {
	let entries = vec![
		(ByteString::from("GET"), "get"),
		(ByteString::from("POST"), "post"),
	];
	let typed = TypedOptions::new(entries).unwrap();

	let mut source = buffer_source(&b"POST /x"[..]);
	let matched = source.select_typed(&typed).unwrap();
	assert_eq!(matched, Some(&"post"));

	let mut rest = String::new();
	source.read_all_utf8(&mut rest).unwrap();
	assert_eq!(rest, " /x");
}

#[test]
fn typed_options_reports_no_match_as_none() {
	let entries = vec![(ByteString::from("GET"), 1), (ByteString::from("POST"), 2)];
	let typed = TypedOptions::new(entries).unwrap();

	let mut source = buffer_source(&b"PUT /x"[..]);
	assert_eq!(source.select_typed(&typed).unwrap(), None);
}

#[test]
fn index_of_any_finds_the_earliest_of_several_bytes() {
	let text = "no terminator here, then: a line\r\n";
	let mut buf = corio::Buffer::default();
	buf.write_from_slice(text.as_bytes()).unwrap();
	assert_eq!(buf.index_of_any(b"\r\n", 0), text.find(['\r', '\n']));
}
