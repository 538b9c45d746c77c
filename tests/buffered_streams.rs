// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use corio::{Buffer, ByteString, Options, Result};
use corio::streams::{BufSink, BufSource, ReaderSource, Sink, Source};
use corio::{buffer_sink, buffer_source};

#[test]
fn reads_through_a_std_io_reader() {
	let reader = ReaderSource::new(Cursor::new(b"hello, world".to_vec()));
	let mut source = buffer_source(reader);
	let mut str = String::new();
	source.read_all_utf8(&mut str).unwrap();
	assert_eq!(str, "hello, world");
}

#[test]
fn skip_then_read_matches_unconsumed_tail() {
	let mut source = buffer_source(&b"0123456789"[..]);
	assert_eq!(source.skip(4).unwrap(), 4);
	let rest = source.read_byte_str(6).unwrap();
	assert_eq!(rest, ByteString::from("456789"));
}

/// A sink over a shared `Vec<u8>`, so tests can inspect what was written
/// after the owning `BufferedSink` drops (and flushes).
#[derive(Clone, Default)]
struct VecSink(Rc<RefCell<Vec<u8>>>);

impl Sink for VecSink {
	fn write(&mut self, source: &mut Buffer, count: usize) -> Result<usize> {
		let bytes = source.read_byte_str(count.min(source.count()))?;
		self.0.borrow_mut().extend_from_slice(bytes.as_slice());
		Ok(bytes.len())
	}
}

#[test]
fn writes_through_buffer_and_emit() {
	let written = Rc::new(RefCell::new(Vec::new()));
	{
		let mut sink = buffer_sink(VecSink(written.clone()));
		sink.write_utf8("hello, world").unwrap();
		sink.emit().unwrap();
	}
	assert_eq!(&*written.borrow(), b"hello, world");
}

#[test]
fn write_all_drains_a_raw_source_into_a_sink() {
	let written = Rc::new(RefCell::new(Vec::new()));
	{
		let mut source: &[u8] = b"all of this";
		let mut sink = buffer_sink(VecSink(written.clone()));
		let n = sink.write_all(&mut source).unwrap();
		assert_eq!(n, 11);
		sink.emit().unwrap();
	}
	assert_eq!(&*written.borrow(), b"all of this");
}

#[test]
fn select_picks_the_first_in_original_order_among_several_prefixes() {
	// Per §4.6/§8 scenario 3: when more than one listed option is a prefix
	// of the input, the option that comes first in the caller's original
	// list wins, not the longest one — "GET" (index 0) beats "GET /"
	// (index 1) even though the latter also matches and is longer.
	let options = Options::new(&[
		ByteString::from("GET"),
		ByteString::from("GET /"),
		ByteString::from("POST"),
	]).unwrap();

	let mut source = buffer_source(&b"GET /index.html"[..]);
	let index = source.select(&options).unwrap();
	assert_eq!(index, 0);

	let mut rest = String::new();
	source.read_all_utf8(&mut rest).unwrap();
	assert_eq!(rest, " /index.html");
}

#[test]
fn select_reports_no_match() {
	let options = Options::new(&[ByteString::from("GET"), ByteString::from("POST")]).unwrap();
	let mut source = buffer_source(&b"PUT /x"[..]);
	assert_eq!(source.select(&options).unwrap(), -1);
}
