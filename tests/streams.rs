// SPDX-License-Identifier: Apache-2.0

use std::io::Cursor;
use std::sync::Arc;
use tempfile::NamedTempFile;
use corio::{buffer_source, buffer_sink, Buffer, FileHandle};
use corio::streams::{ReaderSource, WriterSink, Sink, BufSource, BufSink, SeekOffset, Seekable, SeekableExt};

#[test]
fn reader_source_seeks_by_absolute_position() {
	let mut source = ReaderSource::new(Cursor::new(b"0123456789".to_vec()));
	assert_eq!(source.seek(SeekOffset::FromStart(4)).unwrap(), 4);
	assert_eq!(source.seek_pos().unwrap(), 4);
}

#[test]
fn reader_source_seek_len_restores_position() {
	let mut source = ReaderSource::new(Cursor::new(b"0123456789".to_vec()));
	source.seek(SeekOffset::FromStart(3)).unwrap();
	assert_eq!(source.seek_len().unwrap(), 10);
	assert_eq!(source.seek_pos().unwrap(), 3);
}

#[test]
fn buffered_source_satisfies_small_seeks_from_its_own_buffer() {
	let mut source = buffer_source(ReaderSource::new(Cursor::new(b"0123456789".to_vec())));
	source.require(10).unwrap();
	// The whole stream is now buffered, so seeking back to the start
	// must not touch the underlying reader.
	source.seek(SeekOffset::FromStart(0)).unwrap();
	let mut rest = String::new();
	source.read_all_utf8(&mut rest).unwrap();
	assert_eq!(rest, "0123456789");
}

#[test]
fn writer_sink_reports_its_current_position() {
	let mut sink = WriterSink::new(Cursor::new(vec![0u8; 8]));
	sink.seek_forward(4).unwrap();
	assert_eq!(sink.seek_pos().unwrap(), 4);
}

#[test]
fn file_handle_cursor_seeks_independent_of_the_handle() {
	let file = NamedTempFile::new().unwrap();
	let handle = FileHandle::open(file.path(), true).unwrap();
	let mut writer = handle.sink(0).unwrap();

	let mut payload = Buffer::default();
	payload.write_from_slice(b"hello, world").unwrap();
	writer.write_all(&mut payload).unwrap();
	writer.seek(SeekOffset::FromStart(7)).unwrap();
	assert_eq!(writer.seek_pos().unwrap(), 7);

	handle.close().unwrap();
}

#[test]
fn read_at_and_write_at_operate_on_explicit_offsets() {
	let file = NamedTempFile::new().unwrap();
	let handle = FileHandle::open(file.path(), true).unwrap();

	let mut payload = Buffer::default();
	payload.write_from_slice(b"abcdefgh").unwrap();
	handle.write_at(0, &mut payload, 8).unwrap();

	let mut out = Buffer::default();
	let n = handle.read_at(2, &mut out, 4).unwrap();
	assert_eq!(n, 4);
	assert_eq!(out.read_byte_str(4).unwrap().as_slice(), b"cdef");

	handle.close().unwrap();
}

#[test]
fn buffer_sink_roundtrips_through_a_writer_sink() {
	let file = NamedTempFile::new().unwrap();
	{
		let writer = WriterSink::new(std::fs::File::create(file.path()).unwrap());
		let mut sink = buffer_sink(writer);
		sink.write_utf8("buffered write").unwrap();
		sink.emit().unwrap();
	}
	let written = std::fs::read(file.path()).unwrap();
	assert_eq!(&written, b"buffered write");
}

#[test]
fn file_handle_stays_open_until_every_cursor_drops() {
	let file = NamedTempFile::new().unwrap();
	let handle: Arc<FileHandle> = FileHandle::open(file.path(), true).unwrap();

	let mut a = handle.sink(0).unwrap();
	let mut payload = Buffer::default();
	payload.write_from_slice(b"shared").unwrap();
	a.write_all(&mut payload).unwrap();
	drop(a);

	assert!(!handle.is_closed());
	handle.close().unwrap();
	assert!(handle.is_closed());
}
