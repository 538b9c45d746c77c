// SPDX-License-Identifier: Apache-2.0

//! Random-access file handles (§4.8) and the [`FileSystem`] boundary (§6)
//! the core consumes from the host platform. [`LocalFileSystem`] is the one
//! concrete binding this crate provides, built directly on [`std::fs`] the
//! same way the buffered streams are built directly on [`std::io`].

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::streams::{ReaderSource, Seekable, SeekOffset, Sink, Source, WriterSink};
use crate::{Buffer, Error, Path, Result, SEGMENT_SIZE};

/// A snapshot of a path's status on the host file system (§6). Fields the
/// platform can't report are `None` rather than defaulted, so callers can
/// tell "empty" from "unknown".
#[derive(Debug)]
pub struct FileMetadata {
	pub is_regular_file: bool,
	pub is_directory: bool,
	/// The target of a symlink, unresolved. `None` when the path itself is
	/// not a symlink.
	pub symlink_target: Option<Path>,
	pub size: Option<u64>,
	/// Milliseconds since the Unix epoch.
	pub created_at: Option<i64>,
	pub last_modified_at: Option<i64>,
	pub last_accessed_at: Option<i64>,
	extras: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl FileMetadata {
	fn bare() -> Self {
		Self {
			is_regular_file: false,
			is_directory: false,
			symlink_target: None,
			size: None,
			created_at: None,
			last_modified_at: None,
			last_accessed_at: None,
			extras: HashMap::new(),
		}
	}

	/// A platform-specific value stashed alongside the common fields (e.g.
	/// Unix permission bits), looked up by type.
	pub fn extra<T: Any>(&self) -> Option<&T> {
		self.extras.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref())
	}

	pub fn set_extra<T: Any + Send + Sync>(&mut self, value: T) {
		self.extras.insert(TypeId::of::<T>(), Box::new(value));
	}
}

/// The file-system operations the core consumes from its platform bindings
/// (§6). The handful of methods above the line are what an implementation
/// actually has to provide; everything below is a default built out of them,
/// the same layering [`crate::streams::BufSource`]/[`BufSink`] use over raw
/// [`Source`]/[`Sink`].
pub trait FileSystem {
	/// Resolves a path to its canonical, symlink-free absolute form.
	fn canonicalize(&self, path: &Path) -> Result<Path>;

	/// Metadata for `path`, without following a trailing symlink. `None` if
	/// nothing exists there.
	fn metadata_or_null(&self, path: &Path) -> Result<Option<FileMetadata>>;

	/// The immediate children of a directory, in ascending byte order.
	fn list(&self, path: &Path) -> Result<Vec<Path>>;

	/// Opens `path` for random access via [`FileHandle::read_at`] only.
	fn open_read_only(&self, path: &Path) -> Result<Arc<FileHandle>>;

	/// Opens `path` for random access via [`FileHandle::read_at`] and
	/// [`FileHandle::write_at`]. `must_create` fails if the file already
	/// exists; `must_exist` fails if it doesn't; neither set creates the
	/// file if missing and opens it in place otherwise.
	fn open_read_write(&self, path: &Path, must_create: bool, must_exist: bool) -> Result<Arc<FileHandle>>;

	/// Opens a sequential reader, positioned at the start of `path`.
	fn source(&self, path: &Path) -> Result<Box<dyn Source>>;

	/// Opens a sequential writer, truncating `path` first. `must_create`
	/// fails if the file already exists.
	fn sink(&self, path: &Path, must_create: bool) -> Result<Box<dyn Sink>>;

	/// Opens a sequential writer positioned at the end of `path`.
	/// `must_exist` fails if the file doesn't already exist.
	fn appending_sink(&self, path: &Path, must_exist: bool) -> Result<Box<dyn Sink>>;

	/// Creates a directory at `path`. `must_create` fails if it already
	/// exists; otherwise an existing directory at `path` is left alone.
	fn create_directory(&self, path: &Path, must_create: bool) -> Result<()>;

	/// Moves `source` to `target`, replacing any file already there.
	/// Atomic when the platform's rename primitive is (same file system,
	/// on every platform this crate targets).
	fn atomic_move(&self, source: &Path, target: &Path) -> Result<()>;

	/// Deletes the file or empty directory at `path`. `must_exist` fails if
	/// nothing is there; otherwise a missing path is not an error.
	fn delete(&self, path: &Path, must_exist: bool) -> Result<()>;

	fn create_symlink(&self, source: &Path, target: &Path) -> Result<()>;

	/// [`metadata_or_null`](Self::metadata_or_null), failing with
	/// [`crate::ErrorKind::FileNotFound`] instead of returning `None`.
	fn metadata(&self, path: &Path) -> Result<FileMetadata> {
		self.metadata_or_null(path)?.ok_or_else(Error::file_not_found)
	}

	fn exists(&self, path: &Path) -> Result<bool> {
		Ok(self.metadata_or_null(path)?.is_some())
	}

	/// Creates `path` and any missing parent directories, succeeding
	/// silently if `path` is already a directory.
	fn create_directories(&self, path: &Path) -> Result<()> {
		if self.exists(path)? {
			return Ok(());
		}
		if let Some(parent) = path.parent() {
			if !parent.is_identity() {
				self.create_directories(&parent)?;
			}
		}
		self.create_directory(path, false)
	}

	/// Deletes `path`, recursing into directories. Symlinked directories are
	/// not descended into — only [`delete`](Self::delete) is called on them
	/// — so this never follows a cycle back to an ancestor.
	fn delete_recursively(&self, path: &Path) -> Result<()> {
		let Some(meta) = self.metadata_or_null(path)? else { return Ok(()) };
		if !meta.is_directory {
			return self.delete(path, true);
		}

		let mut discovered = vec![path.clone()];
		let mut stack = vec![path.clone()];
		while let Some(dir) = stack.pop() {
			for child in self.list(&dir)? {
				let child_meta = self.metadata(&child)?;
				if child_meta.is_directory {
					discovered.push(child.clone());
					stack.push(child);
				} else {
					self.delete(&child, true)?;
				}
			}
		}
		// Children were discovered after their parents, so deleting in
		// reverse order removes each directory only once it's empty.
		for dir in discovered.into_iter().rev() {
			self.delete(&dir, true)?;
		}
		Ok(())
	}

	/// Streams the bytes of `source` into `target`, creating `target` if
	/// necessary and truncating it otherwise.
	fn copy(&self, source: &Path, target: &Path) -> Result<()>
	where
		Self: Sized,
	{
		let mut src = self.source(source)?;
		let mut dst = self.sink(target, false)?;
		let mut buffer = Buffer::default();
		loop {
			let read = src.read(&mut buffer, SEGMENT_SIZE)?;
			if read == 0 {
				break;
			}
			dst.write_all(&mut buffer)?;
		}
		dst.flush()
	}

	/// A lazy, depth-first, parents-before-children walk of `path` and
	/// everything beneath it. When `follow_symlinks` is set, a symlinked
	/// directory is descended into once and then guarded against by its
	/// canonical path, so a cycle is visited but not walked forever.
	fn list_recursively<'fs>(&'fs self, path: &Path, follow_symlinks: bool) -> RecursiveListing<'fs, Self>
	where
		Self: Sized,
	{
		RecursiveListing {
			fs: self,
			follow_symlinks,
			stack: vec![path.clone()],
			visited: HashSet::new(),
		}
	}
}

/// An iterator over a [`FileSystem::list_recursively`] walk. Each item is a
/// `Result` because listing a directory or resolving a symlink can fail
/// partway through the walk.
pub struct RecursiveListing<'fs, F: ?Sized> {
	fs: &'fs F,
	follow_symlinks: bool,
	stack: Vec<Path>,
	visited: HashSet<Path>,
}

impl<'fs, F: FileSystem + ?Sized> RecursiveListing<'fs, F> {
	/// Whether `path` should be descended into, registering its canonical
	/// path as visited when following a symlink so a cycle is only entered
	/// once.
	fn should_descend(&mut self, path: &Path, meta: &FileMetadata) -> Result<bool> {
		if meta.is_directory {
			return Ok(true);
		}
		if !self.follow_symlinks {
			return Ok(false);
		}
		let Some(target) = &meta.symlink_target else { return Ok(false) };
		let resolved = self.fs.canonicalize(&path.div(target))?;
		let is_dir = self.fs.metadata_or_null(&resolved)?.is_some_and(|m| m.is_directory);
		Ok(is_dir && self.visited.insert(resolved))
	}
}

impl<'fs, F: FileSystem + ?Sized> Iterator for RecursiveListing<'fs, F> {
	type Item = Result<Path>;

	fn next(&mut self) -> Option<Result<Path>> {
		let path = self.stack.pop()?;
		let meta = match self.fs.metadata(&path) {
			Ok(meta) => meta,
			Err(e) => return Some(Err(e)),
		};
		match self.should_descend(&path, &meta) {
			Ok(true) => match self.fs.list(&path) {
				Ok(mut children) => {
					// Sorted ascending, pushed descending, so popping the
					// stack yields children in ascending order.
					children.sort_by(|a, b| b.cmp(a));
					self.stack.extend(children);
				}
				Err(e) => return Some(Err(e)),
			},
			Ok(false) => {}
			Err(e) => return Some(Err(e)),
		}
		Some(Ok(path))
	}
}

/// A random-access handle to an open file (§4.8). Safe to share across
/// threads via the returned [`Arc`] — `read_at`/`write_at` serialize on the
/// underlying file position internally — but an individual
/// [`FileSourceCursor`]/[`FileSinkCursor`] is not `Sync`.
pub struct FileHandle {
	file: Mutex<File>,
	read_write: bool,
	closed: AtomicBool,
	open_streams: AtomicUsize,
}

impl FileHandle {
	pub(crate) fn new(file: File, read_write: bool) -> Arc<Self> {
		Arc::new(Self {
			file: Mutex::new(file),
			read_write,
			closed: AtomicBool::new(false),
			open_streams: AtomicUsize::new(0),
		})
	}

	/// Opens `path` directly, independent of any [`FileSystem`] binding.
	pub fn open(path: impl AsRef<std::path::Path>, read_write: bool) -> Result<Arc<Self>> {
		let file = OpenOptions::new()
			.read(true)
			.write(read_write)
			.open(path)
			.map_err(Error::from)?;
		Ok(Self::new(file, read_write))
	}

	pub fn is_read_write(&self) -> bool { self.read_write }

	pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

	fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>> {
		self.file.lock().map_err(|_| Error::illegal_state("file handle mutex poisoned"))
	}

	fn check_open(&self) -> Result<()> {
		if self.is_closed() {
			Err(Error::illegal_state("file handle is closed"))
		} else {
			Ok(())
		}
	}

	fn check_writable(&self) -> Result<()> {
		self.check_open()?;
		if self.read_write {
			Ok(())
		} else {
			Err(Error::illegal_state("file handle is read-only"))
		}
	}

	/// The current size of the file, in bytes.
	pub fn size(&self) -> Result<u64> {
		self.check_open()?;
		Ok(self.lock()?.metadata().map_err(Error::from)?.len())
	}

	/// Truncates or extends the file to exactly `new_size` bytes.
	pub fn resize(&self, new_size: u64) -> Result<()> {
		self.check_writable()?;
		self.lock()?.set_len(new_size).map_err(Error::from)
	}

	/// Pushes any OS-buffered writes to durable storage.
	pub fn flush(&self) -> Result<()> {
		self.check_writable()?;
		self.lock()?.sync_all().map_err(Error::from)
	}

	/// Reads up to `byte_count` bytes starting at `file_offset` into the
	/// tail of `sink`, returning the number read (short at end of file).
	/// Does not disturb any cursor's independent position.
	pub fn read_at(&self, file_offset: u64, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		self.check_open()?;
		let mut file = self.lock()?;
		file.seek(SeekFrom::Start(file_offset)).map_err(Error::from)?;
		sink.fill_from(byte_count, |spare| file.read(spare).map_err(Error::from))
	}

	/// Writes up to `byte_count` buffered bytes from the head of `source`
	/// starting at `file_offset`, returning the number written.
	pub fn write_at(&self, file_offset: u64, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		self.check_writable()?;
		let mut file = self.lock()?;
		file.seek(SeekFrom::Start(file_offset)).map_err(Error::from)?;
		let byte_count = byte_count.min(source.count());
		source.drain_into(byte_count, |data| file.write(data).map_err(Error::from))
	}

	fn acquire_stream(self: &Arc<Self>) -> Result<()> {
		self.check_open()?;
		self.open_streams.fetch_add(1, Ordering::AcqRel);
		Ok(())
	}

	fn release_stream(&self) {
		self.open_streams.fetch_sub(1, Ordering::AcqRel);
	}

	/// Opens a [`Source`] cursor over this handle, starting at `file_offset`.
	pub fn source(self: &Arc<Self>, file_offset: u64) -> Result<FileSourceCursor> {
		self.acquire_stream()?;
		Ok(FileSourceCursor { handle: self.clone(), position: file_offset, closed: false })
	}

	/// Opens a [`Sink`] cursor over this handle, starting at `file_offset`.
	pub fn sink(self: &Arc<Self>, file_offset: u64) -> Result<FileSinkCursor> {
		self.check_writable()?;
		self.acquire_stream()?;
		Ok(FileSinkCursor { handle: self.clone(), position: file_offset, closed: false, append: false })
	}

	/// Opens a [`Sink`] cursor that always writes at the current end of the
	/// file, re-reading the size before every write.
	pub fn appending_sink(self: &Arc<Self>) -> Result<FileSinkCursor> {
		self.check_writable()?;
		self.acquire_stream()?;
		Ok(FileSinkCursor { handle: self.clone(), position: self.size()?, closed: false, append: true })
	}

	/// Marks the handle closed. Cursors already open continue to work —
	/// closing only rejects new `read_at`/`write_at`/`source`/`sink` calls —
	/// mirroring how a [`BufferedSource`](crate::BufferedSource) closing its
	/// buffer doesn't retroactively invalidate bytes already read.
	pub fn close(self: &Arc<Self>) -> Result<()> {
		self.closed.store(true, Ordering::Release);
		Ok(())
	}
}

/// A sequential [`Source`] over one [`FileHandle`], with its own position
/// independent of any other cursor on the same handle.
pub struct FileSourceCursor {
	handle: Arc<FileHandle>,
	position: u64,
	closed: bool,
}

impl Source for FileSourceCursor {
	fn read(&mut self, sink: &mut Buffer, count: usize) -> Result<usize> {
		if self.closed {
			return Err(Error::illegal_state("source is closed"));
		}
		let read = self.handle.read_at(self.position, sink, count)?;
		self.position += read as u64;
		Ok(read)
	}

	fn close_source(&mut self) -> Result {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.handle.release_stream();
		Ok(())
	}
}

impl Seekable for FileSourceCursor {
	fn seek(&mut self, offset: SeekOffset) -> Result<usize> {
		let len = self.handle.size()? as usize;
		self.position = offset.to_pos(self.position as usize, len) as u64;
		Ok(self.position as usize)
	}

	fn seek_len(&mut self) -> Result<usize> {
		Ok(self.handle.size()? as usize)
	}
}

impl Drop for FileSourceCursor {
	fn drop(&mut self) { let _ = self.close_source(); }
}

/// A sequential [`Sink`] over one [`FileHandle`], with its own position
/// independent of any other cursor on the same handle.
pub struct FileSinkCursor {
	handle: Arc<FileHandle>,
	position: u64,
	closed: bool,
	/// When set, every write re-reads the file's size first, so concurrent
	/// writers always append rather than overwrite each other.
	append: bool,
}

impl Sink for FileSinkCursor {
	fn write(&mut self, source: &mut Buffer, count: usize) -> Result<usize> {
		if self.closed {
			return Err(Error::illegal_state("sink is closed"));
		}
		if self.append {
			self.position = self.handle.size()?;
		}
		let written = self.handle.write_at(self.position, source, count)?;
		self.position += written as u64;
		Ok(written)
	}

	fn flush(&mut self) -> Result {
		self.handle.flush()
	}

	fn close_sink(&mut self) -> Result {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		let flush = self.handle.flush();
		self.handle.release_stream();
		flush
	}
}

impl Seekable for FileSinkCursor {
	fn seek(&mut self, offset: SeekOffset) -> Result<usize> {
		let len = self.handle.size()? as usize;
		self.position = offset.to_pos(self.position as usize, len) as u64;
		Ok(self.position as usize)
	}

	fn seek_len(&mut self) -> Result<usize> {
		Ok(self.handle.size()? as usize)
	}
}

impl Drop for FileSinkCursor {
	fn drop(&mut self) { let _ = self.close_sink(); }
}

#[cfg(unix)]
fn to_std_path(path: &Path) -> std::path::PathBuf {
	use std::os::unix::ffi::OsStrExt;
	std::path::PathBuf::from(std::ffi::OsStr::from_bytes(path.as_bytes()))
}

#[cfg(not(unix))]
fn to_std_path(path: &Path) -> std::path::PathBuf {
	std::path::PathBuf::from(path.to_string())
}

#[cfg(unix)]
fn from_std_path(path: &std::path::Path) -> Path {
	use std::os::unix::ffi::OsStrExt;
	Path::new(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn from_std_path(path: &std::path::Path) -> Path {
	Path::new(path.to_string_lossy().as_bytes())
}

fn to_millis(time: std::io::Result<SystemTime>) -> Option<i64> {
	time.ok()?.duration_since(UNIX_EPOCH).ok().map(|d| d.as_millis() as i64)
}

/// A [`FileSystem`] bound directly to the host's `std::fs`.
#[derive(Copy, Clone, Debug, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
	fn canonicalize(&self, path: &Path) -> Result<Path> {
		let resolved = std::fs::canonicalize(to_std_path(path)).map_err(Error::from)?;
		Ok(from_std_path(&resolved))
	}

	fn metadata_or_null(&self, path: &Path) -> Result<Option<FileMetadata>> {
		let std_path = to_std_path(path);
		let meta = match std::fs::symlink_metadata(&std_path) {
			Ok(meta) => meta,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(Error::from(e)),
		};

		let file_type = meta.file_type();
		let symlink_target = file_type
			.is_symlink()
			.then(|| std::fs::read_link(&std_path).ok())
			.flatten()
			.map(|p| from_std_path(&p));

		let mut result = FileMetadata::bare();
		result.is_regular_file = file_type.is_file();
		result.is_directory = file_type.is_dir();
		result.symlink_target = symlink_target;
		result.size = Some(meta.len());
		result.created_at = to_millis(meta.created());
		result.last_modified_at = to_millis(meta.modified());
		result.last_accessed_at = to_millis(meta.accessed());
		Ok(Some(result))
	}

	fn list(&self, path: &Path) -> Result<Vec<Path>> {
		let mut children = Vec::new();
		for entry in std::fs::read_dir(to_std_path(path)).map_err(Error::from)? {
			let entry = entry.map_err(Error::from)?;
			let name = from_std_path(std::path::Path::new(&entry.file_name()));
			children.push(path.div(&name));
		}
		children.sort();
		Ok(children)
	}

	fn open_read_only(&self, path: &Path) -> Result<Arc<FileHandle>> {
		let file = File::open(to_std_path(path)).map_err(Error::from)?;
		Ok(FileHandle::new(file, false))
	}

	fn open_read_write(&self, path: &Path, must_create: bool, must_exist: bool) -> Result<Arc<FileHandle>> {
		let mut opts = OpenOptions::new();
		opts.read(true).write(true);
		if must_create {
			opts.create_new(true);
		} else if !must_exist {
			opts.create(true);
		}
		let file = opts.open(to_std_path(path)).map_err(Error::from)?;
		Ok(FileHandle::new(file, true))
	}

	fn source(&self, path: &Path) -> Result<Box<dyn Source>> {
		let file = File::open(to_std_path(path)).map_err(Error::from)?;
		Ok(Box::new(ReaderSource::new(file)))
	}

	fn sink(&self, path: &Path, must_create: bool) -> Result<Box<dyn Sink>> {
		let mut opts = OpenOptions::new();
		opts.write(true).truncate(true);
		if must_create {
			opts.create_new(true);
		} else {
			opts.create(true);
		}
		let file = opts.open(to_std_path(path)).map_err(Error::from)?;
		Ok(Box::new(WriterSink::new(file)))
	}

	fn appending_sink(&self, path: &Path, must_exist: bool) -> Result<Box<dyn Sink>> {
		let mut opts = OpenOptions::new();
		opts.append(true);
		if !must_exist {
			opts.create(true);
		}
		let file = opts.open(to_std_path(path)).map_err(Error::from)?;
		Ok(Box::new(WriterSink::new(file)))
	}

	fn create_directory(&self, path: &Path, must_create: bool) -> Result<()> {
		let std_path = to_std_path(path);
		match std::fs::create_dir(&std_path) {
			Ok(()) => Ok(()),
			Err(e) if !must_create && e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
			Err(e) => Err(Error::from(e)),
		}
	}

	fn atomic_move(&self, source: &Path, target: &Path) -> Result<()> {
		std::fs::rename(to_std_path(source), to_std_path(target)).map_err(Error::from)
	}

	fn delete(&self, path: &Path, must_exist: bool) -> Result<()> {
		let std_path = to_std_path(path);
		let meta = std::fs::symlink_metadata(&std_path);
		match meta {
			Ok(m) if m.is_dir() => std::fs::remove_dir(&std_path).map_err(Error::from),
			Ok(_) => std::fs::remove_file(&std_path).map_err(Error::from),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				if must_exist { Err(Error::file_not_found()) } else { Ok(()) }
			}
			Err(e) => Err(Error::from(e)),
		}
	}

	fn create_symlink(&self, source: &Path, target: &Path) -> Result<()> {
		#[cfg(unix)]
		{
			std::os::unix::fs::symlink(to_std_path(source), to_std_path(target)).map_err(Error::from)
		}
		#[cfg(windows)]
		{
			let is_dir = std::fs::metadata(to_std_path(source)).map(|m| m.is_dir()).unwrap_or(false);
			let result = if is_dir {
				std::os::windows::fs::symlink_dir(to_std_path(source), to_std_path(target))
			} else {
				std::os::windows::fs::symlink_file(to_std_path(source), to_std_path(target))
			};
			result.map_err(Error::from)
		}
		#[cfg(not(any(unix, windows)))]
		{
			let _ = (source, target);
			Err(Error::illegal_state("symlinks are not supported on this platform"))
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use tempfile::tempdir;

	fn path(p: &std::path::Path) -> Path { from_std_path(p) }

	#[test]
	fn read_at_and_write_at_are_independent_of_sequential_position() {
		let dir = tempdir().unwrap();
		let file_path = dir.path().join("handle.bin");
		std::fs::write(&file_path, b"0123456789").unwrap();

		let handle = FileHandle::open(&file_path, true).unwrap();
		let mut write_buf = Buffer::default();
		write_buf.write_from_slice(b"XY").unwrap();
		let written = handle.write_at(3, &mut write_buf, 2).unwrap();
		assert_eq!(written, 2);

		let mut read_buf = Buffer::default();
		let read = handle.read_at(0, &mut read_buf, 10).unwrap();
		assert_eq!(read, 10);
		let mut out = String::new();
		read_buf.read_all_utf8(&mut out).unwrap();
		assert_eq!(out, "012XY56789");
	}

	#[test]
	fn cursor_source_reads_sequentially() {
		let dir = tempdir().unwrap();
		let file_path = dir.path().join("cursor.bin");
		std::fs::write(&file_path, b"hello world").unwrap();

		let handle = FileHandle::open(&file_path, false).unwrap();
		let mut cursor = handle.source(0).unwrap();
		let mut buffer = Buffer::default();
		let read = cursor.read(&mut buffer, 5).unwrap();
		assert_eq!(read, 5);
		assert_eq!(buffer.count(), 5);
		assert_eq!(cursor.seek_pos().unwrap(), 5);
	}

	#[test]
	fn appending_sink_always_writes_past_current_end() {
		let dir = tempdir().unwrap();
		let file_path = dir.path().join("append.bin");
		std::fs::write(&file_path, b"abc").unwrap();

		let handle = FileHandle::open(&file_path, true).unwrap();
		let mut sink = handle.appending_sink().unwrap();
		let mut buffer = Buffer::default();
		buffer.write_from_slice(b"def").unwrap();
		sink.write_all(&mut buffer).unwrap();
		drop(sink);

		assert_eq!(std::fs::read(&file_path).unwrap(), b"abcdef");
	}

	#[test]
	fn local_file_system_round_trips_metadata_and_listing() {
		let dir = tempdir().unwrap();
		let fs = LocalFileSystem;
		let root = path(dir.path());

		let sub = root.div(&Path::new("sub"));
		fs.create_directories(&sub).unwrap();
		let file = sub.div(&Path::new("a.txt"));
		{
			let mut sink = fs.sink(&file, false).unwrap();
			let mut buffer = Buffer::default();
			buffer.write_from_slice(b"contents").unwrap();
			sink.write_all(&mut buffer).unwrap();
		}

		let meta = fs.metadata(&file).unwrap();
		assert!(meta.is_regular_file);
		assert_eq!(meta.size, Some(8));

		let children = fs.list(&root).unwrap();
		assert_eq!(children, vec![sub.clone()]);

		let target = root.div(&Path::new("copy.txt"));
		fs.copy(&file, &target).unwrap();
		assert_eq!(std::fs::read(to_std_path(&target)).unwrap(), b"contents");

		fs.delete_recursively(&root).unwrap();
		assert!(!fs.exists(&root).unwrap());
	}

	#[test]
	fn list_recursively_visits_parents_before_children() {
		let dir = tempdir().unwrap();
		let fs = LocalFileSystem;
		let root = path(dir.path());
		let sub = root.div(&Path::new("sub"));
		fs.create_directories(&sub).unwrap();
		std::fs::write(to_std_path(&sub.div(&Path::new("leaf.txt"))), b"x").unwrap();

		let visited: Vec<Path> = fs.list_recursively(&root, false).collect::<Result<_>>().unwrap();
		assert_eq!(visited[0], root);
		assert!(visited.contains(&sub));
	}
}
