// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity pages of memory, the building block [`Buffer`](crate::Buffer)
//! grows and shrinks by. Pages are reference-counted so that moving or copying
//! a segment between buffers can be a pointer swap rather than a `memcpy`.

use std::cell::RefCell;
use std::rc::Rc;

/// The fixed capacity of a single [`Segment`] page, in bytes.
pub const SEGMENT_SIZE: usize = 8192;

/// The minimum byte count at which [`Segment::share_prefix`] shares the
/// underlying page rather than copying it into a fresh one.
pub const SHARE_MINIMUM: usize = 1024;

type Page = Rc<RefCell<[u8; SEGMENT_SIZE]>>;

fn fresh_page() -> Page { Rc::new(RefCell::new([0; SEGMENT_SIZE])) }

/// A fixed-capacity page of bytes plus a readable `[pos, limit)` window.
///
/// `owner` is `true` if this handle may advance `limit` (append). `shared` is
/// `true` once another [`Segment`] has been created over the same page; an
/// owner segment that becomes shared keeps writing, but only ever past
/// `limit` at the time of sharing, so data visible to the shared copy is
/// never mutated.
pub struct Segment {
	page: Page,
	pos: usize,
	limit: usize,
	owner: bool,
	shared: bool,
}

impl Segment {
	fn with_page(page: Page, pos: usize, limit: usize, owner: bool, shared: bool) -> Self {
		debug_assert!(pos <= limit && limit <= SEGMENT_SIZE);
		Self { page, pos, limit, owner, shared }
	}

	/// Creates a fresh, empty, owned segment over a new page.
	pub(crate) fn fresh() -> Self {
		Self::with_page(fresh_page(), 0, 0, true, false)
	}

	/// Creates a fresh, empty, owned segment reusing a recycled page.
	pub(crate) fn reuse(page: Page) -> Self {
		Self::with_page(page, 0, 0, true, false)
	}

	pub fn pos(&self) -> usize { self.pos }
	pub fn limit(&self) -> usize { self.limit }
	pub fn owner(&self) -> bool { self.owner }

	/// `true` if another segment is aliasing this segment's page.
	pub fn shared(&self) -> bool { self.shared || Rc::strong_count(&self.page) > 1 }

	/// The number of bytes available to read.
	pub fn len(&self) -> usize { self.limit - self.pos }

	/// `true` if there are no bytes to read.
	pub fn is_empty(&self) -> bool { self.pos == self.limit }

	/// The number of bytes of writable capacity remaining, zero for non-owners.
	pub fn writable(&self) -> usize {
		if self.owner { SEGMENT_SIZE - self.limit } else { 0 }
	}

	/// Returns a copy of the readable window as an owned vector. Prefer
	/// [`with_data`](Self::with_data) where a borrow will do.
	pub fn to_vec(&self) -> Vec<u8> { self.with_data(<[u8]>::to_vec) }

	/// Borrows the readable `[pos, limit)` window.
	pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
		let page = self.page.borrow();
		f(&page[self.pos..self.limit])
	}

	/// Borrows the writable `[limit, SEGMENT_SIZE)` window. Panics if this
	/// segment is not an owner.
	pub fn with_spare<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
		assert!(self.owner, "non-owner segment cannot be written to");
		let mut page = self.page.borrow_mut();
		f(&mut page[self.limit..])
	}

	/// Copies `data` into the writable window, returning the number of bytes
	/// written (bounded by remaining capacity).
	pub fn push_slice(&mut self, data: &[u8]) -> usize {
		let n = data.len().min(self.writable());
		if n > 0 {
			self.with_spare(|spare| spare[..n].copy_from_slice(&data[..n]));
			self.limit += n;
		}
		n
	}

	/// Pushes a single byte, returning `true` if there was room.
	pub fn push(&mut self, byte: u8) -> bool {
		if self.writable() == 0 { return false }
		self.with_spare(|spare| spare[0] = byte);
		self.limit += 1;
		true
	}

	/// Copies up to `dst.len()` readable bytes into `dst`, consuming them.
	pub fn pop_into_slice(&mut self, dst: &mut [u8]) -> usize {
		let n = dst.len().min(self.len());
		if n > 0 {
			self.with_data(|data| dst[..n].copy_from_slice(&data[..n]));
			self.pos += n;
		}
		n
	}

	/// Pops a single byte, if any is available.
	pub fn pop(&mut self) -> Option<u8> {
		if self.is_empty() { return None }
		let byte = self.with_data(|data| data[0]);
		self.pos += 1;
		Some(byte)
	}

	/// Advances `pos` by `n`, marking `n` bytes as consumed.
	pub fn consume(&mut self, n: usize) {
		debug_assert!(self.pos + n <= self.limit);
		self.pos += n;
	}

	/// Advances `limit` by `n` after bytes were written directly via
	/// [`with_spare`](Self::with_spare).
	pub fn grow(&mut self, n: usize) {
		debug_assert!(self.owner);
		debug_assert!(self.limit + n <= SEGMENT_SIZE);
		self.limit += n;
	}

	/// Retracts `limit` by `n`, discarding the last `n` written bytes.
	pub fn shrink_tail(&mut self, n: usize) {
		debug_assert!(n <= self.len());
		self.limit -= n;
	}

	/// Returns a full copy-on-write share of this segment: same page, same
	/// `[pos, limit)`, not an owner. Marks `self` as shared.
	pub fn share_all(&mut self) -> Self {
		self.shared = true;
		self.alias()
	}

	/// Returns a read-only alias of this segment's current `[pos, limit)`
	/// window without marking `self` as shared. Used by immutable value
	/// types (e.g. [`SegmentedByteString`](crate::byte_str::SegmentedByteString))
	/// that already own a non-mutating reference to the page.
	pub fn alias(&self) -> Self {
		Self::with_page(Rc::clone(&self.page), self.pos, self.limit, false, true)
	}

	/// Splits off the first `byte_count` readable bytes as a new segment,
	/// advancing `self.pos` past them. Shares the page when `byte_count` is at
	/// least [`SHARE_MINIMUM`], otherwise copies into a fresh private segment.
	pub fn share_prefix(&mut self, byte_count: usize) -> Self {
		self.share_prefix_above(byte_count, SHARE_MINIMUM)
	}

	/// As [`share_prefix`](Self::share_prefix), but shares the page once
	/// `byte_count` reaches `threshold` rather than the fixed [`SHARE_MINIMUM`].
	/// Lets callers honor a [`BufferOptions`](crate::BufferOptions) share
	/// threshold instead of the default.
	pub fn share_prefix_above(&mut self, byte_count: usize, threshold: usize) -> Self {
		debug_assert!(byte_count <= self.len());
		if byte_count >= threshold {
			self.shared = true;
			let prefix = Self::with_page(
				Rc::clone(&self.page),
				self.pos,
				self.pos + byte_count,
				false,
				true,
			);
			self.pos += byte_count;
			prefix
		} else {
			let mut copy = Self::fresh();
			self.with_data(|data| {
				copy.push_slice(&data[..byte_count]);
			});
			self.pos += byte_count;
			copy
		}
	}

	/// Clears the segment back to empty, forking off the page first if it is
	/// shared (so other holders are unaffected) and marking it owned again.
	pub(crate) fn reset(&mut self) {
		if Rc::strong_count(&self.page) > 1 {
			self.page = fresh_page();
		}
		self.pos = 0;
		self.limit = 0;
		self.owner = true;
		self.shared = false;
	}

	/// Returns the underlying page handle, for pool recycling.
	pub(crate) fn into_page(self) -> Page { self.page }

	/// Moves as many bytes as fit from `self` into the tail of `other`,
	/// returning the count moved. Used to coalesce adjacent segments.
	pub(crate) fn move_into(&mut self, other: &mut Segment) -> usize {
		let n = self.len().min(other.writable());
		if n == 0 { return 0 }
		let bytes = self.with_data(|data| data[..n].to_vec());
		other.push_slice(&bytes);
		self.pos += n;
		n
	}
}

/// A bounded free list recycling [`Segment`] pages to avoid zero-fill and
/// allocator churn. Thread-safety for the process-wide pool is achieved by
/// sharding one instance per thread (see [`take`]/[`recycle`]), which is
/// conforming as long as `max_size` is observed per shard (§5).
pub struct SegmentPool {
	free: Vec<Page>,
	max_size: usize,
}

impl SegmentPool {
	fn new(max_size: usize) -> Self {
		Self { free: Vec::new(), max_size }
	}

	/// Returns a fresh owner segment, `pos = limit = 0`, `shared = false`,
	/// reusing a recycled page if one is available.
	pub fn take(&mut self) -> Segment {
		match self.free.pop() {
			Some(page) => Segment::reuse(page),
			None => Segment::fresh(),
		}
	}

	/// Accepts an owner, unshared segment back into the pool; silently drops
	/// it (and any other segment) when the pool is at capacity or the segment
	/// isn't eligible.
	pub fn recycle(&mut self, segment: Segment) {
		if !segment.owner || Rc::strong_count(&segment.page) > 1 {
			return;
		}
		if self.free.len() * SEGMENT_SIZE >= self.max_size {
			return;
		}
		self.free.push(segment.into_page());
	}

	/// The default pool capacity: 64 KiB, eight segments.
	pub const DEFAULT_MAX_SIZE: usize = 64 * 1024;

	/// Rebounds the pool's capacity, dropping excess free pages immediately.
	pub fn set_max_size(&mut self, max_size: usize) {
		self.max_size = max_size;
		while self.free.len() * SEGMENT_SIZE > self.max_size {
			self.free.pop();
		}
	}
}

impl Default for SegmentPool {
	fn default() -> Self { Self::new(Self::DEFAULT_MAX_SIZE) }
}

thread_local! {
	static POOL: RefCell<SegmentPool> = RefCell::new(SegmentPool::default());
}

/// Claims a fresh owner segment from the process-wide (thread-sharded) pool.
pub fn take() -> Segment {
	POOL.with(|pool| pool.borrow_mut().take())
}

/// Returns a segment's page to the process-wide (thread-sharded) pool, if
/// eligible.
pub fn recycle(segment: Segment) {
	POOL.with(|pool| pool.borrow_mut().recycle(segment));
}

/// Rebounds the calling thread's pool shard to `max_size` bytes, per
/// [`BufferOptions::pool_max_size`](crate::BufferOptions).
pub fn set_pool_max_size(max_size: usize) {
	POOL.with(|pool| pool.borrow_mut().set_max_size(max_size));
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn fresh_segment_is_empty() {
		let seg = Segment::fresh();
		assert_eq!(seg.len(), 0);
		assert_eq!(seg.writable(), SEGMENT_SIZE);
		assert!(seg.owner());
		assert!(!seg.shared());
	}

	#[test]
	fn push_and_pop_roundtrip() {
		let mut seg = Segment::fresh();
		assert_eq!(seg.push_slice(b"hello"), 5);
		assert_eq!(seg.len(), 5);
		let mut buf = [0; 5];
		assert_eq!(seg.pop_into_slice(&mut buf), 5);
		assert_eq!(&buf, b"hello");
		assert!(seg.is_empty());
	}

	#[test]
	fn share_prefix_below_minimum_copies() {
		let mut seg = Segment::fresh();
		seg.push_slice(b"short");
		let prefix = seg.share_prefix(3);
		assert_eq!(prefix.len(), 3);
		assert!(!prefix.shared());
		assert_eq!(seg.len(), 2);
	}

	#[test]
	fn share_prefix_at_minimum_shares_page() {
		let mut seg = Segment::fresh();
		let data = vec![7u8; SHARE_MINIMUM + 10];
		seg.push_slice(&data);
		let prefix = seg.share_prefix(SHARE_MINIMUM);
		assert_eq!(prefix.len(), SHARE_MINIMUM);
		assert!(prefix.shared());
		assert!(seg.shared());
		assert_eq!(seg.len(), 10);
	}

	#[test]
	fn pool_recycles_owner_unshared_segments() {
		let mut pool = SegmentPool::new(SEGMENT_SIZE);
		let seg = pool.take();
		pool.recycle(seg);
		assert_eq!(pool.free.len(), 1);
		let _reused = pool.take();
		assert_eq!(pool.free.len(), 0);
	}

	#[test]
	fn pool_drops_shared_segments() {
		let mut pool = SegmentPool::new(SEGMENT_SIZE * 2);
		let mut seg = pool.take();
		let _alias = seg.share_all();
		pool.recycle(seg);
		assert_eq!(pool.free.len(), 0);
	}

	#[test]
	fn pool_is_bounded() {
		let mut pool = SegmentPool::new(SEGMENT_SIZE);
		pool.recycle(pool.take());
		pool.recycle(Segment::fresh());
		assert_eq!(pool.free.len(), 1);
	}
}
