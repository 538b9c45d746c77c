// SPDX-License-Identifier: Apache-2.0

use crate::segment::{SEGMENT_SIZE, SHARE_MINIMUM, SegmentPool};

/// Options for tuning [`Buffer`](super::Buffer)'s behavior and performance.
///
/// # Share threshold
///
/// The minimum size for segment data to be shared rather than copied into
/// another segment. Defaults to [`SHARE_MINIMUM`], one eighth the segment
/// size. With a value more than the segment size, segments are never shared.
///
/// # Compact threshold
///
/// The total size of fragmentation (gaps left by partially read or written
/// segments) that triggers compacting. Defaults to half the segment size.
/// With a value of `0`, the buffer always compacts.
///
/// # Snapshot threshold
///
/// The minimum byte count at which [`snapshot`](super::Buffer::snapshot)
/// prefers a segmented byte-string (sharing pages) over copying into a
/// contiguous one. Open Question 1 leaves this implementation-defined; this
/// crate defaults it to one segment.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct BufferOptions {
	pub share_threshold: usize,
	pub compact_threshold: usize,
	pub snapshot_threshold: usize,
	pub pool_max_size: usize,
}

impl Default for BufferOptions {
	fn default() -> Self {
		Self {
			share_threshold: SHARE_MINIMUM,
			compact_threshold: SEGMENT_SIZE / 2,
			snapshot_threshold: SEGMENT_SIZE / 2,
			pool_max_size: SegmentPool::DEFAULT_MAX_SIZE,
		}
	}
}

impl BufferOptions {
	/// Presets the options to create a "lean" buffer: one that always shares
	/// and compacts, trading allocation cost for lower peak memory.
	pub fn lean() -> Self {
		Self {
			share_threshold: 0,
			compact_threshold: 0,
			..Self::default()
		}
	}

	pub fn share_threshold(&self) -> usize { self.share_threshold }
	pub fn compact_threshold(&self) -> usize { self.compact_threshold }
	pub fn snapshot_threshold(&self) -> usize { self.snapshot_threshold }
	pub fn pool_max_size(&self) -> usize { self.pool_max_size }

	pub fn set_share_threshold(mut self, value: usize) -> Self {
		self.share_threshold = value;
		self
	}

	pub fn set_compact_threshold(mut self, value: usize) -> Self {
		self.compact_threshold = value;
		self
	}

	pub fn set_snapshot_threshold(mut self, value: usize) -> Self {
		self.snapshot_threshold = value;
		self
	}

	/// Rebounds the pool `Buffer::new` reconfigures on construction (§5).
	pub fn set_pool_max_size(mut self, value: usize) -> Self {
		self.pool_max_size = value;
		self
	}
}
