// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ## How it works
//!
//! Data is written to and read from reusable bits of memory called *segments*.
//! When a segment is consumed, it's returned to a thread-local *pool* backed by
//! a `RefCell`; to write data, segments are claimed from this pool, and when the
//! pool is exhausted, new segments are allocated up to [`SegmentPool`]'s
//! configured `max_size` (reconfigurable per [`Buffer`] via
//! [`BufferOptions::pool_max_size`]).
//!
//! ### Segments
//!
//! Segments are reusable chunks of memory arranged in a ring buffer. Memory within
//! segments can either be owned by or shared between segments, avoiding expensive
//! mem-copy operations as much as possible. Shared memory is copy-on-write; it can
//! be read by multiple segments, only copying when written. Data under
//! [`BufferOptions::share_threshold`] (1024 bytes, [`SHARE_MINIMUM`], by default)
//! is copied rather than shared, as a tradeoff between allocation and copy cost.
//!
//! The ring buffer behaves as a continuous byte deque. Bytes are read from one end
//! and written to the other, claiming new segments from the pool as it fills. Data
//! can have gaps where some segments are not filled or partially read, called *voids*.
//! Compacting these on every write could be costly, but keeping them is less space
//! efficient which would lead to more allocations. Once the total void size reaches
//! [`BufferOptions::compact_threshold`] (half a segment by default), all segments
//! are compacted; this can also be triggered manually via `Buffer::compact`/
//! `compact_all`.
//!
//! Segments can be allocated when: 1) a buffer requests one but the pool has none
//! left, or 2) a shared segment is created then written to.

mod buffer;
mod buffered_wrappers;
mod error;
pub mod streams;
mod segment;
pub mod codec;
pub mod pattern;
pub mod path;
pub mod file;
mod util;
mod byte_str;

pub use error::*;
pub use buffer::*;
pub use buffered_wrappers::{buffer_source, buffer_sink, BufferedSource, BufferedSink, PeekSource, Blackhole};
pub use segment::{Segment, SegmentPool, SEGMENT_SIZE, SHARE_MINIMUM};
pub use byte_str::*;
pub use pattern::{Options, TypedOptions};
pub use path::Path;
pub use file::{FileHandle, FileMetadata, FileSystem, FileSourceCursor, FileSinkCursor, LocalFileSystem, RecursiveListing};
