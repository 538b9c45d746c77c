// SPDX-License-Identifier: Apache-2.0

//! Text and binary codecs layered on top of [`ByteString`](crate::ByteString)
//! and [`Buffer`](crate::Buffer): UTF-8 with strict replacement semantics,
//! and unwrapped Base64 / lowercase hex.
//!
//! These are free functions rather than an `Encode`/`Decode` trait pair:
//! each one operates directly on byte slices, leaving buffering and
//! incremental decoding to the stream layer.

pub mod base64;
pub mod hex;
pub mod utf8;
