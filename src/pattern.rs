// SPDX-License-Identifier: Apache-2.0

//! An immutable prefix-matching trie over a list of byte-strings, used by
//! [`BufferedSource::select`](crate::BufferedSource::select) to pick between
//! several candidate byte-strings without scanning each one independently.
//!
//! One common encoding of this structure is a flat `int[]` with negative
//! values overloaded as next-node offsets. This module instead uses a small
//! strong-typed `Node` enum — easier to verify while preserving the same
//! prefix-index semantics, and closer in spirit to this crate's single-match
//! `Node`/`Step` pairing than a generic multi-pattern dispatcher.

use crate::byte_str::ByteString;
use crate::error::{Error, Result};

/// One step out of a trie node: either a caller-supplied result (the match
/// is complete) or a continuation into another node.
#[derive(Copy, Clone, Debug)]
enum Step {
	Result(usize),
	Node(usize),
}

#[derive(Debug)]
enum Node {
	/// All candidates reaching this point agree on the next `bytes.len()`
	/// bytes; `next` is taken once they've all been matched.
	Scan {
		prefix_index: Option<usize>,
		bytes: Vec<u8>,
		next: Step,
	},
	/// Candidates diverge on the very next byte; `bytes` is sorted and
	/// parallel to `steps`.
	Select {
		prefix_index: Option<usize>,
		bytes: Vec<u8>,
		steps: Vec<Step>,
	},
}

impl Node {
	fn prefix_index(&self) -> Option<usize> {
		match self {
			Node::Scan { prefix_index, .. } | Node::Select { prefix_index, .. } => *prefix_index,
		}
	}
}

/// The result of walking the trie against a buffer's head.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Selection {
	/// The caller's original index of the matched option.
	Match(usize),
	/// Definitive mismatch: no option is, or can become, a prefix of the
	/// scanned bytes.
	NoMatch,
	/// The scanned bytes are a prefix of at least one option, but ran out
	/// before a decision could be made. Only returned when the caller opts
	/// into truncation reporting.
	Truncated,
}

/// An immutable prefix-matching trie built from a list of byte-strings.
/// Construction sorts lexicographically, rejects an empty option, and
/// fails on a duplicate.
#[derive(Debug)]
pub struct Options {
	root: usize,
	nodes: Vec<Node>,
	lengths: Vec<usize>,
}

impl Options {
	/// Builds a trie over `candidates`, which are indexed in the order
	/// given — the index returned by [`select_prefix`](Self::select_prefix)
	/// refers back to this order, not the sorted one.
	pub fn new(candidates: &[ByteString]) -> Result<Self> {
		if candidates.is_empty() {
			return Err(Error::illegal_argument("options list must not be empty"));
		}

		let mut entries: Vec<(usize, Vec<u8>)> = candidates
			.iter()
			.enumerate()
			.map(|(i, s)| (i, s.as_slice().to_vec()))
			.collect();
		entries.sort_by(|a, b| a.1.cmp(&b.1));

		if entries.iter().any(|(_, bytes)| bytes.is_empty()) {
			return Err(Error::illegal_argument("options entries must be non-empty"));
		}
		for pair in entries.windows(2) {
			if pair[0].1 == pair[1].1 {
				return Err(Error::illegal_argument("duplicate options entry"));
			}
		}

		let mut lengths = vec![0; candidates.len()];
		for (i, bytes) in &entries {
			lengths[*i] = bytes.len();
		}

		let mut nodes = Vec::new();
		let refs: Vec<&(usize, Vec<u8>)> = entries.iter().collect();
		let root = build_node(&mut nodes, &refs, 0);
		Ok(Self { root, nodes, lengths })
	}

	/// The byte length of the candidate at `index`, in the caller's
	/// original ordering — the number of bytes a [`Selection::Match(index)`]
	/// consumed.
	pub fn len_of(&self, index: usize) -> usize { self.lengths[index] }

	/// Walks the trie against `data`, tracking the *smallest original index*
	/// among all candidates that complete along the path so far — not the
	/// deepest one. Per §4.6/§8 scenario 3, when several listed options are
	/// each a prefix of the input (e.g. `"ab"`, `"abc"`, and `"abcd"` all
	/// prefix `"abcd"`), the one that was first in the caller's original
	/// list wins, regardless of length: `Options::new(["abc", "abcd",
	/// "ab"])` matched against `"abcd"` returns `"abc"` (index 0), not the
	/// longer `"abcd"` (index 1).
	///
	/// Returns [`Selection::Truncated`] only when `allow_truncated` is set
	/// and the scanned bytes run out mid-node; callers that can't pull more
	/// data should re-invoke with `allow_truncated = false` to force a final
	/// decision between the best prefix match so far and [`Selection::NoMatch`].
	pub fn select_prefix(&self, data: &[u8], allow_truncated: bool) -> Selection {
		let mut node_idx = self.root;
		let mut pos = 0;
		let mut best: Option<usize> = None;

		let mut record = |best: &mut Option<usize>, i: usize| {
			*best = Some(best.map_or(i, |b| b.min(i)));
		};

		loop {
			let node = &self.nodes[node_idx];
			if let Some(i) = node.prefix_index() {
				record(&mut best, i);
			}

			match node {
				Node::Scan { bytes, next, .. } => {
					for &b in bytes {
						if pos >= data.len() {
							return Self::exhausted(best, allow_truncated);
						}
						if data[pos] != b {
							return best.map(Selection::Match).unwrap_or(Selection::NoMatch);
						}
						pos += 1;
					}
					match *next {
						Step::Result(r) => {
							record(&mut best, r);
							return Selection::Match(best.unwrap());
						}
						Step::Node(n) => node_idx = n,
					}
				}
				Node::Select { bytes, steps, .. } => {
					if pos >= data.len() {
						return Self::exhausted(best, allow_truncated);
					}
					match bytes.binary_search(&data[pos]) {
						Ok(i) => {
							pos += 1;
							match steps[i] {
								Step::Result(r) => {
									record(&mut best, r);
									return Selection::Match(best.unwrap());
								}
								Step::Node(n) => node_idx = n,
							}
						}
						Err(_) => return best.map(Selection::Match).unwrap_or(Selection::NoMatch),
					}
				}
			}
		}
	}

	fn exhausted(best: Option<usize>, allow_truncated: bool) -> Selection {
		if allow_truncated {
			Selection::Truncated
		} else {
			best.map(Selection::Match).unwrap_or(Selection::NoMatch)
		}
	}
}

fn resolve_step(nodes: &mut Vec<Node>, group: Vec<&(usize, Vec<u8>)>, depth: usize) -> Step {
	if group.len() == 1 && group[0].1.len() == depth {
		Step::Result(group[0].0)
	} else {
		Step::Node(build_node(nodes, &group, depth))
	}
}

/// Builds one node covering `group` (sorted, all entries have `bytes.len()
/// >= depth`), recursively building its descendants, and returns its index
/// in `nodes`.
fn build_node(nodes: &mut Vec<Node>, group: &[&(usize, Vec<u8>)], depth: usize) -> usize {
	let mut prefix_index = None;
	let mut rest = Vec::with_capacity(group.len());
	for &entry in group {
		if entry.1.len() == depth {
			prefix_index = Some(entry.0);
		} else {
			rest.push(entry);
		}
	}

	// Extend the scan as far as every remaining candidate agrees on the next
	// byte, stopping before any depth at which one of them terminates (that
	// depth needs its own node so it can carry a prefix_index).
	let mut scan_len = 0;
	loop {
		let d = depth + scan_len;
		if rest.iter().any(|e| e.1.len() == d) { break }
		let Some(&first) = rest.first() else { break };
		let b0 = first.1[d];
		if rest.iter().all(|e| e.1[d] == b0) {
			scan_len += 1;
		} else {
			break;
		}
	}

	if scan_len > 0 {
		let bytes = (0..scan_len).map(|i| rest[0].1[depth + i]).collect();
		let next = resolve_step(nodes, rest, depth + scan_len);
		nodes.push(Node::Scan { prefix_index, bytes, next });
	} else {
		use std::collections::BTreeMap;
		let mut groups: BTreeMap<u8, Vec<&(usize, Vec<u8>)>> = BTreeMap::new();
		for entry in rest {
			groups.entry(entry.1[depth]).or_default().push(entry);
		}
		let mut bytes = Vec::with_capacity(groups.len());
		let mut steps = Vec::with_capacity(groups.len());
		for (b, grp) in groups {
			bytes.push(b);
			steps.push(resolve_step(nodes, grp, depth + 1));
		}
		nodes.push(Node::Select { prefix_index, bytes, steps });
	}
	nodes.len() - 1
}

/// An [`Options`] trie paired with a caller value per entry, so a match can
/// hand back a typed value instead of a bare index.
pub struct TypedOptions<T> {
	options: Options,
	values: Vec<T>,
}

impl<T> TypedOptions<T> {
	pub fn new(entries: Vec<(ByteString, T)>) -> Result<Self> {
		let (candidates, values): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
		let options = Options::new(&candidates)?;
		Ok(Self { options, values })
	}

	pub fn options(&self) -> &Options { &self.options }

	pub fn value(&self, index: usize) -> &T { &self.values[index] }
}

#[cfg(test)]
mod test {
	use super::*;

	fn opts(strs: &[&str]) -> Options {
		let candidates: Vec<ByteString> = strs.iter().map(|s| ByteString::from(*s)).collect();
		Options::new(&candidates).unwrap()
	}

	#[test]
	fn selects_longest_completing_prefix_in_input_order() {
		// "abc" is first in input order and completes against "abcd".
		let options = opts(&["abc", "abcd", "ab"]);
		assert_eq!(options.select_prefix(b"abcd", false), Selection::Match(0));
	}

	#[test]
	fn falls_back_to_shorter_prefix_on_mismatch() {
		let options = opts(&["abc", "ab"]);
		assert_eq!(options.select_prefix(b"abx", false), Selection::Match(1));
	}

	#[test]
	fn reports_no_match() {
		let options = opts(&["abc", "xyz"]);
		assert_eq!(options.select_prefix(b"qqq", false), Selection::NoMatch);
	}

	#[test]
	fn reports_truncation_when_requested() {
		let options = opts(&["abc"]);
		assert_eq!(options.select_prefix(b"ab", true), Selection::Truncated);
		assert_eq!(options.select_prefix(b"ab", false), Selection::NoMatch);
	}

	#[test]
	fn rejects_empty_option() {
		let candidates = vec![ByteString::from("")];
		assert!(Options::new(&candidates).is_err());
	}

	#[test]
	fn rejects_duplicate_option() {
		let candidates = vec![ByteString::from("a"), ByteString::from("a")];
		assert!(Options::new(&candidates).is_err());
	}
}
