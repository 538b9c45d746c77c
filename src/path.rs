// SPDX-License-Identifier: Apache-2.0

//! Hierarchical path identifiers (§3, §4.7): an immutable, byte-string-backed
//! path with cross-platform separator detection and `.`/`..` normalization.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use crate::{ByteString, Error, Result};

/// The separator a [`Path`] was parsed with, or serializes with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Slash {
	/// `/`
	Unix,
	/// `\`
	Windows,
}

impl Slash {
	fn byte(self) -> u8 {
		match self {
			Slash::Unix => b'/',
			Slash::Windows => b'\\',
		}
	}

	/// The slash used when none can be detected in the input: `\` on
	/// Windows, `/` everywhere else.
	pub fn platform_default() -> Self {
		if cfg!(windows) { Slash::Windows } else { Slash::Unix }
	}
}

fn is_separator(b: u8) -> bool { b == b'/' || b == b'\\' }

/// Scans for the first separator byte, falling back to the platform default.
fn detect_slash(input: &[u8]) -> Slash {
	for &b in input {
		match b {
			b'/' => return Slash::Unix,
			b'\\' => return Slash::Windows,
			_ => {}
		}
	}
	Slash::platform_default()
}

/// An immutable, hierarchical, byte-string-backed path identifier (§3).
///
/// Equality, ordering, and hashing compare the canonical serialized form
/// (`repr`): two paths that normalize to the same bytes are equal even if
/// parsed from differently-separated input.
#[derive(Clone)]
pub struct Path {
	repr: ByteString,
	slash: Slash,
	/// Length, in bytes, of everything before the first segment: the root
	/// (if absolute) and/or a volume letter + `:` (if present).
	prefix_len: usize,
	is_absolute: bool,
	volume: Option<u8>,
	segments: Vec<ByteString>,
}

impl Path {
	/// Parses `input`, auto-detecting the separator from its first `/` or
	/// `\` byte (falling back to the platform default), without collapsing
	/// `.`/`..` segments.
	pub fn new(input: impl AsRef<[u8]>) -> Self {
		Self::parse(input, false)
	}

	/// Parses `input`, auto-detecting the separator, optionally collapsing
	/// `.` and resolvable `..` segments (§4.7).
	pub fn parse(input: impl AsRef<[u8]>, normalize: bool) -> Self {
		Self::parse_with_slash(input, None, normalize)
	}

	/// Parses `input` with an explicit separator override instead of
	/// auto-detection.
	pub fn parse_with_slash(input: impl AsRef<[u8]>, slash: Option<Slash>, normalize: bool) -> Self {
		let input = input.as_ref();
		let slash = slash.unwrap_or_else(|| detect_slash(input));

		let mut pos = 0;
		let mut volume = None;
		let mut is_absolute = false;
		let mut prefix = Vec::new();

		if slash == Slash::Windows
			&& input.len() >= 2
			&& input[0].is_ascii_alphabetic()
			&& input[1] == b':'
		{
			volume = Some(input[0].to_ascii_uppercase());
			prefix.push(input[0]);
			prefix.push(b':');
			pos = 2;
			if pos < input.len() && is_separator(input[pos]) {
				prefix.push(slash.byte());
				pos += 1;
				is_absolute = true;
			}
		} else {
			let start = pos;
			while pos < input.len() && is_separator(input[pos]) { pos += 1; }
			let leading = pos - start;
			if leading >= 2 && slash == Slash::Windows {
				// UNC root: "\\host".
				prefix.push(slash.byte());
				prefix.push(slash.byte());
				is_absolute = true;
				let host_start = pos;
				while pos < input.len() && !is_separator(input[pos]) { pos += 1; }
				prefix.extend_from_slice(&input[host_start..pos]);
			} else if leading >= 1 {
				prefix.push(slash.byte());
				is_absolute = true;
			}
		}

		let mut segments = Vec::new();
		for raw in input[pos..].split(|&b| is_separator(b)) {
			if raw.is_empty() || raw == b"." { continue }
			if raw == b".." {
				if normalize {
					match segments.last() {
						Some(last) if !is_dotdot(last) => { segments.pop(); }
						_ => if !is_absolute { segments.push(ByteString::from(&b".."[..])) },
					}
				} else {
					segments.push(ByteString::from(&b".."[..]));
				}
				continue;
			}
			segments.push(ByteString::from(raw));
		}

		Self::assemble(slash, prefix, is_absolute, volume, segments)
	}

	fn assemble(
		slash: Slash,
		prefix: Vec<u8>,
		is_absolute: bool,
		volume: Option<u8>,
		segments: Vec<ByteString>,
	) -> Self {
		let prefix_len = prefix.len();
		let mut repr = prefix;
		if repr.is_empty() && segments.is_empty() {
			repr.push(b'.');
		} else {
			let needs_sep_before_first = !repr.is_empty()
				&& *repr.last().unwrap() != slash.byte()
				&& *repr.last().unwrap() != b':';
			for (i, seg) in segments.iter().enumerate() {
				if i > 0 || needs_sep_before_first {
					repr.push(slash.byte());
				}
				repr.extend_from_slice(seg.as_slice());
			}
		}
		Self { repr: ByteString::from(repr), slash, prefix_len, is_absolute, volume, segments }
	}

	/// The separator this path was parsed/serializes with.
	pub fn slash(&self) -> Slash { self.slash }

	/// The canonical serialized byte-string.
	pub fn as_byte_string(&self) -> &ByteString { &self.repr }

	/// The canonical serialized bytes.
	pub fn as_bytes(&self) -> &[u8] { self.repr.as_slice() }

	/// `true` if this path has a root (a UNIX `/`, a Windows `\`/`\\host`,
	/// or a Windows `X:\`). A volume-relative path like `C:foo` is not
	/// absolute even though it carries a volume letter.
	pub fn is_absolute(&self) -> bool { self.is_absolute }

	/// `true` if this path is exactly a root, with no further segments.
	pub fn is_root(&self) -> bool { self.is_absolute && self.segments.is_empty() }

	/// `true` if this is the relative identity path `.`.
	pub fn is_identity(&self) -> bool {
		!self.is_absolute && self.volume.is_none() && self.segments.is_empty()
	}

	/// The Windows drive letter, if any, uppercased.
	pub fn volume_letter(&self) -> Option<char> { self.volume.map(|b| b as char) }

	/// The root prefix (e.g. `/`, `\\host`, `C:\`), if this path is absolute.
	pub fn root(&self) -> Option<ByteString> {
		self.is_absolute.then(|| ByteString::from(&self.repr.as_slice()[..self.prefix_len]))
	}

	/// The path's segments, root/volume excluded.
	pub fn segments(&self) -> &[ByteString] { &self.segments }

	/// The path's segments as raw byte slices.
	pub fn segments_bytes(&self) -> Vec<&[u8]> {
		self.segments.iter().map(ByteString::as_slice).collect()
	}

	/// The last segment's bytes, as a [`ByteString`]. Empty for roots, the
	/// identity path, and volume-relative paths with no segments (`C:`).
	pub fn name(&self) -> ByteString {
		self.segments.last().cloned().unwrap_or_else(ByteString::empty)
	}

	/// The last segment's raw bytes.
	pub fn name_bytes(&self) -> &[u8] {
		self.segments.last().map(ByteString::as_slice).unwrap_or(&[])
	}

	/// This path's parent, or `None` for terminals: `/`, `.`, `C:\`,
	/// `\\host`, `C:`, and any path ending in an unresolved `..`.
	pub fn parent(&self) -> Option<Path> {
		let last = self.segments.last()?;
		if is_dotdot(last) { return None }
		let prefix = self.repr.as_slice()[..self.prefix_len].to_vec();
		let segments = self.segments[..self.segments.len() - 1].to_vec();
		Some(Self::assemble(self.slash, prefix, self.is_absolute, self.volume, segments))
	}

	/// Re-collapses `.`/resolvable `..` segments (idempotent once applied).
	pub fn normalized(&self) -> Path {
		let mut out: Vec<ByteString> = Vec::with_capacity(self.segments.len());
		for seg in &self.segments {
			if is_dotdot(seg) {
				match out.last() {
					Some(last) if !is_dotdot(last) => { out.pop(); }
					_ => if !self.is_absolute { out.push(seg.clone()) },
				}
			} else {
				out.push(seg.clone());
			}
		}
		let prefix = self.repr.as_slice()[..self.prefix_len].to_vec();
		Self::assemble(self.slash, prefix, self.is_absolute, self.volume, out)
	}

	/// Joins `child` onto `self` without normalizing, short-circuiting to
	/// `child` unchanged if it is itself absolute.
	pub fn div(&self, child: &Path) -> Path { self.resolve(child, false) }

	/// Joins `child` onto `self`, as [`div`](Self::div), then optionally
	/// normalizes the result. A `child` that is either absolute or carries
	/// its own volume letter (even a volume-relative one, e.g. `C:foo`) is
	/// returned as-is (normalized if requested): a volume designation roots
	/// a path in a different namespace than `self`'s, so joining onto it
	/// would never be meaningful.
	pub fn resolve(&self, child: &Path, normalize: bool) -> Path {
		if child.is_absolute || child.volume.is_some() {
			return if normalize { child.normalized() } else { child.clone() };
		}
		let self_bytes = self.repr.as_slice();
		let mut combined = if self.is_identity() { Vec::new() } else { self_bytes.to_vec() };
		if let Some(&last) = combined.last() {
			if !is_separator(last) && last != b':' {
				combined.push(self.slash.byte());
			}
		}
		combined.extend_from_slice(child.repr.as_slice());
		Path::parse(combined, normalize)
	}

	/// The relative path from `other` to `self`: walks past their common
	/// prefix, emits one `..` per remaining `other` segment, then the
	/// remaining `self` segments. Fails if the roots differ or if `other`'s
	/// differing tail itself contains an unresolvable `..`.
	pub fn relative_to(&self, other: &Path) -> Result<Path> {
		let self_root = &self.repr.as_slice()[..self.prefix_len];
		let other_root = &other.repr.as_slice()[..other.prefix_len];
		if self.is_absolute != other.is_absolute || self_root != other_root {
			return Err(Error::illegal_argument("paths do not share a common root"));
		}

		let common = self.segments.iter().zip(other.segments.iter())
			.take_while(|(a, b)| a.as_slice() == b.as_slice())
			.count();
		let other_tail = &other.segments[common..];
		if other_tail.iter().any(is_dotdot) {
			return Err(Error::illegal_argument("other path has an unresolvable .. past the common prefix"));
		}

		let mut segments = Vec::with_capacity(other_tail.len() + self.segments.len() - common);
		segments.extend(std::iter::repeat_with(|| ByteString::from(&b".."[..])).take(other_tail.len()));
		segments.extend(self.segments[common..].iter().cloned());
		Ok(Self::assemble(self.slash, Vec::new(), false, None, segments))
	}
}

fn is_dotdot(s: &ByteString) -> bool { s.as_slice() == b".." }

impl PartialEq for Path {
	fn eq(&self, other: &Self) -> bool { self.repr == other.repr }
}

impl Eq for Path { }

impl Hash for Path {
	fn hash<H: Hasher>(&self, state: &mut H) { self.repr.hash(state) }
}

impl PartialOrd for Path {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Path {
	fn cmp(&self, other: &Self) -> Ordering { self.repr.cmp(&other.repr) }
}

impl Display for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match simdutf8::basic::from_utf8(self.repr.as_slice()) {
			Ok(s) => write!(f, "{s}"),
			Err(_) => write!(f, "{}", self.repr.hex()),
		}
	}
}

impl Debug for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Path").field(&self.repr).finish()
	}
}

impl From<&str> for Path {
	fn from(s: &str) -> Self { Path::new(s.as_bytes()) }
}

impl From<String> for Path {
	fn from(s: String) -> Self { Path::from(s.as_str()) }
}

impl From<&ByteString> for Path {
	fn from(s: &ByteString) -> Self { Path::new(s.as_slice()) }
}

impl std::ops::Div<&Path> for &Path {
	type Output = Path;
	fn div(self, rhs: &Path) -> Path { self.div(rhs) }
}

impl std::ops::Div<&str> for &Path {
	type Output = Path;
	fn div(self, rhs: &str) -> Path { self.div(&Path::from(rhs)) }
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parses_unix_absolute() {
		let p = Path::new("/home/jesse");
		assert!(p.is_absolute());
		assert_eq!(p.segments_bytes(), vec![b"home".as_slice(), b"jesse"]);
		assert_eq!(p.to_string(), "/home/jesse");
	}

	#[test]
	fn parses_windows_volume_root() {
		let p = Path::parse_with_slash("C:\\Users\\jesse", Some(Slash::Windows), false);
		assert!(p.is_absolute());
		assert_eq!(p.volume_letter(), Some('C'));
		assert_eq!(p.to_string(), "C:\\Users\\jesse");
	}

	#[test]
	fn volume_relative_has_no_separator_after_colon() {
		let p = Path::parse_with_slash("C:foo\\bar", Some(Slash::Windows), false);
		assert!(!p.is_absolute());
		assert_eq!(p.volume_letter(), Some('C'));
		assert_eq!(p.to_string(), "C:foo\\bar");
	}

	#[test]
	fn unc_root_protects_host() {
		let p = Path::parse_with_slash("\\\\host\\share", Some(Slash::Windows), false);
		assert!(p.is_absolute());
		assert_eq!(p.root().unwrap().as_slice(), b"\\\\host");
		assert_eq!(p.segments_bytes(), vec![b"share".as_slice()]);
	}

	#[test]
	fn empty_result_becomes_identity() {
		let p = Path::new("a/..");
		assert_eq!(p.to_string(), "a/..");
		assert_eq!(p.normalized().to_string(), ".");
	}

	#[test]
	fn dotdot_beyond_absolute_root_is_dropped() {
		let p = Path::parse("/a/../..", true);
		assert_eq!(p.to_string(), "/");
	}

	#[test]
	fn dotdot_beyond_relative_root_is_retained() {
		let p = Path::parse("a/../..", true);
		assert_eq!(p.to_string(), "..");
	}

	#[test]
	fn normalize_is_idempotent() {
		let once = Path::parse("/home/jesse/../ada//./x", true);
		let twice = Path::parse(once.to_string().as_bytes(), true);
		assert_eq!(once, twice);
	}

	#[test]
	fn div_does_not_normalize() {
		let base = Path::new("/home/jesse");
		let joined = base.div(&Path::new("../ada"));
		assert_eq!(joined.to_string(), "/home/jesse/../ada");
		assert_eq!(base.resolve(&Path::new("../ada"), true).to_string(), "/home/ada");
	}

	#[test]
	fn parent_is_none_for_terminals() {
		assert!(Path::new("/").parent().is_none());
		assert!(Path::new(".").parent().is_none());
		assert!(Path::parse_with_slash("C:\\", Some(Slash::Windows), false).parent().is_none());
		assert!(Path::parse_with_slash("\\\\host", Some(Slash::Windows), false).parent().is_none());
		assert!(Path::parse_with_slash("C:", Some(Slash::Windows), false).parent().is_none());
		assert!(Path::new("a/..").parent().is_none());
	}

	#[test]
	fn parent_div_name_round_trips() {
		let p = Path::new("/home/jesse/notes.txt");
		let parent = p.parent().unwrap();
		assert_eq!(parent.div(&Path::new(p.name().utf8())), p);
	}

	#[test]
	fn relative_to_walks_common_prefix() {
		let a = Path::new("/a/b/c");
		let b = Path::new("/a/x/y");
		let rel = a.relative_to(&b).unwrap();
		assert_eq!(rel.to_string(), "../../b/c");
	}

	#[test]
	fn relative_to_requires_shared_root() {
		let a = Path::new("/a/b");
		let b = Path::new("rel/b");
		assert!(a.relative_to(&b).is_err());
	}

	#[test]
	fn resolve_short_circuits_on_a_volume_relative_child() {
		let base = Path::new("/home/jesse");
		let child = Path::parse_with_slash("C:foo", Some(Slash::Windows), false);
		assert_eq!(base.resolve(&child, false), child);
	}

	#[test]
	fn is_root_excludes_identity_and_volume_relative() {
		assert!(Path::new("/").is_root());
		assert!(!Path::new(".").is_root());
		assert!(!Path::parse_with_slash("C:", Some(Slash::Windows), false).is_root());
		assert!(Path::parse_with_slash("C:\\", Some(Slash::Windows), false).is_root());
	}
}
