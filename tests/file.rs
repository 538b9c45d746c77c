// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use corio::{FileSystem, LocalFileSystem, Path, Result};

fn path(p: &std::path::Path) -> Path {
	Path::from(p.to_str().expect("tempdir paths are UTF-8 on test platforms"))
}

#[test]
fn create_directories_is_idempotent() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let nested = path(dir.path()).div(&Path::new("a/b/c"));

	fs.create_directories(&nested).unwrap();
	// Calling again on an existing directory tree must not error.
	fs.create_directories(&nested).unwrap();

	assert!(fs.metadata(&nested).unwrap().is_directory);
}

#[test]
fn open_read_write_must_create_fails_on_existing_file() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let file = path(dir.path()).div(&Path::new("exists.txt"));
	std::fs::write(dir.path().join("exists.txt"), b"x").unwrap();

	assert!(fs.open_read_write(&file, true, false).is_err());
	assert!(fs.open_read_write(&file, false, true).is_ok());
}

#[test]
fn open_read_write_must_exist_fails_when_missing() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let missing = path(dir.path()).div(&Path::new("missing.txt"));

	assert!(fs.open_read_write(&missing, false, true).is_err());
}

#[test]
fn delete_recursively_removes_nested_files_and_directories() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let root = path(dir.path());
	let sub = root.div(&Path::new("sub"));
	fs.create_directories(&sub).unwrap();
	std::fs::write(dir.path().join("sub/leaf.txt"), b"leaf").unwrap();
	std::fs::write(dir.path().join("top.txt"), b"top").unwrap();

	fs.delete_recursively(&root).unwrap();

	assert!(!fs.exists(&root).unwrap());
}

#[test]
fn delete_recursively_on_missing_path_is_not_an_error() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let missing = path(dir.path()).div(&Path::new("nope"));

	fs.delete_recursively(&missing).unwrap();
}

#[cfg(unix)]
#[test]
fn list_recursively_stops_at_a_symlink_cycle() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let root = path(dir.path());
	let sub = root.div(&Path::new("sub"));
	fs.create_directories(&sub).unwrap();

	let cycle = sub.div(&Path::new("back_to_root"));
	fs.create_symlink(&root, &cycle).unwrap();

	let visited: Vec<Path> = fs.list_recursively(&root, true)
		.collect::<Result<_>>()
		.unwrap();

	// The walk terminates (the test itself would hang otherwise) and visits
	// the cycle's entry point exactly once.
	let cycle_hits = visited.iter().filter(|p| **p == cycle).count();
	assert_eq!(cycle_hits, 1);
}

#[test]
fn metadata_or_null_is_none_for_missing_path() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	let missing = path(dir.path()).div(&Path::new("nope.txt"));

	assert!(fs.metadata_or_null(&missing).unwrap().is_none());
}

#[test]
fn canonicalize_resolves_to_an_absolute_path() {
	let dir = tempdir().unwrap();
	let fs = LocalFileSystem;
	std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
	let relative = path(dir.path()).div(&Path::new("a.txt"));

	let canonical = fs.canonicalize(&relative).unwrap();
	assert!(canonical.is_absolute());
}
