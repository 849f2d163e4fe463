#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Integration tests for `--set`, `--del` and `--merge`.
//!
//! Each test runs a full invocation against a real file in a temporary
//! directory and checks both the reported outcome and the bytes on disk.

mod common;

use common::{IniFixture, edit_error};
use iniedit_cli::error::EditError;

// ---------------------------------------------------------------------------
// --set
// ---------------------------------------------------------------------------

/// Setting the same value twice changes the file once.
#[test]
fn set_is_idempotent() {
    let ini = IniFixture::new("[s]\na = 1\n");

    let first = ini.run(&["--set", "--verbose"], &["s", "b", "2"]);
    assert!(first.stderr.starts_with("changed: --set "), "{}", first.stderr);
    first.ok();
    let after_first = ini.contents();
    insta::assert_snapshot!(&after_first, @r"
    [s]
    a = 1
    b = 2
    ");

    let second = ini.run(&["--set", "--verbose"], &["s", "b", "2"]);
    assert!(second.stderr.starts_with("unchanged: --set "), "{}", second.stderr);
    second.ok();
    assert_eq!(ini.contents(), after_first);
}

/// A value that was set reads back exactly, embedded newlines included.
#[test]
fn set_value_round_trips_through_get() {
    let ini = IniFixture::new("[s]\n");
    ini.run(&["--set"], &["s", "k", "one\ntwo"]).ok();
    assert_eq!(ini.run(&["--get"], &["s", "k"]).ok(), "one\ntwo\n");
}

/// Continuation lines that start with a comment marker belong to the value,
/// so a second identical set finds nothing to change.
#[test]
fn set_multiline_value_with_comment_markers_is_stable() {
    let ini = IniFixture::new("[s]\n");

    let first = ini.run(&["--set", "--verbose"], &["s", "k", "a\n#b\n;c"]);
    assert!(first.stderr.starts_with("changed: "), "{}", first.stderr);
    first.ok();
    assert_eq!(ini.contents(), "[s]\nk = a\n        #b\n        ;c\n");
    assert_eq!(ini.run(&["--get"], &["s", "k"]).ok(), "a\n#b\n;c\n");

    let second = ini.run(&["--set", "--verbose"], &["s", "k", "a\n#b\n;c"]);
    assert!(second.stderr.starts_with("unchanged: "), "{}", second.stderr);
    second.ok();
    assert_eq!(ini.contents(), "[s]\nk = a\n        #b\n        ;c\n");
}

/// Lines keep the terminator they were read with; new lines follow the
/// first line's.
#[test]
fn set_preserves_mixed_line_endings() {
    let ini = IniFixture::new("[s]\nk = v\r\n");

    let same = ini.run(&["--set", "--verbose"], &["s", "k", "v"]);
    assert!(same.stderr.starts_with("unchanged: "), "{}", same.stderr);
    same.ok();
    assert_eq!(ini.contents(), "[s]\nk = v\r\n");

    ini.run(&["--set"], &["s", "j", "w"]).ok();
    assert_eq!(ini.contents(), "[s]\nk = v\r\nj = w\n");
}

/// Comments, blank lines and unrelated entries survive an edit untouched.
#[test]
fn set_preserves_formatting() {
    let ini = IniFixture::new("# top\n\n[s]\nkeep=1 ; note\nx : 2\n\n[t]\ny = 3\n");
    ini.run(&["--set"], &["s", "x", "5"]).ok();
    assert_eq!(
        ini.contents(),
        "# top\n\n[s]\nkeep=1 ; note\nx : 5\n\n[t]\ny = 3\n"
    );
}

/// CRLF files stay CRLF throughout.
#[test]
fn set_preserves_crlf_line_endings() {
    let ini = IniFixture::new("[s]\r\na = 1\r\n");
    ini.run(&["--set"], &["s", "b", "2"]).ok();
    assert_eq!(ini.contents(), "[s]\r\na = 1\r\nb = 2\r\n");
}

/// A new key in a file without headers does not invent a `[DEFAULT]` header.
#[test]
fn set_sectionless_key_keeps_file_headerless() {
    let ini = IniFixture::new("a = 1\n");
    ini.run(&["--set"], &["", "b", "2"]).ok();
    assert_eq!(ini.contents(), "a = 1\nb = 2\n");
    assert_eq!(ini.run(&["--get"], &["", "b"]).ok(), "2\n");
}

/// Setting into an empty file creates the section.
#[test]
fn set_into_empty_file() {
    let ini = IniFixture::new("");
    ini.run(&["--set"], &["web", "port", "8080"]).ok();
    insta::assert_snapshot!(ini.contents(), @r"
    [web]
    port = 8080
    ");
    assert_eq!(ini.run(&["--get"], &["web", "port"]).ok(), "8080\n");
}

/// A missing file is created unless the policy requires it to exist.
#[test]
fn set_creates_missing_file() {
    let ini = IniFixture::missing();
    ini.run(&["--set"], &["s", "k", "v"]).ok();
    assert_eq!(ini.contents(), "[s]\nk = v\n");

    let strict = IniFixture::missing();
    let e = strict.run(&["--set", "--existing=file"], &["s", "k", "v"]).err();
    assert!(matches!(edit_error(&e), EditError::Io { .. }), "{e}");
    assert!(!strict.exists());
}

/// `--existing` rejects a missing key and leaves the file alone.
#[test]
fn existing_param_policy_blocks_new_key() {
    let ini = IniFixture::new("[s]\nother = 1\n");
    let e = ini.run(&["--set", "--existing"], &["s", "k", "v"]).err();
    assert!(matches!(edit_error(&e), EditError::MissingParam(_)));
    assert_eq!(e.to_string(), "Parameter not found: k");
    assert_eq!(ini.contents(), "[s]\nother = 1\n");

    ini.run(&["--set"], &["s", "k", "v"]).ok();
    assert_eq!(ini.contents(), "[s]\nother = 1\nk = v\n");
}

/// Flag keys keep their delimiter-less form until given a value.
#[test]
fn flag_key_gains_delimiter_when_set() {
    let ini = IniFixture::new("flag\n");
    assert_eq!(ini.run(&["--get", "--format=ini"], &["", "flag"]).ok(), "flag =\n");
    ini.run(&["--set"], &["", "flag", "on"]).ok();
    assert_eq!(ini.contents(), "flag = on\n");
}

/// `nospace` writes new entries without spaces around `=`.
#[test]
fn nospace_option_controls_new_entries() {
    let ini = IniFixture::new("[s]\n");
    ini.run(&["--set", "--ini-options=nospace"], &["s", "k", "v"]).ok();
    assert_eq!(ini.contents(), "[s]\nk=v\n");
}

// ---------------------------------------------------------------------------
// --list
// ---------------------------------------------------------------------------

/// Adding and removing list items, with repeats as no-ops.
#[test]
fn list_items_are_added_and_removed() {
    let ini = IniFixture::new("[s]\nk = a, b\n");

    ini.run(&["--set", "--list"], &["s", "k", "c"]).ok();
    assert_eq!(ini.contents(), "[s]\nk = a, b, c\n");

    let again = ini.run(&["--set", "--list", "-v"], &["s", "k", "c"]);
    assert!(again.stderr.starts_with("unchanged:"));
    again.ok();

    ini.run(&["--del", "--list"], &["s", "k", "b"]).ok();
    assert_eq!(ini.contents(), "[s]\nk = a, c\n");

    let missing = ini.run(&["--del", "--list", "-v"], &["s", "k", "zzz"]);
    assert!(missing.stderr.starts_with("unchanged:"));
    missing.ok();
    assert_eq!(ini.contents(), "[s]\nk = a, c\n");
}

/// A custom separator is used verbatim.
#[test]
fn list_with_custom_separator() {
    let ini = IniFixture::new("[s]\npath = /bin:/usr/bin\n");
    ini.run(&["--set", "--list", "--list-sep=:"], &["s", "path", "/opt/bin"]).ok();
    assert_eq!(ini.contents(), "[s]\npath = /bin:/usr/bin:/opt/bin\n");
}

/// An empty separator splits on whitespace and reuses the existing run.
#[test]
fn list_with_whitespace_separator() {
    let ini = IniFixture::new("[s]\nk = a  b\n");
    ini.run(&["--set", "--list", "--list-sep="], &["s", "k", "c"]).ok();
    assert_eq!(ini.contents(), "[s]\nk = a  b  c\n");
}

// ---------------------------------------------------------------------------
// --del
// ---------------------------------------------------------------------------

/// Deleting a key and then its section.
#[test]
fn delete_key_then_section() {
    let ini = IniFixture::new("[s]\na = 1\nb = 2\n[t]\nc = 3\n");
    ini.run(&["--del"], &["s", "a"]).ok();
    assert_eq!(ini.contents(), "[s]\nb = 2\n[t]\nc = 3\n");
    ini.run(&["--del"], &["s"]).ok();
    assert_eq!(ini.contents(), "[t]\nc = 3\n");
}

/// Deleting something absent succeeds unless `--existing` is given.
#[test]
fn delete_missing_respects_policy() {
    let ini = IniFixture::new("[s]\n");
    ini.run(&["--del"], &["s", "nope"]).ok();
    ini.run(&["--del"], &["gone"]).ok();

    let e = ini.run(&["--del", "--existing"], &["s", "nope"]).err();
    assert!(matches!(edit_error(&e), EditError::MissingParam(_)));
    let e = ini.run(&["--del", "--existing=section"], &["gone"]).err();
    assert!(matches!(edit_error(&e), EditError::MissingSection(_)));
    assert_eq!(ini.contents(), "[s]\n");
}

/// Deleting from a missing file is not an error and creates nothing.
#[test]
fn delete_from_missing_file() {
    let ini = IniFixture::missing();
    ini.run(&["--del"], &["s", "k"]).ok();
    assert!(!ini.exists());
}

// ---------------------------------------------------------------------------
// --merge
// ---------------------------------------------------------------------------

/// Merging adds keys to existing sections and appends new sections.
#[test]
fn merge_from_stdin() {
    let ini = IniFixture::new("[s]\na = 1\n");
    ini.run_with_stdin(&["--merge"], &[], "[s]\nb = 2\n[t]\nc = 3\n")
        .ok();
    insta::assert_snapshot!(ini.contents(), @r"
    [s]
    a = 1
    b = 2

    [t]
    c = 3
    ");
}

/// Merging into a named section flattens the input into it.
#[test]
fn merge_into_section() {
    let ini = IniFixture::new("[t]\nb = 1\n");
    ini.run_with_stdin(&["--merge"], &["t"], "[x]\nb = 2\nc = 3\n")
        .ok();
    assert_eq!(ini.contents(), "[t]\nb = 2\nc = 3\n");
}

/// A malformed merge source fails before the target is touched.
#[test]
fn merge_rejects_malformed_input() {
    let ini = IniFixture::new("[s]\na = 1\n");
    let e = ini.run_with_stdin(&["--merge"], &[], "[broken\n").err();
    assert!(e.to_string().starts_with("Error parsing -:"), "{e}");
    assert_eq!(ini.contents(), "[s]\na = 1\n");
}

// ---------------------------------------------------------------------------
// Output targets and commit strategies
// ---------------------------------------------------------------------------

/// `--output=-` prints the whole document and leaves the file alone.
#[test]
fn output_to_stdout() {
    let ini = IniFixture::new("[s]\na = 1\n");
    let out = ini.run(&["--set", "--output=-"], &["s", "a", "2"]).ok();
    assert_eq!(out, "[s]\na = 2\n");
    assert_eq!(ini.contents(), "[s]\na = 1\n");
}

/// `--output=FILE` writes the result elsewhere.
#[test]
fn output_to_other_file() {
    let ini = IniFixture::new("[s]\na = 1\n");
    let copy = ini.sibling("copy.ini");
    let flag = format!("--output={}", copy.display());
    ini.run(&["--set", &flag], &["s", "a", "2"]).ok();
    assert_eq!(std::fs::read_to_string(copy).unwrap(), "[s]\na = 2\n");
    assert_eq!(ini.contents(), "[s]\na = 1\n");
}

/// `--inplace` rewrites the same inode.
#[cfg(unix)]
#[test]
fn inplace_keeps_inode() {
    use std::os::unix::fs::MetadataExt as _;

    let ini = IniFixture::new("[s]\na = 1\n");
    let before = std::fs::metadata(&ini.path).unwrap().ino();
    ini.run(&["--set", "--inplace"], &["s", "a", "2"]).ok();
    assert_eq!(ini.contents(), "[s]\na = 2\n");
    assert_eq!(std::fs::metadata(&ini.path).unwrap().ino(), before);
}

/// Replacement leaves no temporary files behind.
#[test]
fn replace_leaves_no_temporary_files() {
    let ini = IniFixture::new("[s]\na = 1\n");
    ini.run(&["--set"], &["s", "a", "2"]).ok();
    let names: Vec<String> = std::fs::read_dir(ini.dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["app.ini"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// A parse error names the file and line and writes nothing.
#[test]
fn parse_error_leaves_file_untouched() {
    let ini = IniFixture::new("[s]\n[broken\n");
    let e = ini.run(&["--set"], &["s", "k", "v"]).err();
    assert!(matches!(edit_error(&e), EditError::Parse { .. }));
    assert!(e.to_string().contains("line 2"), "{e}");
    assert_eq!(ini.contents(), "[s]\n[broken\n");
}

/// Bad argument combinations fail before the file is read.
#[test]
fn usage_errors_are_reported() {
    let ini = IniFixture::missing();
    let e = ini.run(&["--set"], &[]).err();
    assert!(matches!(edit_error(&e), EditError::Usage(_)));
    let e = ini.run(&["--merge"], &["s", "k"]).err();
    assert!(matches!(edit_error(&e), EditError::Usage(_)));
    assert!(!ini.exists());
}
