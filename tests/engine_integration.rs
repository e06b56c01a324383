//! Integration tests for the patch engine against real files.
//!
//! Covers idempotence across runs, no-op behavior on anchor mismatch, the
//! line-splice repair variant, indentation matching, and capped output.

use anchorpatch::{
    engine, Anchor, DocumentError, Outcome, PatchSet, Presence, Replacement, Transformation,
};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_target(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// The negative-cache insertion from the original upgrade pass: declare the
/// cache right after the tip-source constant.
fn negative_cache_set() -> PatchSet {
    PatchSet {
        name: "negative-cache".to_string(),
        description: None,
        transforms: vec![Transformation {
            id: "insert-negative-cache".to_string(),
            presence: Presence::Contains("_NEG_CACHE".to_string()),
            anchor: Anchor::Pattern(
                Regex::new(r#"(LAST_TIP_SOURCE\s*=\s*"unknown"[ \t]*\n)"#).unwrap(),
            ),
            replacement: Replacement::literal(
                "${1}\n# Short-lived negative cache for failing calls\n_NEG_CACHE: dict[str, float] = {}\n_NEG_TTL_SECONDS = 60.0\n",
            ),
        }],
    }
}

#[test]
fn inserts_cache_block_exactly_once() {
    let dir = TempDir::new().unwrap();
    let path = write_target(
        &dir,
        "ai_tips.py",
        "import time\nLAST_TIP_SOURCE = \"unknown\"\n\ndef generate():\n    pass\n",
    );
    let set = negative_cache_set();

    let outcome = engine::execute(&path, &set).unwrap();
    assert!(matches!(outcome, Outcome::Applied { .. }));

    let patched = fs::read_to_string(&path).unwrap();
    assert_eq!(patched.matches("_NEG_CACHE: dict[str, float] = {}").count(), 1);
    assert!(patched.contains("LAST_TIP_SOURCE = \"unknown\"\n\n# Short-lived"));

    // Second run: no-op, byte-identical output.
    let second = engine::execute(&path, &set).unwrap();
    assert!(matches!(second, Outcome::NoOp { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), patched);
}

#[test]
fn line_splice_repairs_corrupted_line() {
    let dir = TempDir::new().unwrap();
    // Two statements merged into one line by a literal backtick-n escape.
    let corrupted = "\
def report():
    for row in rows:
        try:`n            if not df_ok_ci.empty:
            render(row)
";
    let path = write_target(&dir, "app.py", corrupted);

    let set = PatchSet {
        name: "repair-line-3".to_string(),
        description: None,
        transforms: vec![Transformation {
            id: "split-merged-try".to_string(),
            presence: Presence::Gone("try:`n".to_string()),
            anchor: Anchor::Line(3),
            replacement: Replacement::literal(
                "        try:\n            if not df_ok_ci.empty:",
            ),
        }],
    };

    let outcome = engine::execute(&path, &set).unwrap();
    assert!(matches!(outcome, Outcome::Applied { .. }));

    let patched = fs::read_to_string(&path).unwrap();
    assert_eq!(patched.lines().count(), corrupted.lines().count() + 1);
    assert!(patched.contains("        try:\n            if not df_ok_ci.empty:\n"));
    assert!(!patched.contains("`n"));

    // Presence check recognizes the repair, so re-running cannot splice the
    // (now shifted) line a second time.
    let second = engine::execute(&path, &set).unwrap();
    assert!(matches!(second, Outcome::NoOp { .. }));
}

#[test]
fn unmatched_anchors_leave_file_byte_identical() {
    let dir = TempDir::new().unwrap();
    let content = "nothing in here matches any anchor\n";
    let path = write_target(&dir, "other.py", content);

    let outcome = engine::execute(&path, &negative_cache_set()).unwrap();
    match outcome {
        Outcome::NoOp { report, .. } => {
            assert!(!report.changed);
            assert!(report.applied.is_empty());
            assert_eq!(report.skipped.len(), 1);
        }
        other => panic!("expected NoOp, got {other:?}"),
    }
    assert_eq!(fs::read(&path).unwrap(), content.as_bytes());
}

#[test]
fn ordered_transforms_see_earlier_insertions() {
    let dir = TempDir::new().unwrap();
    let path = write_target(&dir, "mod.py", "HEADER\nbody\n");

    let set = PatchSet {
        name: "chained".to_string(),
        description: None,
        transforms: vec![
            Transformation {
                id: "add-helper".to_string(),
                presence: Presence::Contains("def helper".to_string()),
                anchor: Anchor::Literal("HEADER\n".to_string()),
                replacement: Replacement::literal("HEADER\ndef helper():\n    return 1\n"),
            },
            Transformation {
                id: "call-helper".to_string(),
                presence: Presence::Contains("helper()".to_string()),
                anchor: Anchor::Literal("    return 1\n".to_string()),
                replacement: Replacement::literal("    return helper_impl()\n"),
            },
        ],
    };

    // The second transform anchors on text the first one inserts. Note its
    // presence check: "helper()" appears as soon as the first transform
    // lands, so the second reports already-applied rather than rewriting.
    let outcome = engine::execute(&path, &set).unwrap();
    let report = outcome.report();
    assert_eq!(report.applied, vec![0]);
    assert_eq!(report.already_applied, vec![1]);
}

#[test]
fn indented_insertion_matches_surrounding_depth() {
    let dir = TempDir::new().unwrap();
    let path = write_target(
        &dir,
        "app.py",
        "def page():\n    with st.popander(\"Help\"):\n        st.write(\"faq\")\n",
    );

    let set = PatchSet {
        name: "popover-fallback".to_string(),
        description: None,
        transforms: vec![Transformation {
            id: "version-safe-popover".to_string(),
            presence: Presence::Contains("HelpContainer".to_string()),
            anchor: Anchor::Literal("with st.popander(\"Help\"):".to_string()),
            replacement: Replacement {
                template: "HelpContainer = st.popover if hasattr(st, \"popover\") else st.expander\nwith HelpContainer(\"Help\"):".to_string(),
                match_indent: true,
                max_chars: None,
            },
        }],
    };

    engine::execute(&path, &set).unwrap();
    let patched = fs::read_to_string(&path).unwrap();
    assert!(patched.contains(
        "    HelpContainer = st.popover if hasattr(st, \"popover\") else st.expander\n    with HelpContainer(\"Help\"):\n"
    ));
}

#[test]
fn capped_replacement_respects_char_boundaries() {
    let dir = TempDir::new().unwrap();
    let long_tip = format!("TIP = \"{}\"\n", "é".repeat(400));
    let path = write_target(&dir, "tips.py", &long_tip);

    let set = PatchSet {
        name: "cap-tip".to_string(),
        description: None,
        transforms: vec![Transformation {
            id: "cap-tip-length".to_string(),
            presence: Presence::Matches(Regex::new(r"…").unwrap()),
            anchor: Anchor::Pattern(Regex::new(r#"TIP = "(.+)""#).unwrap()),
            replacement: Replacement {
                template: "$1".to_string(),
                match_indent: false,
                max_chars: Some(240),
            },
        }],
    };

    engine::execute(&path, &set).unwrap();
    let patched = fs::read_to_string(&path).unwrap();
    let capped = patched.lines().next().unwrap();
    assert!(capped.chars().count() <= 240);
    assert!(capped.ends_with('…'));

    // Idempotent: the ellipsis marks the cap as applied.
    let second = engine::execute(&path, &set).unwrap();
    assert!(matches!(second, Outcome::NoOp { .. }));
}

#[test]
fn read_failure_aborts_before_mutation() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.py");

    let result = engine::execute(&missing, &negative_cache_set());
    assert!(matches!(result, Err(DocumentError::Unreadable { .. })));
    assert!(!missing.exists());
}

#[test]
fn double_execute_equals_single_execute() {
    let dir = TempDir::new().unwrap();
    let path = write_target(
        &dir,
        "ai_tips.py",
        "LAST_TIP_SOURCE = \"unknown\"\ntail\n",
    );
    let set = negative_cache_set();

    engine::execute(&path, &set).unwrap();
    let once = fs::read_to_string(&path).unwrap();

    engine::execute(&path, &set).unwrap();
    let twice = fs::read_to_string(&path).unwrap();

    assert_eq!(once, twice);
}
