//! Snapshot Tests
//!
//! Tests for saving and loading the text snapshot format.

use std::fs;
use std::io::Cursor;

use navdb::btree::BTree;
use navdb::NavError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn to_text(tree: &BTree) -> String {
    let mut out = Vec::new();
    tree.write_snapshot(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn from_text(text: &str) -> navdb::Result<BTree> {
    BTree::read_snapshot(Cursor::new(text.as_bytes()))
}

// =============================================================================
// Format Tests
// =============================================================================

#[test]
fn test_empty_tree_snapshot_text() {
    let text = to_text(&BTree::new());
    assert_eq!(text, "ORDER=3\nROOT_INDEX=-1\nNODE_COUNT=0\n\n");
}

#[test]
fn test_two_level_snapshot_text() {
    let mut tree = BTree::new();
    for k in [10, 20, 5, 6, 12, 30] {
        tree.insert(k, format!("v{}", k));
    }

    let expected = "ORDER=3\n\
                    ROOT_INDEX=0\n\
                    NODE_COUNT=3\n\
                    \n\
                    NODE_0|LEAF=false|KEYS=[10]|VALUES=[v10]|CHILDREN=[1,2]\n\
                    NODE_1|LEAF=true|KEYS=[5,6]|VALUES=[v5~v6]\n\
                    NODE_2|LEAF=true|KEYS=[12,20,30]|VALUES=[v12~v20~v30]\n";
    assert_eq!(to_text(&tree), expected);
}

#[test]
fn test_values_are_escaped_in_snapshot() {
    let mut tree = BTree::new();
    tree.insert(1, "a|b~c[d]");

    let text = to_text(&tree);
    assert!(text.contains(r"VALUES=[a\|b\~c\[d\]]"), "got: {}", text);
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_save_and_load_roundtrip() {
    let dir = setup_temp_dir();
    let path = dir.path().join("index.dat");

    let mut tree = BTree::new();
    for k in 1..=200u64 {
        tree.insert(k * 3, format!("record {}", k));
    }
    tree.save_to(&path).unwrap();

    let mut loaded = BTree::new();
    loaded.load_from(&path).unwrap();

    assert_eq!(loaded.len(), tree.len());
    assert_eq!(loaded.traverse_all(), tree.traverse_all());
    assert_eq!(loaded.max_key(), Some(600));
    loaded.validate().unwrap();
}

#[test]
fn test_roundtrip_preserves_special_characters() {
    let awkward = [
        "Main St | North",
        "list~of~things",
        "[bracketed]",
        r"back\slash",
        r"literal \p sequence",
        "line one\nline two\r\n",
        "",
    ];

    let mut tree = BTree::new();
    for (i, value) in awkward.iter().enumerate() {
        tree.insert(i as u64 + 1, *value);
    }

    let loaded = from_text(&to_text(&tree)).unwrap();
    for (i, value) in awkward.iter().enumerate() {
        assert_eq!(loaded.search(i as u64 + 1), Some(*value));
    }
}

#[test]
fn test_load_replaces_existing_contents() {
    let dir = setup_temp_dir();
    let path = dir.path().join("index.dat");

    let mut saved = BTree::new();
    saved.insert(100, "kept");
    saved.save_to(&path).unwrap();

    let mut tree = BTree::new();
    tree.insert(1, "stale");
    tree.insert(2, "stale");
    tree.load_from(&path).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.search(1), None);
    assert_eq!(tree.search(100), Some("kept"));
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = setup_temp_dir();
    let path = dir.path().join("index.dat");

    let mut tree = BTree::new();
    tree.insert(1, "one");
    tree.save_to(&path).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["index.dat".to_string()]);
}

// =============================================================================
// Lenient Inputs
// =============================================================================

#[test]
fn test_zero_node_count_loads_empty() {
    let tree = from_text("ORDER=3\nROOT_INDEX=0\nNODE_COUNT=0\n\n").unwrap();
    assert!(tree.is_empty());
}

#[test]
fn test_negative_root_loads_empty() {
    let tree = from_text("ORDER=3\nROOT_INDEX=-1\nNODE_COUNT=4\n\n").unwrap();
    assert!(tree.is_empty());
}

#[test]
fn test_unknown_header_lines_are_ignored() {
    let text = "ORDER=3\nCREATED_BY=someone\nROOT_INDEX=0\nNODE_COUNT=1\n\n\
                NODE_0|LEAF=true|KEYS=[4,8]|VALUES=[four~eight]\n";
    let tree = from_text(text).unwrap();
    assert_eq!(tree.search(8), Some("eight"));
}

#[test]
fn test_crlf_line_endings_accepted() {
    let text = "ORDER=3\r\nROOT_INDEX=0\r\nNODE_COUNT=1\r\n\r\n\
                NODE_0|LEAF=true|KEYS=[1]|VALUES=[one]\r\n";
    let tree = from_text(text).unwrap();
    assert_eq!(tree.search(1), Some("one"));
}

// =============================================================================
// Malformed Snapshot Tests
// =============================================================================

fn assert_snapshot_error(text: &str) {
    match from_text(text) {
        Err(NavError::Snapshot(_)) => {}
        Err(e) => panic!("expected snapshot error, got {:?}", e),
        Ok(tree) => panic!("expected snapshot error, loaded {} records", tree.len()),
    }
}

#[test]
fn test_order_mismatch_rejected() {
    assert_snapshot_error(
        "ORDER=4\nROOT_INDEX=0\nNODE_COUNT=1\n\nNODE_0|LEAF=true|KEYS=[1]|VALUES=[a]\n",
    );
}

#[test]
fn test_missing_node_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=3\n\n\
         NODE_0|LEAF=false|KEYS=[10]|VALUES=[a]|CHILDREN=[1,2]\n\
         NODE_1|LEAF=true|KEYS=[1,2]|VALUES=[b~c]\n",
    );
}

#[test]
fn test_dangling_child_id_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=3\n\n\
         NODE_0|LEAF=false|KEYS=[10]|VALUES=[a]|CHILDREN=[1,7]\n\
         NODE_1|LEAF=true|KEYS=[1,2]|VALUES=[b~c]\n\
         NODE_2|LEAF=true|KEYS=[11,12]|VALUES=[d~e]\n",
    );
}

#[test]
fn test_node_referenced_twice_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=3\n\n\
         NODE_0|LEAF=false|KEYS=[10]|VALUES=[a]|CHILDREN=[1,1]\n\
         NODE_1|LEAF=true|KEYS=[1,2]|VALUES=[b~c]\n\
         NODE_2|LEAF=true|KEYS=[11,12]|VALUES=[d~e]\n",
    );
}

#[test]
fn test_duplicate_node_id_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=2\n\n\
         NODE_0|LEAF=true|KEYS=[1]|VALUES=[a]\n\
         NODE_0|LEAF=true|KEYS=[2]|VALUES=[b]\n",
    );
}

#[test]
fn test_value_count_mismatch_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=1\n\nNODE_0|LEAF=true|KEYS=[1,2]|VALUES=[a]\n",
    );
}

#[test]
fn test_unordered_keys_rejected() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=1\n\nNODE_0|LEAF=true|KEYS=[5,2]|VALUES=[a~b]\n",
    );
}

#[test]
fn test_huge_node_count_rejected_without_allocating() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=18446744073709551615\n\n\
         NODE_0|LEAF=true|KEYS=[1]|VALUES=[a]\n",
    );
}

#[test]
fn test_node_count_must_match_node_lines() {
    assert_snapshot_error(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT=1000000000000\n\n\
         NODE_0|LEAF=true|KEYS=[1]|VALUES=[a]\n",
    );
}

#[test]
fn test_overly_deep_chain_rejected() {
    // Internal nodes 0..LEVELS form a left spine; each also owns one leaf
    const LEVELS: usize = 200;
    let mut text = format!(
        "ORDER=3\nROOT_INDEX=0\nNODE_COUNT={}\n\n",
        2 * LEVELS + 1
    );
    for i in 0..LEVELS {
        text.push_str(&format!(
            "NODE_{}|LEAF=false|KEYS=[{}]|VALUES=[v]|CHILDREN=[{},{}]\n",
            i,
            1000 - i,
            i + 1,
            LEVELS + 1 + i
        ));
    }
    for id in LEVELS..=2 * LEVELS {
        text.push_str(&format!("NODE_{}|LEAF=true|KEYS=[1]|VALUES=[x]\n", id));
    }

    match from_text(&text) {
        Err(NavError::Snapshot(msg)) => assert!(msg.contains("deeper"), "got: {}", msg),
        other => panic!("expected depth error, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = setup_temp_dir();
    let mut tree = BTree::new();
    tree.insert(1, "x");

    let err = tree.load_from(&dir.path().join("absent.dat")).unwrap_err();
    assert!(matches!(err, NavError::Io(_)));
    assert!(tree.is_empty());
}
