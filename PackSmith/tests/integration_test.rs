use std::path::{Path, PathBuf};

use packsmith::codec::{encode_db, encode_loc};
use packsmith::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::{TempDir, tempdir};

const FOO: &str = "db\\foo_tables\\data";
const FOO_EXTRA: &str = "db\\foo_tables\\extra";
const LOC: &str = "text\\db\\foo.loc";

fn foo_schema() -> DbVersion {
    DbVersion::new(
        1,
        vec![
            SchemaColumn::new("key", FieldType::StringU8, true),
            SchemaColumn::new("enabled", FieldType::Boolean, false),
        ],
    )
}

fn profile() -> GameProfile {
    let mut registry = SchemaRegistry::new();
    registry.insert("foo_tables", foo_schema());
    GameProfile::new("test", registry)
}

fn foo_header() -> TableHeader {
    TableHeader {
        guid: Some("0f2b4a6e-1111-2222-3333-444455556666".to_string()),
        version: Some(1),
        entry_count: 0,
    }
}

fn foo_rows(rows: &[(&str, bool)]) -> Vec<SchemaField> {
    rows.iter()
        .flat_map(|(key, enabled)| [SchemaField::StringU8((*key).into()), SchemaField::Boolean(*enabled)])
        .collect()
}

fn foo_table(name: &str, rows: &[(&str, bool)]) -> PackedFile {
    let bytes = encode_db(&foo_header(), &foo_schema(), &foo_rows(rows)).unwrap();
    PackedFile::from_bytes(name, bytes)
}

fn loc_table() -> PackedFile {
    let fields = vec![
        SchemaField::StringU16("foo_rowA".to_string()),
        SchemaField::StringU16("Row A".to_string()),
        SchemaField::Boolean(false),
    ];
    let bytes = encode_loc(&TableHeader::default(), &fields).unwrap();
    PackedFile::from_bytes(LOC, bytes)
}

fn write_new(dir: &TempDir, name: &str, files: Vec<PackedFile>, dependencies: Vec<String>) -> PathBuf {
    let target = dir.path().join(name);
    execute(
        WriteRequest::NewPack {
            files,
            dependencies,
            options: SortedOptions::default(),
        },
        &target,
        &profile(),
    )
    .unwrap();
    target
}

fn three_entry_pack(dir: &TempDir) -> PathBuf {
    write_new(
        dir,
        "three.pack",
        vec![
            foo_table(FOO, &[("rowA", true), ("rowB", true)]),
            foo_table(FOO_EXTRA, &[("rowC", true)]),
            loc_table(),
        ],
        Vec::new(),
    )
}

fn stored(path: &Path, name: &str) -> Vec<u8> {
    let pack = read_pack(path, &ReadOptions::with_buffers(), &profile()).unwrap();
    pack.find_file(name).unwrap().buffer.clone().unwrap()
}

fn rows_of(pack: &Pack, name: &str) -> Vec<(String, String)> {
    let file = pack.find_file(name).unwrap();
    file.schema_fields
        .as_ref()
        .unwrap()
        .chunks(2)
        .map(|row| (row[0].resolve(), row[1].resolve()))
        .collect()
}

// ============================================================================
// Sorted writer
// ============================================================================

#[test]
fn test_sorted_round_trip() {
    let dir = tempdir().unwrap();
    let path = write_new(
        &dir,
        "sorted.pack",
        vec![
            PackedFile::from_bytes("script\\b.lua", b"return 2".to_vec()),
            PackedFile::from_bytes("Script\\A.lua", b"return 1".to_vec()),
            foo_table(FOO, &[("rowA", true)]),
        ],
        Vec::new(),
    );

    let pack = read_pack(&path, &ReadOptions::index_only(), &profile()).unwrap();
    let names: Vec<_> = pack.packed_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec![FOO, "Script\\A.lua", "script\\b.lua"]);

    assert_eq!(stored(&path, "Script\\A.lua"), b"return 1");
    assert_eq!(stored(&path, "script\\b.lua"), b"return 2");
}

#[test]
fn test_dependency_round_trip() {
    let dir = tempdir().unwrap();
    let deps = vec!["a.pack".to_string(), "b.pack".to_string()];
    let path = write_new(&dir, "deps.pack", vec![loc_table()], deps.clone());

    let pack = read_pack(&path, &ReadOptions::index_only(), &profile()).unwrap();
    assert_eq!(pack.dependency_packs, deps);
    assert_eq!(pack.header.ref_file_count, 0);
    assert_eq!(pack.header.pack_file_index_size, 14);
}

#[test]
fn test_offsets_follow_index() {
    let dir = tempdir().unwrap();
    let path = three_entry_pack(&dir);
    let pack = read_pack(&path, &ReadOptions::index_only(), &profile()).unwrap();

    let mut expected = pack.header.data_start();
    let mut ordered = pack.packed_files.clone();
    ordered.sort_by_key(|f| f.start_pos);
    for file in &ordered {
        assert_eq!(file.start_pos, expected, "{}", file.name);
        expected = file.end_pos();
    }
    assert_eq!(expected, pack.size);
}

#[test]
fn test_compressed_entries_decode() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("zstd.pack");
    execute(
        WriteRequest::NewPack {
            files: vec![foo_table(FOO, &[("rowA", true), ("rowB", false)])],
            dependencies: Vec::new(),
            options: SortedOptions {
                db_first: false,
                compression_level: Some(3),
            },
        },
        &target,
        &profile(),
    )
    .unwrap();

    let pack = read_pack(&target, &ReadOptions::full(), &profile()).unwrap();
    let file = pack.find_file(FOO).unwrap();
    assert!(file.is_compressed);
    assert_eq!(file.version, Some(1));
    assert_eq!(
        rows_of(&pack, FOO),
        vec![
            ("rowA".to_string(), "true".to_string()),
            ("rowB".to_string(), "false".to_string())
        ]
    );
}

// ============================================================================
// Fast-Append
// ============================================================================

#[test]
fn test_append_nothing_is_identity() {
    let dir = tempdir().unwrap();
    let source = three_entry_pack(&dir);
    let target = dir.path().join("copy.pack");

    let existing = read_pack(&source, &ReadOptions::index_only(), &profile()).unwrap();
    write_pack(Vec::new(), &target, Some(&existing), false, None, &profile()).unwrap();

    assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&target).unwrap());
}

#[test]
fn test_append_replaces_duplicates() {
    let dir = tempdir().unwrap();
    let source = three_entry_pack(&dir);
    let existing = read_pack(&source, &ReadOptions::index_only(), &profile()).unwrap();

    let incoming = vec![
        foo_table("db\\foo_tables\\EXTRA", &[("rowZ", false)]),
        PackedFile::from_bytes("script\\new.lua", b"-- new".to_vec()),
    ];
    let summary = write_pack(incoming, &source, Some(&existing), true, None, &profile()).unwrap();
    assert_eq!(summary.strategy, "fast-append");
    assert_eq!(summary.file_count, 4);

    let pack = read_pack(&source, &ReadOptions::full(), &profile()).unwrap();
    assert_eq!(pack.file_count(), 4);
    assert!(pack.find_file(FOO_EXTRA).is_none());
    assert_eq!(
        rows_of(&pack, "db\\foo_tables\\EXTRA"),
        vec![("rowZ".to_string(), "false".to_string())]
    );
    assert_eq!(stored(&source, "script\\new.lua"), b"-- new");
}

// ============================================================================
// Row-Overwrite
// ============================================================================

#[test]
fn test_overwrite_edit_touches_only_target() {
    let dir = tempdir().unwrap();
    let source = three_entry_pack(&dir);
    let target = dir.path().join("edited.pack");

    let edit = Overwrite::edit(FOO, vec![0], vec![json!("rowA")], 1, json!(false));
    let summary = create_overwrite_pack(&source, &target, &[edit], &profile()).unwrap();
    assert_eq!(summary.strategy, "row-overwrite");
    assert_eq!(summary.file_count, 3);

    let pack = read_pack(&target, &ReadOptions::full(), &profile()).unwrap();
    assert_eq!(
        rows_of(&pack, FOO),
        vec![
            ("rowA".to_string(), "false".to_string()),
            ("rowB".to_string(), "true".to_string())
        ]
    );
    let file = pack.find_file(FOO).unwrap();
    assert_eq!(file.guid, foo_header().guid);
    assert_eq!(file.version, Some(1));

    assert_eq!(stored(&source, FOO_EXTRA), stored(&target, FOO_EXTRA));
    assert_eq!(stored(&source, LOC), stored(&target, LOC));
}

#[test]
fn test_overwrite_keeps_latin1_neighbour_bytes() {
    let dir = tempdir().unwrap();
    let fields = vec![
        SchemaField::StringU8("rowA".into()),
        SchemaField::Boolean(true),
        SchemaField::StringU8(b"caf\xE9".to_vec().into()),
        SchemaField::Boolean(true),
    ];
    let bytes = encode_db(&foo_header(), &foo_schema(), &fields).unwrap();
    let source = write_new(&dir, "latin1.pack", vec![PackedFile::from_bytes(FOO, bytes)], Vec::new());
    let target = dir.path().join("edited.pack");

    let edit = Overwrite::edit(FOO, vec![0], vec![json!("rowA")], 1, json!(false));
    create_overwrite_pack(&source, &target, &[edit], &profile()).unwrap();

    let expected = {
        let mut fields = fields;
        fields[1] = SchemaField::Boolean(false);
        encode_db(&foo_header(), &foo_schema(), &fields).unwrap()
    };
    let written = stored(&target, FOO);
    assert_eq!(written, expected);
    assert!(written.windows(4).any(|w| w == b"caf\xE9"));
}

#[test]
fn test_overwrite_remove() {
    let dir = tempdir().unwrap();
    let source = three_entry_pack(&dir);
    let target = dir.path().join("removed.pack");

    let remove = Overwrite::remove(FOO, vec![0], vec![json!("rowB")]);
    create_overwrite_pack(&source, &target, &[remove], &profile()).unwrap();

    let pack = read_pack(&target, &ReadOptions::full(), &profile()).unwrap();
    assert_eq!(rows_of(&pack, FOO), vec![("rowA".to_string(), "true".to_string())]);
}

#[test]
fn test_overwrite_missing_table_leaves_target_untouched() {
    let dir = tempdir().unwrap();
    let source = three_entry_pack(&dir);
    let target = dir.path().join("out.pack");
    std::fs::write(&target, b"previous").unwrap();

    let edit = Overwrite::edit("db\\bar_tables\\data", vec![0], vec![json!("x")], 1, json!(true));
    let err = create_overwrite_pack(&source, &target, &[edit], &profile()).unwrap_err();
    assert!(matches!(err, Error::FileNotFoundInPack(_)));
    assert_eq!(std::fs::read(&target).unwrap(), b"previous");
}

// ============================================================================
// Reader failures
// ============================================================================

#[test]
fn test_read_packs_reports_broken_archives() {
    let dir = tempdir().unwrap();
    let good = three_entry_pack(&dir);
    let bad_magic = dir.path().join("magic.pack");
    std::fs::write(&bad_magic, b"PFH4\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0").unwrap();
    let truncated = dir.path().join("short.pack");
    std::fs::write(&truncated, b"PFH5\x03\0\0\0").unwrap();

    let (packs, failures) = read_packs(&[&good, &bad_magic, &truncated], &ReadOptions::index_only(), &profile());
    assert_eq!(packs.len(), 1);
    assert_eq!(packs[0].name, "three.pack");
    assert_eq!(failures.len(), 2);

    for (path, error) in &failures {
        if path == &bad_magic {
            assert!(matches!(error, Error::InvalidPackMagic(m) if m == b"PFH4"));
        } else {
            assert_eq!(path, &truncated);
            assert!(matches!(error, Error::Truncated { .. }));
        }
    }
}

#[test]
fn test_truncated_table_keeps_complete_rows() {
    let dir = tempdir().unwrap();
    let mut bytes = encode_db(&foo_header(), &foo_schema(), &foo_rows(&[("rowA", true), ("rowB", true)])).unwrap();
    // Cut into the second row's key string
    bytes.truncate(bytes.len() - 4);
    let path = write_new(
        &dir,
        "cut.pack",
        vec![PackedFile::from_bytes(FOO, bytes), loc_table()],
        Vec::new(),
    );

    let pack = read_pack(&path, &ReadOptions::full(), &profile()).unwrap();
    let file = pack.find_file(FOO).unwrap();
    assert!(file.decode_error.is_some());
    assert_eq!(rows_of(&pack, FOO), vec![("rowA".to_string(), "true".to_string())]);

    let loc = pack.find_file(LOC).unwrap();
    assert!(loc.decode_error.is_none());
    assert_eq!(loc.schema_fields.as_ref().unwrap().len(), 3);
}

#[test]
fn test_rewriting_truncated_table_keeps_every_byte() {
    let dir = tempdir().unwrap();
    let mut bytes = encode_db(&foo_header(), &foo_schema(), &foo_rows(&[("rowA", true), ("rowB", true)])).unwrap();
    bytes.pop();
    let source = write_new(&dir, "cut.pack", vec![PackedFile::from_bytes(FOO, bytes.clone())], Vec::new());

    let mut options = ReadOptions::full();
    options.load_buffers = true;
    let pack = read_pack(&source, &options, &profile()).unwrap();
    assert!(pack.find_file(FOO).unwrap().decode_error.is_some());

    let rewritten = write_new(&dir, "rewritten.pack", pack.packed_files, Vec::new());
    assert_eq!(stored(&rewritten, FOO), bytes);
}

#[test]
fn test_unknown_schema_keeps_version() {
    let dir = tempdir().unwrap();
    let path = write_new(&dir, "plain.pack", vec![foo_table(FOO, &[("rowA", true)])], Vec::new());

    let bare = GameProfile::new("test", SchemaRegistry::new());
    let pack = read_pack(&path, &ReadOptions::full(), &bare).unwrap();
    let file = pack.find_file(FOO).unwrap();
    assert_eq!(file.version, Some(1));
    assert!(file.schema_fields.is_none());
    assert!(file.decode_error.is_some());
}

// ============================================================================
// Merge and view
// ============================================================================

#[test]
fn test_merge_later_pack_wins() {
    let dir = tempdir().unwrap();
    let first = write_new(
        &dir,
        "first.pack",
        vec![
            foo_table(FOO, &[("rowA", true)]),
            PackedFile::from_bytes("script\\only_first.lua", b"1".to_vec()),
        ],
        vec!["base.pack".to_string(), "second.pack".to_string()],
    );
    let second = write_new(
        &dir,
        "second.pack",
        vec![foo_table("DB\\foo_tables\\DATA", &[("rowA", false)])],
        vec!["base.pack".to_string(), "extra.pack".to_string()],
    );
    let output = dir.path().join("merged.pack");

    merge_mods(&[&first, &second], &output, &profile()).unwrap();

    let pack = read_pack(&output, &ReadOptions::full(), &profile()).unwrap();
    assert_eq!(pack.file_count(), 2);
    assert_eq!(pack.dependency_packs, vec!["base.pack".to_string(), "extra.pack".to_string()]);
    assert_eq!(
        rows_of(&pack, "DB\\foo_tables\\DATA"),
        vec![("rowA".to_string(), "false".to_string())]
    );
}

#[test]
fn test_merge_nothing() {
    let dir = tempdir().unwrap();
    let sources: [PathBuf; 0] = [];
    let err = merge_mods(&sources, &dir.path().join("x.pack"), &profile()).unwrap_err();
    assert!(matches!(err, Error::NothingToMerge));
}

#[test]
fn test_view_data() {
    let dir = tempdir().unwrap();
    let path = three_entry_pack(&dir);

    let view = get_pack_view_data(&path, None, &profile()).unwrap();
    assert_eq!(view.files.len(), 3);
    assert_eq!(view.tables.len(), 3);

    let foo = &view.tables[FOO];
    assert_eq!(foo.table, "foo_tables");
    assert_eq!(foo.rows.len(), 2);
    assert_eq!(foo.rows[0][0].name, "key");
    assert!(foo.rows[0][0].is_key);
    assert_eq!(foo.rows[0][0].resolved, "rowA");

    let filtered = get_pack_view_data(&path, Some(LOC), &profile()).unwrap();
    assert_eq!(filtered.files.len(), 3);
    assert_eq!(filtered.tables.keys().collect::<Vec<_>>(), vec![LOC]);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["tables"][FOO]["rows"][1][1]["resolved"], json!("true"));
}

#[test]
fn test_packs_table_data_skips_failures() {
    let dir = tempdir().unwrap();
    let good = three_entry_pack(&dir);
    let missing = dir.path().join("missing.pack");

    let data = get_packs_table_data(&[good, missing], &["foo_tables".to_string()], &profile());
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].tables.len(), 2);
}
