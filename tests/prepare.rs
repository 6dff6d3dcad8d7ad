use std::fs;
use std::path::{Path, PathBuf};

use substack::config::{Config, SubstackParams};
use substack::core::prepare::{prepare, PrepareRequest};
use substack::core::slices::StagingMode;

fn slab(dir: &Path, indices: impl IntoIterator<Item = u64>) -> PathBuf {
    let slices = dir.join("zcorr");
    fs::create_dir_all(&slices).expect("create slab dir");
    for i in indices {
        fs::write(slices.join(format!("z{:05}.png", i)), format!("slice {}", i)).expect("write slice");
    }
    slices
}

fn request(slices: &Path, out: &Path, start: u64, stop: u64, mode: StagingMode) -> PrepareRequest {
    PrepareRequest {
        fly: "Z1217-19m".into(),
        region: "VNC".into(),
        slab: 2,
        start,
        stop,
        input_slice_dir: Some(slices.to_path_buf()),
        substack_name: None,
        parent_output_dir: out.to_path_buf(),
        mode,
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().into_string().expect("utf8"))
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn symlinks_renumbered_slices_from_zero() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), 0..20);

    let base = prepare(
        &request(&slices, tmp.path(), 5, 12, StagingMode::Symlink),
        &Config::default(),
    )
    .expect("prepare");

    assert_eq!(base, tmp.path().join("substack-Sec02-z00005-z00012"));

    let input = base.join("input_slices");
    let expected = (0..7).map(|i| format!("{:05}.png", i)).collect::<Vec<_>>();
    assert_eq!(entries(&input), expected);

    for (new_index, orig_index) in (5..12).enumerate() {
        let entry = input.join(format!("{:05}.png", new_index));
        assert!(fs::symlink_metadata(&entry).expect("meta").file_type().is_symlink());
        assert_eq!(
            fs::read_link(&entry).expect("link"),
            slices.join(format!("z{:05}.png", orig_index))
        );
    }
}

#[test]
fn copies_are_independent_and_identical() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), 0..4);

    let base = prepare(
        &request(&slices, tmp.path(), 1, 3, StagingMode::Copy),
        &Config::default(),
    )
    .expect("prepare");

    let first = base.join("input_slices/00000.png");
    assert!(!fs::symlink_metadata(&first).expect("meta").file_type().is_symlink());
    assert_eq!(fs::read(&first).expect("read"), b"slice 1");
    assert_eq!(fs::read(base.join("input_slices/00001.png")).expect("read"), b"slice 2");
}

#[test]
fn writes_params_layout_and_rendered_script() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), 0..3);

    let base = prepare(
        &request(&slices, tmp.path(), 0, 3, StagingMode::Symlink),
        &Config::default(),
    )
    .expect("prepare");

    let params = SubstackParams::read(&base).expect("params");
    assert_eq!(params.substack_name, "substack-Sec02-z00000-z00003");
    assert_eq!(params.substack_base_dir, base.to_str().unwrap());
    assert_eq!(params.tab_name, "Sec02");
    assert_eq!(params.bill_to, "flyem");

    assert!(base.join("logs").is_dir());

    let script = fs::read_to_string(base.join("flatten/flattenParams.sh")).expect("script");
    assert!(script.contains(&format!("INPUT_DIR=\"{}\"", params.substack_slice_dir)));
    assert!(!script.contains("{{"));

    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(base.join("logs")).expect("meta").permissions().mode();
    assert_ne!(mode & 0o020, 0, "substack tree should be group writable");
}

#[test]
fn missing_slice_fails_without_placing_it() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), [10, 11, 13, 14]);

    let result = prepare(
        &request(&slices, tmp.path(), 10, 15, StagingMode::Symlink),
        &Config::default(),
    );
    assert!(result.is_err());

    let input = tmp.path().join("substack-Sec02-z00010-z00015/input_slices");
    assert_eq!(entries(&input), vec!["00000.png", "00001.png"]);
}

#[test]
fn rerun_with_same_name_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), 0..3);
    let request = request(&slices, tmp.path(), 0, 3, StagingMode::Symlink);

    prepare(&request, &Config::default()).expect("first prepare");

    assert!(prepare(&request, &Config::default()).is_err());
}

#[test]
fn empty_slice_dir_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), Vec::<u64>::new());

    assert!(prepare(
        &request(&slices, tmp.path(), 0, 3, StagingMode::Symlink),
        &Config::default()
    )
    .is_err());
}

#[test]
fn parent_dir_with_space_is_prepared() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().expect("tempdir");
    let slices = slab(tmp.path(), 0..2);
    let out = tmp.path().join("my substacks");

    let base = prepare(
        &request(&slices, &out, 0, 2, StagingMode::Symlink),
        &Config::default(),
    )
    .expect("prepare");

    assert_eq!(base, out.join("substack-Sec02-z00000-z00002"));
    assert_eq!(entries(&base.join("input_slices")), vec!["00000.png", "00001.png"]);

    let mode = fs::metadata(base.join("logs")).expect("meta").permissions().mode();
    assert_ne!(mode & 0o020, 0, "substack tree should be group writable");
}
