use std::path::{Path, PathBuf};

use spectra_merge::data::merge::{DATA_FILE_NAME, METADATA_FILE_NAME, WAVELENGTH_COLUMN};
use spectra_merge::data::model::Cell;
use spectra_merge::error::{ErrorKind, FileFailureReason};
use spectra_merge::{FormatOptions, FormatPreset, MergeEngine, MergeError, MergeRequest};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn spectrum(title: &str, rows: &[(&str, &str)]) -> String {
    let mut s = format!("TITLE;{title}\nInstrument;UV 2600\nXYDATA;\n");
    for (x, y) in rows {
        s.push_str(&format!("{x};{y}\n"));
    }
    s.push_str("Operator;Jane Doe\n");
    s
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn scenario_a_two_overlapping_grids() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = write(dir.path(), "file1.csv", &spectrum("", &[("400,0", "1,0"), ("401,0", "2,0"), ("402,0", "3,0")]));
    let f2 = write(dir.path(), "file2.csv", &spectrum("", &[("401.0", "4.0"), ("402.0", "5.0"), ("403.0", "6.0")]));

    let request = MergeRequest::new(vec![f1, f2], FormatPreset::Us.options());
    let outcome = MergeEngine::new().run(&request).unwrap();
    let merged = &outcome.merged;

    assert_eq!(merged.axis.points(), &[400.0, 401.0, 402.0, 403.0]);
    let c1 = merged.data.column("file1").unwrap();
    let c2 = merged.data.column("file2").unwrap();
    assert_eq!(c1.cells[3], Cell::Missing);
    assert_eq!(c2.cells[0], Cell::Missing);
    assert_eq!(c1.cells[0], Cell::Number(1.0));
    assert_eq!(c2.cells[3], Cell::Number(6.0));

    let lines = read_lines(&dir.path().join(DATA_FILE_NAME));
    assert_eq!(
        lines,
        vec![
            "Wavelength_nm,file1,file2",
            "400.0,1.0,",
            "401.0,2.0,4.0",
            "402.0,3.0,5.0",
            "403.0,,6.0",
        ]
    );

    assert_eq!(outcome.summary.rows, 4);
    assert_eq!(outcome.summary.columns, 3);
    assert_eq!(outcome.summary.axis_min, 400.0);
    assert_eq!(outcome.summary.axis_max, 403.0);
    assert!(outcome.summary.excluded.is_empty());
}

#[test]
fn scenario_b_missing_marker_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "nomarker.csv", "TITLE;x\n400;1\n401;2\n");
    let good = write(dir.path(), "good.csv", &spectrum("Dark", &[("400", "1")]));

    let outcome = MergeEngine::new()
        .run(&MergeRequest::new(vec![bad.clone(), good], FormatOptions::default()))
        .unwrap();

    let headers: Vec<&str> = outcome.merged.data.headers().collect();
    assert_eq!(headers, vec![WAVELENGTH_COLUMN, "good_Dark"]);
    assert_eq!(outcome.summary.excluded.len(), 1);
    assert_eq!(outcome.summary.excluded[0].path, bad);
    assert_eq!(outcome.summary.excluded[0].reason, FileFailureReason::Format);
}

#[test]
fn scenario_c_all_rows_malformed_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let junk = write(dir.path(), "junk.csv", "XYDATA\nabc;def\n;\n1,2,3;x\n");
    let good = write(dir.path(), "good.csv", &spectrum("", &[("500", "2")]));

    let outcome = MergeEngine::sequential()
        .run(&MergeRequest::new(vec![junk, good], FormatOptions::default()))
        .unwrap();

    assert_eq!(outcome.merged.data.n_columns(), 2);
    assert_eq!(outcome.summary.excluded[0].reason, FileFailureReason::EmptyData);
}

#[test]
fn scenario_d_no_usable_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "no marker here\n");
    let b = write(dir.path(), "b.csv", "XYDATA\nnothing;numeric\n");
    let missing = dir.path().join("does_not_exist.csv");

    let request = MergeRequest::new(vec![a, b, missing], FormatOptions::default());
    let err = MergeEngine::new().run(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
    match err {
        MergeError::NoData { selected, excluded } => {
            assert_eq!(selected, 3);
            let reasons: Vec<_> = excluded.iter().map(|f| f.reason).collect();
            assert_eq!(
                reasons,
                vec![
                    FileFailureReason::Format,
                    FileFailureReason::EmptyData,
                    FileFailureReason::Read,
                ]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join(DATA_FILE_NAME).exists());
    assert!(!dir.path().join(METADATA_FILE_NAME).exists());

    let empty = MergeRequest::new(Vec::new(), FormatOptions::default()).with_output_dir(dir.path());
    let err = MergeEngine::new().run(&empty).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
}

#[test]
fn scenario_e_european_format() {
    let dir = tempfile::tempdir().unwrap();
    let f = write(
        dir.path(),
        "scan.v2.csv",
        "Lamp;D2\nXYDATA\n400,5;8,25\n401,5;12,3\n",
    );

    let outcome = MergeEngine::new()
        .run(&MergeRequest::new(vec![f], FormatPreset::European.options()))
        .unwrap();

    let data = read_lines(&outcome.summary.data_file);
    assert_eq!(data[0], "Wavelength_nm;scan.v2");
    assert_eq!(data[2], "401,5;12,3");

    let meta = read_lines(&outcome.summary.metadata_file);
    assert_eq!(
        meta[0],
        "Filename;Lamp;Column_Name;Original_Range_Min;Original_Range_Max;\
         Original_Points;Unified_Valid_Points;Unified_Coverage_Percent"
    );
    assert_eq!(meta[1], "scan.v2;D2;scan.v2;400,5;401,5;2;2;100,0");
}

#[test]
fn coverage_matches_valid_points() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = write(dir.path(), "a.csv", &spectrum("", &[("1", "1"), ("2", "1"), ("3", "1")]));
    let f2 = write(dir.path(), "b.csv", &spectrum("", &[("3", "1"), ("4", "1"), ("5", "1"), ("5", "9")]));

    let merged = MergeEngine::new().assemble(&[f1, f2]).unwrap();
    let n = merged.axis.len() as f64;
    assert_eq!(n, 5.0);

    let valid = merged.metadata.column("Unified_Valid_Points").unwrap();
    let pct = merged.metadata.column("Unified_Coverage_Percent").unwrap();
    for (v, p) in valid.cells.iter().zip(&pct.cells) {
        let expected = (v.as_f64().unwrap() / n * 100.0 * 10.0).round() / 10.0;
        assert_eq!(p.as_f64().unwrap(), expected);
    }
    assert_eq!(merged.coverage[1].original_points, 4);
    assert_eq!(merged.coverage[1].valid_points, 3);
    // First duplicate wins.
    assert_eq!(merged.data.column("b").unwrap().cells[4], Cell::Number(1.0));
}

#[test]
fn column_order_follows_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..12)
        .rev()
        .map(|i| {
            let x = format!("{}", 400 + i);
            write(dir.path(), &format!("s{i:02}.csv"), &spectrum("", &[(x.as_str(), "1")]))
        })
        .collect();

    let parallel = MergeEngine::new().assemble(&files).unwrap();
    let sequential = MergeEngine::sequential().assemble(&files).unwrap();
    assert_eq!(parallel, sequential);

    let headers: Vec<&str> = parallel.data.headers().skip(1).collect();
    let expected: Vec<String> = (0..12).rev().map(|i| format!("s{i:02}")).collect();
    assert_eq!(headers, expected);
}

#[test]
fn colliding_column_names_are_suffixed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("other")).unwrap();
    let a = write(dir.path(), "run.csv", &spectrum("Dark", &[("400", "1")]));
    let b = write(&dir.path().join("other"), "run.csv", &spectrum("Dark", &[("400", "2")]));

    let merged = MergeEngine::new().assemble(&[a, b]).unwrap();
    let headers: Vec<&str> = merged.data.headers().collect();
    assert_eq!(headers, vec![WAVELENGTH_COLUMN, "run_Dark", "run_Dark_2"]);
    assert_eq!(merged.data.column("run_Dark_2").unwrap().cells[0], Cell::Number(2.0));
}

#[test]
fn unwritable_output_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let f = write(dir.path(), "a.csv", &spectrum("", &[("400", "1")]));
    let request = MergeRequest::new(vec![f], FormatOptions::default())
        .with_output_dir(dir.path().join("missing").join("dir"));

    let err = MergeEngine::new().run(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains(DATA_FILE_NAME));
}

#[test]
fn summary_serialises_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let f = write(dir.path(), "a.csv", &spectrum("", &[("400", "1")]));
    let outcome = MergeEngine::new()
        .run(&MergeRequest::new(vec![f], FormatPreset::Excel.options()))
        .unwrap();

    let json = serde_json::to_value(&outcome.summary).unwrap();
    assert_eq!(json["rows"], 1);
    assert_eq!(json["format"]["field_separator"], "tab");
    assert_eq!(json["files"][0]["column"], "a");
}
