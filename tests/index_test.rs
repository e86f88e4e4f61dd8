use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).expect("create zip"));
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(body.as_bytes()).expect("write entry");
    }
    zip.finish().expect("finish zip");
}

fn modzip(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("modzip");
    cmd.current_dir(home)
        .env("MODZIP_HOME", home)
        .env("MODZIP_CONFIG_PATH", home.join("absent.toml"));
    cmd
}

#[test]
fn index_writes_sorted_rows_and_recoverable_sidecar() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("mods");
    fs::create_dir_all(root.join("maps")).expect("mkdir");

    let long_description = "A very long description that will not fit into the cell";
    write_zip(
        &root.join("maps/utah.zip"),
        &[(
            "levels/utah/info.json",
            &format!(
                "{{\n  // comment\n  \"title\": \"Utah\",\n  \"description\": \"{long_description}\",\n}}"
            ),
        )],
    );
    write_zip(
        &root.join("covet.zip"),
        &[(
            "vehicles/covet/info.json",
            r#"{"Name": "Covet", "Brand": "Ibishu", "last_update": 1700000000000}"#,
        )],
    );
    fs::write(root.join("broken.zip"), b"not a zip").expect("write broken");

    let output = tmp.path().join("out/index.csv");
    modzip(tmp.path())
        .args(["index", "--workers", "2", "--max-cell-chars", "30", "--no-notify"])
        .arg("-r")
        .arg(&root)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicates::str::contains("command=index"))
        .stdout(predicates::str::contains("archives=3"))
        .stdout(predicates::str::contains("errors=1"))
        .stdout(predicates::str::contains("notify="));

    let mut reader = csv::Reader::from_path(&output).expect("open csv");
    let headers: Vec<String> = reader
        .headers()
        .expect("headers")
        .iter()
        .map(ToOwned::to_owned)
        .collect();
    assert_eq!(headers[0], "row_id");
    let col = |name: &str| headers.iter().position(|h| h == name).expect(name);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    let names: Vec<&str> = rows.iter().map(|r| &r[col("file_name")]).collect();
    assert_eq!(names, vec!["broken.zip", "covet.zip", "utah.zip"]);

    assert_eq!(&rows[0][col("zip_error")], "BadZipFile");
    assert_eq!(&rows[1][col("json_rule_used")], "vehicles");
    assert_eq!(&rows[1][col("Brand")], "Ibishu");
    assert_eq!(&rows[1][col("last_update_human")], "2023-11-14 22:13:20 UTC");
    assert_eq!(&rows[2][col("map_name")], "utah");

    let cut = &rows[2][col("description")];
    assert_eq!(cut.chars().count(), 30);
    assert!(cut.ends_with('…'));

    let sidecar = fs::read_to_string(tmp.path().join("out/index.details.jsonl")).expect("sidecar");
    let utah_id = rows[2][col("row_id")].to_string();
    let record: serde_json::Value = sidecar
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json line"))
        .find(|record| record["row_id"] == utah_id.as_str())
        .expect("sidecar line for utah.zip");
    assert_eq!(record["file_name"], "utah.zip");
    assert_eq!(record["full"]["description"], long_description);
    assert_eq!(
        record["lengths"]["description"],
        long_description.chars().count()
    );
}

#[test]
fn index_derives_output_name_and_handles_empty_roots() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("empty");
    fs::create_dir_all(&root).expect("mkdir");
    let base = tmp.path().join("reports");

    modzip(tmp.path())
        .args(["index", "--no-notify"])
        .arg("-r")
        .arg(&root)
        .arg("--out-base-dir")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicates::str::contains("archives=0"));

    assert!(base.join("mods_index_on_X.csv").is_file());
    assert!(base.join("mods_index_on_X.details.jsonl").is_file());
}

#[test]
fn index_rejects_invalid_configuration() {
    let tmp = tempdir().expect("tempdir");
    modzip(tmp.path())
        .env("MODZIP_SELECTION_MODE", "loose")
        .args(["index", "--no-notify", "-r"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("error:"))
        .stderr(predicates::str::contains("MODZIP_SELECTION_MODE=loose"));
}

#[test]
fn index_row_ids_join_the_sidecar_under_small_budgets() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("mods");
    fs::create_dir_all(&root).expect("mkdir");
    write_zip(
        &root.join("covet.zip"),
        &[("vehicles/covet/info.json", r#"{"Name": "Covet Sport"}"#)],
    );

    let output = tmp.path().join("index.csv");
    modzip(tmp.path())
        .args(["index", "--max-cell-chars", "4", "--no-notify", "-r"])
        .arg(&root)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let mut reader = csv::Reader::from_path(&output).expect("open csv");
    let row = reader.records().next().expect("one row").expect("row");
    let row_id = row[0].to_string();
    assert_eq!(row_id.chars().count(), 12);

    let sidecar = fs::read_to_string(tmp.path().join("index.details.jsonl")).expect("sidecar");
    let record: serde_json::Value =
        serde_json::from_str(sidecar.lines().next().expect("one line")).expect("json");
    assert_eq!(record["row_id"], row_id.as_str());
    assert_eq!(record["full"]["Name"], "Covet Sport");
}
