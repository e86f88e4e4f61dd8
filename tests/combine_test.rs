use std::fs;
use tempfile::tempdir;

#[test]
fn combine_unions_outputs_from_several_runs() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("runs");
    fs::create_dir_all(input.join("d")).expect("mkdir");
    fs::write(
        input.join("mods_index_on_C.csv"),
        "row_id,file_name,Brand\nr1,a.zip,Ibishu\n",
    )
    .expect("write");
    fs::write(
        input.join("d/mods_index_on_D.csv"),
        "row_id,file_name,title\nr2,b.zip,Utah\n",
    )
    .expect("write");
    fs::write(input.join("keys_summary_on_C.csv"), "key_path\nName\n").expect("write");

    let output = tmp.path().join("all.csv");
    assert_cmd::cargo::cargo_bin_cmd!("modzip")
        .current_dir(tmp.path())
        .env("MODZIP_HOME", tmp.path())
        .args(["combine", "--include", "mods_index_on_*.csv", "--add-source-col", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicates::str::contains("rows=2"));

    let text = fs::read_to_string(&output).expect("read");
    assert_eq!(
        text,
        "row_id,file_name,Brand,source_file,title\n\
         r2,b.zip,,mods_index_on_D.csv,Utah\n\
         r1,a.zip,Ibishu,mods_index_on_C.csv,\n"
    );
}

#[test]
fn combine_without_matches_fails() {
    let tmp = tempdir().expect("tempdir");
    assert_cmd::cargo::cargo_bin_cmd!("modzip")
        .current_dir(tmp.path())
        .env("MODZIP_HOME", tmp.path())
        .arg("combine")
        .arg("-i")
        .arg(tmp.path())
        .arg("-o")
        .arg(tmp.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("no CSV files"));
}
