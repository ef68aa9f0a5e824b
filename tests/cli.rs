use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn bin(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("narod-migrate").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn version_flag_prints_and_exits() {
    let td = tempfile::tempdir().unwrap();
    bin(td.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("narod-migrate v"));
}

#[test]
fn fetch_skips_everything_already_recorded() {
    let td = tempfile::tempdir().unwrap();
    fs::write(
        td.path().join("files.json"),
        r#"[{"name":"a.pdf","size":10},{"name":"b.pdf","size":20}]"#,
    )
    .unwrap();
    fs::write(td.path().join("download_progress.txt"), "a.pdf\nb.pdf\n").unwrap();

    // every name is in the progress log, so the run completes offline
    bin(td.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files to download: 2"))
        .stdout(predicate::str::contains("Already downloaded: 2"))
        .stdout(predicate::str::contains("Newly downloaded:   0"))
        .stdout(predicate::str::contains("Failed:             0"));
}

#[test]
fn malformed_manifest_is_a_startup_failure() {
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join("files.json"), "{ not json").unwrap();

    bin(td.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("files.json"));
}

#[test]
fn fix_links_localizes_and_audits() {
    let td = tempfile::tempdir().unwrap();
    fs::write(
        td.path().join("index.htm"),
        r#"<a href="http://www.abdikamalov.narod.ru/abdikamalov/paper.pdf">p</a>"#,
    )
    .unwrap();
    fs::write(
        td.path().join("files.json"),
        r#"[{"name":"paper.pdf","size":10}]"#,
    )
    .unwrap();

    bin(td.path())
        .arg("fix-links")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed links and typos"))
        .stdout(predicate::str::contains(
            "All referenced files are present",
        ));

    let page = fs::read_to_string(td.path().join("index.htm")).unwrap();
    assert!(page.contains(r#"href="files/paper.pdf""#));
}

#[test]
fn retarget_moves_links_to_the_new_domain() {
    let td = tempfile::tempdir().unwrap();
    fs::write(
        td.path().join("index.htm"),
        r#"<a href="http://abdikamalov.narod.ru/sh/140.html">x</a>"#,
    )
    .unwrap();

    bin(td.path())
        .arg("retarget")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated index.htm - 1 changes"))
        .stdout(predicate::str::contains("new/index.html not found, skipped"))
        .stdout(predicate::str::contains("Link update complete"));

    let page = fs::read_to_string(td.path().join("index.htm")).unwrap();
    assert!(page.contains("https://abdikamalov.com/sh/140.html"));
}

#[test]
fn audit_reports_missing_references() {
    let td = tempfile::tempdir().unwrap();
    fs::write(
        td.path().join("index.htm"),
        r#"<a href="files/a.pdf">a</a><a href="files/gone.pdf">g</a>"#,
    )
    .unwrap();
    fs::write(td.path().join("files.json"), r#"[{"name":"a.pdf"}]"#).unwrap();

    bin(td.path())
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total file references: 2"))
        .stdout(predicate::str::contains("- gone.pdf"));
}
