use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const MANIFEST: &str = r#"
precision_bits: 256
engines:
  - name: Booster
    mass: "200"
    exhaust_velocity: "3000"
  - name: Kick
    mass: 50
    exhaust_velocity: 4500.0
ships:
  - name: Zephyr
    stages:
      - engine: Booster
        dry_mass: "1000"
        fuel_mass: "9000"
      - engine: Kick
        dry_mass: "100"
        fuel_mass: "900"
  - name: Ant
    stages:
      - engine: Kick
        dry_mass: "10"
        fuel_mass: "40"
"#;

fn write_manifest(dir: &Path) -> String {
    let path = dir.join("fleet.yaml");
    fs::write(&path, MANIFEST).expect("manifest write");
    path.to_str().unwrap().to_string()
}

fn ship_report() -> Command {
    Command::cargo_bin("ship_report").expect("ship_report bin")
}

#[test]
fn text_report_covers_every_ship_in_name_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_manifest(dir.path());

    let output = ship_report()
        .args(["--manifest", &manifest])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Stage Budget ("))
        .stdout(predicate::str::contains("Ship: Ant"))
        .stdout(predicate::str::contains("Ship: Zephyr"))
        .stdout(predicate::str::contains("Mass: 11250.000000 kg"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let ant = text.find("Ship: Ant").unwrap();
    let zephyr = text.find("Ship: Zephyr").unwrap();
    assert!(ant < zephyr);
}

#[test]
fn json_report_for_a_single_ship() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_manifest(dir.path());

    let output = ship_report()
        .args(["--manifest", &manifest, "--ship", "Zephyr", "--format", "json", "--exact"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    let reports = parsed.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["ship"], "Zephyr");
    assert_eq!(reports[0]["precision_bits"], 256);
    assert_eq!(reports[0]["stages"].as_array().unwrap().len(), 2);
    assert!(reports[0]["delta_v_m_s"]["exact"].is_string());
    let dv = reports[0]["delta_v_m_s"]["value"].as_f64().unwrap();
    let m0: f64 = 11250.0;
    let expected = 3000.0 * (m0 / (m0 - 9000.0)).ln() + 4500.0 * (1050.0f64 / 150.0).ln();
    assert!((dv - expected).abs() / expected < 1e-9, "dv = {dv}");
}

#[test]
fn csv_report_written_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_manifest(dir.path());
    let out = dir.path().join("reports/budget.csv");

    ship_report()
        .args([
            "--manifest",
            &manifest,
            "--format",
            "csv",
            "--precision",
            "128",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&out).expect("csv output");
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("ship,stage,engine,"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn list_engines_prints_the_registry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_manifest(dir.path());

    ship_report()
        .args(["--manifest", &manifest, "--list-engines"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Engines (256 bits) ==="))
        .stdout(predicate::str::contains("Booster"))
        .stdout(predicate::str::contains("v_e = 4500.000000 m/s"));
}

#[test]
fn unknown_ship_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_manifest(dir.path());

    ship_report()
        .args(["--manifest", &manifest, "--ship", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nope"));
}

#[test]
fn broken_manifest_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.yaml");
    fs::write(
        &path,
        "engines:\n  - name: Booster\n    mass: \"12kg\"\n    exhaust_velocity: \"3000\"\n",
    )
    .unwrap();

    ship_report()
        .args(["--manifest", path.to_str().unwrap()])
        .assert()
        .failure();

    let unsupported = dir.path().join("fleet.json");
    fs::write(&unsupported, "{}").unwrap();
    ship_report()
        .args(["--manifest", unsupported.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported manifest format"));
}
