use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const CONFIG: &str = r#"{
    "type": "heg",
    "n_up": 2,
    "n_dn": 2,
    "r_s": 1.0,
    "rcut_vars": [1.0],
    "eps_vars": [0.1],
    "eps_var_ham_old_ratio": 0.5,
    "eps_var_ham_new_ratio": 0.2
}"#;

#[test]
fn help() {
    Command::cargo_bin("hegci")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Run the variational stage for a configuration file",
        ));
}

#[test]
fn run_prints_the_energy_lines() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("config.json");
    config.write_str(CONFIG).unwrap();

    Command::cargo_bin("hegci")
        .unwrap()
        .arg("run")
        .arg(config.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Heat-Bath Configuration Interaction")
                .and(predicate::str::contains("number of orbitals: 14"))
                .and(predicate::str::contains("HF energy:"))
                .and(predicate::str::contains("Number of new / total dets:"))
                .and(predicate::str::contains("Variation energy:"))
                .and(predicate::str::contains("Final variation energy:"))
                .and(predicate::str::contains("START variation"))
                .and(predicate::str::contains("END variation")),
        );
}

#[test]
fn workers_produce_the_same_summary_lines() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("config.json");
    config.write_str(CONFIG).unwrap();

    Command::cargo_bin("hegci")
        .unwrap()
        .arg("run")
        .arg(config.path())
        .args(["--workers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Final variation energy:"));
}

#[test]
fn missing_config_file_fails() {
    Command::cargo_bin("hegci")
        .unwrap()
        .args(["run", "does-not-exist.json"])
        .assert()
        .failure();
}
