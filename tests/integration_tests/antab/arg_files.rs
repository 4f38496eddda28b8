// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! This module tests the "antab" command-line interface with toml and json
//! argument files.

use std::io::Write;

use tempfile::tempdir;

use crate::{
    absolute_test_files, antabfs, get_cmd_output, make_file_in_dir, read_antab, EXPECTED_ANTAB,
    LOG_FILE,
};

#[test]
fn arg_file_toml_and_json() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let (log, rxg) = absolute_test_files();

    let toml_output = temp_dir.path().join("toml.antabfs");
    let (toml, mut toml_file) = make_file_in_dir("antab.toml", temp_dir.path());
    write!(
        toml_file,
        "log_file = {:?}\nrxg_dir = {:?}\noutput = {:?}\n",
        log,
        rxg,
        toml_output.display().to_string()
    )
    .unwrap();
    drop(toml_file);
    let cmd = antabfs()
        .arg("antab")
        .arg(toml.display().to_string())
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert_eq!(read_antab(&toml_output), EXPECTED_ANTAB);

    let json_output = temp_dir.path().join("json.antabfs");
    let (json, mut json_file) = make_file_in_dir("antab.json", temp_dir.path());
    write!(
        json_file,
        "{{\"log_file\": {:?}, \"rxg_dir\": {:?}, \"output\": {:?}}}",
        log,
        rxg,
        json_output.display().to_string()
    )
    .unwrap();
    drop(json_file);
    let cmd = antabfs()
        .arg("antab")
        .arg(json.display().to_string())
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert_eq!(read_antab(&json_output), EXPECTED_ANTAB);
}

#[test]
fn cli_args_override_the_arg_file() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let (_, rxg) = absolute_test_files();

    let file_output = temp_dir.path().join("file.antabfs");
    let cli_output = temp_dir.path().join("cli.antabfs");
    let (toml, mut toml_file) = make_file_in_dir("antab.toml", temp_dir.path());
    write!(
        toml_file,
        "rxg_dir = {:?}\noutput = {:?}\n",
        rxg,
        file_output.display().to_string()
    )
    .unwrap();
    drop(toml_file);

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            &toml.display().to_string(),
            "-o", &cli_output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert!(!file_output.exists());
    assert_eq!(read_antab(&cli_output), EXPECTED_ANTAB);
}

#[test]
fn save_toml_can_be_reused() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");
    let (log, rxg) = absolute_test_files();
    let output = temp_dir.path().join("out.antabfs");
    let saved = temp_dir.path().join("saved.toml");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            &log,
            "--rxg-dir", &rxg,
            "-o", &output.display().to_string(),
            "--save-toml", &saved.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert!(saved.exists());
    assert!(!output.exists());

    let cmd = antabfs()
        .arg("antab")
        .arg(saved.display().to_string())
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert_eq!(read_antab(&output), EXPECTED_ANTAB);
}

#[test]
fn bad_arg_files() {
    let temp_dir = tempdir().expect("Couldn't make tempdir");

    let (toml, mut toml_file) = make_file_in_dir("antab.toml", temp_dir.path());
    write!(toml_file, "max_tsys = \"lots\"\n").unwrap();
    drop(toml_file);
    let cmd = antabfs()
        .arg("antab")
        .arg(LOG_FILE)
        .arg(toml.display().to_string())
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Couldn't decode toml structure"));

    let (yaml, _) = make_file_in_dir("antab.yaml", temp_dir.path());
    let cmd = antabfs()
        .arg("antab")
        .arg(LOG_FILE)
        .arg(yaml.display().to_string())
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("doesn't have a recognised file extension"));
}
