// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn mandel() -> Command {
    Command::cargo_bin("mandel").unwrap()
}

fn stdout_of(args: &[&str]) -> String {
    let output = mandel().args(args).output().unwrap();
    assert!(output.status.success(), "mandel {:?} failed", args);
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn small_render_goes_to_stdout() {
    let text = stdout_of(&["--size", "4x4", "--iterations", "50"]);
    assert!(text.starts_with("P3\n4 4\n255\n"));
    let pixels: Vec<&str> = text.lines().skip(3).collect();
    assert_eq!(pixels.len(), 16);
    for line in pixels {
        let channels: Vec<u8> = line.split(' ').map(|c| c.parse().unwrap()).collect();
        assert_eq!(channels.len(), 3);
    }
}

#[test]
fn thread_count_does_not_change_the_image() {
    let one = stdout_of(&["-s", "24x16", "-i", "100", "-t", "1"]);
    let four = stdout_of(&["-s", "24x16", "-i", "100", "-t", "4"]);
    assert_eq!(one, four);
}

#[test]
fn negative_center_is_accepted() {
    let text = stdout_of(&["-s", "3x2", "-i", "20", "--center", "-1.25,-0.1"]);
    assert_eq!(text.lines().count(), 3 + 6);
}

#[test]
fn ppm_file_holds_the_same_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.ppm");
    mandel()
        .args(&["-s", "8x6", "-i", "40", "-o"])
        .arg(&path)
        .assert()
        .success();
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, stdout_of(&["-s", "8x6", "-i", "40"]));
}

#[test]
fn png_output_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.png");
    mandel()
        .args(&["-s", "10x10", "-i", "40", "-o"])
        .arg(&path)
        .assert()
        .success();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn zero_threads_are_rejected() {
    mandel()
        .args(&["-s", "4x4", "-t", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Thread count must be between").from_utf8());
}

#[test]
fn malformed_size_is_rejected() {
    mandel()
        .args(&["--size", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse output image size").from_utf8());
}

#[test]
fn unwritable_output_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.ppm");
    mandel()
        .args(&["-s", "4x4", "-o"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not open output").from_utf8());
}

#[test]
fn unknown_image_format_is_rejected_before_rendering() {
    let dir = tempdir().unwrap();
    for name in &["out.xyz", "out"] {
        let path = dir.path().join(name);
        mandel()
            .args(&["-s", "4x4", "-o"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Could not open output").from_utf8());
        assert!(!path.exists());
    }
}
