use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

/// A 1x1 edition-2 temperature grid with a constant field (pack width 0).
fn minimal_grib2_message() -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();

    // section 1
    body.extend_from_slice(&21u32.to_be_bytes());
    body.push(1);
    body.extend_from_slice(&98u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&[2, 1, 1]);
    body.extend_from_slice(&2021u16.to_be_bytes());
    body.extend_from_slice(&[5, 17, 12, 0, 0]);
    body.extend_from_slice(&[0, 1]);

    // section 3: 1x1 lat/lon grid
    body.extend_from_slice(&72u32.to_be_bytes());
    body.push(3);
    body.push(0);
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&[0, 0]);
    body.extend_from_slice(&0u16.to_be_bytes());
    body.push(6);
    body.push(0);
    body.extend_from_slice(&0u32.to_be_bytes());
    body.push(0);
    body.extend_from_slice(&0u32.to_be_bytes());
    body.push(0);
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&45_000_000u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.push(0x30);
    body.extend_from_slice(&45_000_000u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&1_000_000u32.to_be_bytes());
    body.extend_from_slice(&1_000_000u32.to_be_bytes());
    body.push(0);

    // section 4: template 4.0, temperature at 2 m
    body.extend_from_slice(&34u32.to_be_bytes());
    body.push(4);
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&[0, 0, 96, 0, 0]);
    body.extend_from_slice(&0u16.to_be_bytes());
    body.push(0);
    body.push(1);
    body.extend_from_slice(&6u32.to_be_bytes());
    body.push(103);
    body.push(0);
    body.extend_from_slice(&2u32.to_be_bytes());
    body.push(255);
    body.push(0);
    body.extend_from_slice(&0u32.to_be_bytes());

    // section 5: template 5.0, constant field
    body.extend_from_slice(&21u32.to_be_bytes());
    body.push(5);
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&285.0f32.to_bits().to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.push(0);
    body.push(0);

    // section 6: no bitmap
    body.extend_from_slice(&6u32.to_be_bytes());
    body.push(6);
    body.push(255);

    // section 7: empty payload for a constant field
    body.extend_from_slice(&5u32.to_be_bytes());
    body.push(7);

    let total_len = (16 + body.len() + 4) as u64;
    let mut msg: Vec<u8> = Vec::new();
    msg.extend_from_slice(b"GRIB");
    msg.extend_from_slice(&[0, 0, 0, 2]);
    msg.extend_from_slice(&total_len.to_be_bytes());
    msg.extend_from_slice(&body);
    msg.extend_from_slice(b"7777");
    msg
}

#[test]
fn converts_a_grib2_file_to_grib1() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.grib2");
    let output = dir.path().join("output.grib1");
    fs::write(&input, minimal_grib2_message()).unwrap();

    let mut cmd = Command::cargo_bin("grib2to1").unwrap();
    cmd.arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Number of GRIB1 grids written to output: 1",
        ));

    let out = fs::read(&output).unwrap();
    assert_eq!(&out[0..4], b"GRIB");
    assert_eq!(out[7], 1);
    assert_eq!(&out[out.len() - 4..], b"7777");
}

#[test]
fn missing_arguments_fail() {
    let mut cmd = Command::cargo_bin("grib2to1").unwrap();
    cmd.assert().failure();
}
