// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::{Cursor, Write};
use std::path::Path;

use approx::assert_abs_diff_eq;
use indoc::indoc;
use tempfile::TempDir;

use super::*;

const CAL_YS_C: &str = indoc! {"
    * calYsC.rxg
    *
    * first line: LO values and ranges
    range 4000 4300
    *
    * creation date
    2016 01 01
    *
    * FWHM
    frequency 1.0
    *
    * polarisations
    lcp rcp
    *
    * DPFU
    0.1 0.11
    *
    * gain curve
    ELEV POLY 0.95 2.3e-3 -3.2e-5
    *
    * Tcal table
    lcp 4000.0 10.0
    lcp 4200.0 20.0
    rcp 4000.0 12.0
    rcp 4500.0 14.0
    end_tcal_table
    *
    * Trec
    50.0 52.0
    *
    * spillover
    10.0 15.0
    90.0 5.0
    end_spillover_table
"};

const CAL_YS_X: &str = indoc! {"
    * calYsX.rxg
    fixed 4158
    2018 06 01
    constant 0.1
    rcp
    0.09
    ELEV POLY 1.0
    rcp 8000.0 2.0
    rcp 9000.0 3.0
    end_tcal_table
    40.0
    end_spillover_table
"};

fn parse(contents: &str, name: &str) -> CalibrationCurve {
    parse_rxg(&mut Cursor::new(contents), Path::new(name)).unwrap()
}

#[test]
fn test_parse_rxg() {
    let c = parse(CAL_YS_C, "calYsC.rxg");
    assert_eq!(c.lo, LoApplicability::Range { min: 4000.0, max: 4300.0 });
    assert_eq!(c.date, "2016 01 01");
    assert_eq!(c.fwhm, vec!["frequency", "1.0"]);
    assert_eq!(c.pols, vec![Polarisation::Lcp, Polarisation::Rcp]);
    assert_eq!(c.dpfu, vec!["0.1", "0.11"]);
    assert_eq!(c.gain.variable, "ELEV");
    assert_eq!(c.gain.kind, "POLY");
    assert_eq!(c.gain.coeffs, vec!["0.95", "2.3e-3", "-3.2e-5"]);
    assert_eq!(c.tcal.len(), 4);
    assert_eq!(c.trec, vec![50.0, 52.0]);
    assert_eq!(c.spillover, vec![(10.0, 15.0), (90.0, 5.0)]);
    assert_eq!(c.file_name(), "calYsC.rxg");

    // FWHM lines can have a value for each polarisation.
    let two_fwhms = CAL_YS_C.replace("frequency 1.0", "constant 0.0047 0.0049");
    let c = parse(&two_fwhms, "calYsC.rxg");
    assert_eq!(c.fwhm, vec!["constant", "0.0047", "0.0049"]);
    assert_eq!(c.tcal.len(), 4);
}

#[test]
fn test_parse_rxg_without_trailing_fields() {
    let contents = indoc! {"
        fixed 22000
        0
        constant 0.1
        lcp
        0.1
        ELEV POLY 1.0
        lcp 21000 30.0
        lcp 23000 40.0
        end_tcal_table
    "};
    let c = parse(contents, "calYsK.rxg");
    assert!(c.trec.is_empty());
    assert!(c.spillover.is_empty());
}

#[test]
fn test_rxg_errors() {
    let bad_lo = CAL_YS_C.replace("range 4000 4300", "between 4000 4300");
    let result = parse_rxg(&mut Cursor::new(bad_lo), Path::new("a.rxg"));
    assert!(matches!(result, Err(RxgError::UnknownLoType { line_num: 4, .. })));

    let bad_pol = CAL_YS_C.replace("lcp rcp", "lcp xcp");
    let result = parse_rxg(&mut Cursor::new(bad_pol), Path::new("a.rxg"));
    assert!(matches!(result, Err(RxgError::UnknownPol { .. })));

    let bad_tcal = CAL_YS_C.replace("lcp 4200.0 20.0", "lcp 4200.0");
    let result = parse_rxg(&mut Cursor::new(bad_tcal), Path::new("a.rxg"));
    assert!(matches!(
        result,
        Err(RxgError::Arity {
            field: RxgField::Tcal,
            got: 2,
            ..
        })
    ));

    let bad_float = CAL_YS_C.replace("rcp 4500.0 14.0", "rcp 4500.0 hot");
    let result = parse_rxg(&mut Cursor::new(bad_float), Path::new("a.rxg"));
    assert!(matches!(result, Err(RxgError::ParseFloat { .. })));

    let unterminated = indoc! {"
        fixed 22000
        0
        constant 0.1
        lcp
        0.1
        ELEV POLY 1.0
        lcp 21000 30.0
    "};
    let result = parse_rxg(&mut Cursor::new(unterminated), Path::new("a.rxg"));
    assert!(matches!(
        result,
        Err(RxgError::MissingTerminator {
            field: RxgField::Tcal,
            ..
        })
    ));

    let truncated = "range 4000 4300\n2016 01 01\n";
    let result = parse_rxg(&mut Cursor::new(truncated), Path::new("a.rxg"));
    assert!(matches!(
        result,
        Err(RxgError::MissingField {
            field: RxgField::Fwhm,
            ..
        })
    ));
}

#[test]
fn test_lo_applicability() {
    let fixed = LoApplicability::Fixed(vec![4158.0]);
    assert!(fixed.contains(4158.0));
    assert!(fixed.contains(4150.0));
    assert!(fixed.contains(4168.0));
    assert!(!fixed.contains(4168.5));
    assert!(!fixed.contains(4140.0));

    let range = LoApplicability::Range {
        min: 4000.0,
        max: 4300.0,
    };
    assert!(range.contains(4000.0));
    assert!(range.contains(4300.0));
    assert!(!range.contains(4300.1));
    assert!(!range.contains(3999.0));
}

#[test]
fn test_tcal_interpolation() {
    let c = parse(CAL_YS_C, "calYsC.rxg");
    assert_abs_diff_eq!(c.tcal_at(Polarisation::Lcp, 4100.0).unwrap(), 15.0);
    assert_abs_diff_eq!(c.tcal_at(Polarisation::Lcp, 4000.0).unwrap(), 10.0);
    assert_abs_diff_eq!(c.tcal_at(Polarisation::Rcp, 4250.0).unwrap(), 13.0);
    // Outside of the table's span.
    assert!(c.tcal_at(Polarisation::Lcp, 4300.0).is_none());
    assert!(c.tcal_at(Polarisation::Rcp, 3999.0).is_none());
    assert_eq!(c.tcal_span(), Some((4000.0, 4500.0)));
}

#[test]
fn test_zero_tcal_is_unavailable() {
    let contents = CAL_YS_C
        .replace("lcp 4000.0 10.0", "lcp 4000.0 0.0")
        .replace("lcp 4200.0 20.0", "lcp 4200.0 0.0");
    let c = parse(&contents, "calYsC.rxg");
    assert!(c.tcal_at(Polarisation::Lcp, 4100.0).is_none());
}

#[test]
fn test_catalog_lookup() {
    let catalog = Catalog::from_curves(vec![
        parse(CAL_YS_X, "calYsX.rxg"),
        parse(CAL_YS_C, "calYsC.rxg"),
    ]);
    // Both files apply to 4158 MHz; the first wins.
    assert_eq!(catalog.find(4158.0).unwrap().file_name(), "calYsX.rxg");
    assert_eq!(catalog.find(4100.0).unwrap().file_name(), "calYsC.rxg");
    assert!(catalog.find(4400.0).is_none());

    assert_abs_diff_eq!(
        catalog.tcal(4100.0, Polarisation::Lcp, 4100.0).unwrap(),
        15.0
    );
    assert!(catalog.tcal(22000.0, Polarisation::Lcp, 4100.0).is_none());
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    let mut f = std::fs::File::create(dir.join(name)).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

#[test]
fn test_catalog_load_directory() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    write_file(tmp_dir.path(), "calYsC.rxg", CAL_YS_C);
    // This file doesn't belong to YS, even though it covers the same LO.
    write_file(tmp_dir.path(), "calOnC.rxg", CAL_YS_C);
    // Not an RXG file.
    write_file(tmp_dir.path(), "calYsX.txt", CAL_YS_X);
    // Broken files are skipped.
    write_file(tmp_dir.path(), "calYsB.rxg", "range 1 2\n");

    let catalog =
        Catalog::load(&CatalogConfig::Directory(tmp_dir.path().to_path_buf()), "YS").unwrap();
    assert_eq!(catalog.curves().len(), 1);
    assert_eq!(catalog.curves()[0].file_name(), "calYsC.rxg");

    // A range declaration doesn't match outside of its range, no matter the
    // station code.
    assert!(catalog.find(4400.0).is_none());
}

#[test]
fn test_catalog_load_file_list_ignores_station() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    write_file(tmp_dir.path(), "calOnX.rxg", CAL_YS_X);

    let catalog = Catalog::load(
        &CatalogConfig::Files(vec![tmp_dir.path().join("calOnX.rxg")]),
        "YS",
    )
    .unwrap();
    assert_eq!(catalog.curves().len(), 1);
    assert!(catalog.find(4150.0).is_some());
}

#[test]
fn test_catalog_empty_location_is_fatal() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let result = Catalog::load(&CatalogConfig::Directory(tmp_dir.path().to_path_buf()), "YS");
    assert!(matches!(result, Err(CatalogError::NoFiles { .. })));

    let result = Catalog::load(&CatalogConfig::Files(vec![]), "YS");
    assert!(matches!(result, Err(CatalogError::NoFiles { .. })));
}

#[test]
fn test_station_file_code() {
    assert_eq!(station_file_code("YS"), "Ys");
    assert_eq!(station_file_code("ys"), "Ys");
    assert_eq!(station_file_code(""), "");
}
