//! Fee schedule loaded from disk
//!
//! GREEN when:
//! - a commissions file on disk loads into a working evaluator.
//! - a 1-lot open at 4000.00 with multiple 10 and ratio 0.05 needs exactly
//!   2,000.00 margin and 10.00 commission.
//! - a missing or malformed file is an error naming the path, not a panic.

use std::io::Write;

use simx_calendar::Instrument;
use simx_fees::{FeeEvaluator, FutureFeeEvaluator, OffsetFlag, Side};
use simx_price::Price;

const SCHEDULE: &str = r#"{
    "commodities": {
        "ru": {
            "price_tick": "1.00", "volume_multiple": 10,
            "long_margin_ratio": 0.05, "short_margin_ratio": 0.05,
            "open_by_volume": "10.00", "close_by_volume": "10.00"
        }
    }
}"#;

#[test]
fn loads_schedule_and_prices_an_open() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCHEDULE.as_bytes()).unwrap();

    let eval = FutureFeeEvaluator::from_file(file.path()).unwrap();
    let ru: Instrument = "shfe.ru1901".parse().unwrap();

    assert_eq!(eval.price_tick(&ru).unwrap(), Price::units(1));
    let quote = eval
        .compute(&ru, 1, Price::units(4000), Side::Buy, OffsetFlag::Open)
        .unwrap();
    assert_eq!(quote.margin, Price::units(2000));
    assert_eq!(quote.commission, Price::units(10));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = FutureFeeEvaluator::from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ \"commodities\": 7 }").unwrap();
    let err = FutureFeeEvaluator::from_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("parse commissions file failed"));
}
