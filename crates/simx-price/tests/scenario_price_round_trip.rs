//! Price round-trip
//!
//! GREEN when:
//! - every decimal with at most four fractional digits survives
//!   `from_f64` → `to_f64` unchanged.
//! - the display form re-parses to the same fixed-point value.
//! - `None` ("not available") never turns into a number on the way through text.

use simx_price::{format_price, parse_price, Price};

const SAMPLES: &[f64] = &[
    0.0, 0.0001, 0.01, 0.5, 1.2345, 3.1416, 12.5, 99.99, 4000.0, 4012.2, 10_000.0001,
    123_456.789, -0.0001, -2.5, -4012.2,
];

#[test]
fn decimal_round_trip_is_exact() {
    for &x in SAMPLES {
        let p = Price::from_f64(x).unwrap();
        assert_eq!(p.to_f64(), x, "round-trip failed for {x}");
    }
}

#[test]
fn every_raw_value_in_a_window_round_trips() {
    // Dense sweep across a band where binary error is most visible.
    for raw in 12_000i64..13_000 {
        let p = Price::new(raw);
        assert_eq!(Price::from_f64(p.to_f64()).unwrap(), p, "raw {raw}");
    }
}

#[test]
fn display_text_reparses_to_same_price() {
    for &x in SAMPLES {
        let p = Price::from_f64(x).unwrap();
        let text = p.to_string();
        assert_eq!(parse_price(&text).unwrap(), Some(p), "text {text}");
    }
}

#[test]
fn not_available_survives_text() {
    let text = format_price(None);
    assert_eq!(text, "N/A");
    assert_eq!(parse_price(&text).unwrap(), None);
}
