//! Fuzz target for metric selector parsing.
//!
//! Tests that `MetricSelector::from_str` handles arbitrary input without
//! panicking and that accepted selectors survive a Display round trip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nm_history::MetricSelector;

fuzz_target!(|data: &str| {
    if let Ok(selector) = data.parse::<MetricSelector>() {
        let reparsed: MetricSelector = selector
            .to_string()
            .parse()
            .expect("displayed selector must parse");
        assert_eq!(reparsed, selector);
    }
});
