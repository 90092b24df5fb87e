use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Install a logger once per test binary; `RUST_LOG` overrides the default.
pub fn init_test_logger() {
    INIT.call_once(|| {
        let mut builder = Builder::new();
        builder
            .filter_level(LevelFilter::Info)
            .filter_module("dictionaries", LevelFilter::Info)
            .format_timestamp_millis()
            .is_test(true)
            .parse_default_env();
        // Another harness may already have installed a logger.
        let _ = builder.try_init();
    });
}
