//! Log sink for the provisioning binary.

use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Builds a stderr logger printing `timestamp - LEVEL - message` lines.
///
/// Defaults to `info`; `RUST_LOG` overrides the filter.
pub fn builder() -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        });
    builder
}

/// Installs the logger. Later calls are no-ops.
pub fn init() {
    let _ = builder().try_init();
}
