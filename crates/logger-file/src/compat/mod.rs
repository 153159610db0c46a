//! Compatibility bridges for other logging crates

#[cfg(feature = "log-compat")]
pub mod log_bridge;

#[cfg(feature = "tracing-compat")]
pub mod tracing_bridge;

/// Category for a Rust module path: `a::b::c` becomes `a.b.c`.
#[cfg(any(feature = "log-compat", feature = "tracing-compat"))]
fn category_for_target(target: &str) -> String {
    target.replace("::", ".")
}

#[cfg(feature = "log-compat")]
pub use log_bridge::{LogBridge, init_log_bridge};

#[cfg(feature = "tracing-compat")]
pub use tracing_bridge::{TracingBridge, init_tracing_bridge};
