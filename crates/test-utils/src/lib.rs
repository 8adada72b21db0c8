//! Shared test utilities for the tile-mosaic workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Tracing initialisation for tests
//! - Grid data generators
//! - Tile and tile-set fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your integration tests:
//!
//! ```ignore
//! use test_utils::{init_tracing, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

use tracing_subscriber::{fmt, EnvFilter};

/// Install a log subscriber writing through the test harness.
///
/// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Asserts that two pixel buffers hold the same bits, NaN included.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_pixels_eq;
///
/// assert_pixels_eq!(coverage.band(0), expected.as_slice());
/// ```
#[macro_export]
macro_rules! assert_pixels_eq {
    ($left:expr, $right:expr) => {{
        let left: &[f32] = $left;
        let right: &[f32] = $right;
        assert_eq!(left.len(), right.len(), "pixel counts differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if l.to_bits() != r.to_bits() && !(l.is_nan() && r.is_nan()) {
                panic!("pixel {} differs: left `{:?}`, right `{:?}`", i, l, r);
            }
        }
    }};
}
