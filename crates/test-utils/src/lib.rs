//! Fixtures, document generators and assertions shared by the client test suites.
//!
//! Pulled in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a fixture via [`find_test_file`], or return from the calling test
/// with a skip notice when it is absent.
///
/// ```ignore
/// let path = require_test_file!("geoserver_wfs_110_capabilities.xml");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: fixture '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    };
}

/// `|left - right| <= epsilon`, both sides widened to `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "assertion failed: {} is not within {} of {}",
            left,
            epsilon,
            right
        );
    }};
}

/// [`assert_approx_eq!`] applied to both ordinates of an `(x, y)` pair.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_epsilon() {
        assert_approx_eq!(-73.98551, -73.9855, 1e-4);
        assert_approx_eq!(0.0_f32, 0.0, 0.0);
        assert_coords_approx_eq!((40.7484, -73.9857), (40.74841, -73.98569), 1e-4);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_approx_outside_epsilon() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_coords_check_second_ordinate() {
        assert_coords_approx_eq!((1.0, 2.5), (1.0, 2.0), 0.1);
    }
}
