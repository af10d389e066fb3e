//! Interpolation Resolver
//!
//! Resolves a scalar from a reference chart by exact match or linear
//! interpolation between the bracketing cells of one `(table, condition)`
//! series. Never extrapolates: an input outside the tabulated domain is an
//! `OutOfRange` error that each calculator handles with its own fallback.

use crate::data::LookupStore;
use crate::error::{EngineError, EngineResult};

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Chart resolver over a read-only [`LookupStore`]
#[derive(Clone, Copy)]
pub struct InterpolationResolver<'a> {
    store: &'a dyn LookupStore,
}

impl<'a> InterpolationResolver<'a> {
    pub fn new(store: &'a dyn LookupStore) -> Self {
        Self { store }
    }

    /// Resolve `table_name` at `input_value` within the `condition` series
    ///
    /// Algorithm:
    /// 1. Exact cell → stored output, unrounded
    /// 2. Closest lower and upper cells of the same series
    /// 3. Either missing → `OutOfRange`
    /// 4. `y = y1 + (x - x1) * (y2 - y1) / (x2 - x1)`, rounded to 2 decimals
    pub fn resolve(
        &self,
        table_name: &str,
        input_value: f64,
        condition: Option<&str>,
    ) -> EngineResult<f64> {
        if !input_value.is_finite() {
            return Err(EngineError::out_of_range(table_name, condition, input_value));
        }

        if let Some(exact) = self.store.get(table_name, input_value, condition) {
            return Ok(exact.output_value);
        }

        let lower = self.store.floor(table_name, condition, input_value);
        let upper = self.store.ceil(table_name, condition, input_value);

        let (lower, upper) = match (lower, upper) {
            (Some(l), Some(u)) => (l, u),
            _ => return Err(EngineError::out_of_range(table_name, condition, input_value)),
        };

        let (x1, y1) = (lower.input_value, lower.output_value);
        let (x2, y2) = (upper.input_value, upper.output_value);

        if x2 == x1 {
            return Ok(y1);
        }

        let y = y1 + (input_value - x1) * (y2 - y1) / (x2 - x1);
        Ok(round_to(y, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChartStore, LookupEntry};
    use approx::assert_relative_eq;

    fn series() -> ChartStore {
        ChartStore::from_entries(vec![
            LookupEntry::new("ex", 50.0, Some("8thLeaf"), 85.0),
            LookupEntry::new("ex", 60.0, Some("8thLeaf"), 88.0),
            LookupEntry::new("ex", 80.0, Some("8thLeaf"), 94.0),
            LookupEntry::new("ex", 100.0, Some("8thLeaf"), 100.0),
            LookupEntry::new("ex", 50.0, Some("2ndLeaf"), 60.0),
            LookupEntry::new("ex", 100.0, Some("2ndLeaf"), 100.0),
            LookupEntry::new("factor", 1.0 / 3.0, None, 0.123456),
        ])
    }

    #[test]
    fn test_exact_match_returns_stored_value() {
        let store = series();
        let resolver = InterpolationResolver::new(&store);
        assert_eq!(resolver.resolve("ex", 60.0, Some("8thLeaf")).unwrap(), 88.0);
        // Not rounded beyond the stored value
        assert_eq!(resolver.resolve("factor", 1.0 / 3.0, None).unwrap(), 0.123456);
    }

    #[test]
    fn test_linear_interpolation() {
        let store = series();
        let resolver = InterpolationResolver::new(&store);
        // 70% stand between (60, 88) and (80, 94)
        assert_relative_eq!(resolver.resolve("ex", 70.0, Some("8thLeaf")).unwrap(), 91.0, epsilon = 1e-9);
        // Rounded to 2 decimals: 88 + 1 * 6 / 20 = 88.3
        assert_relative_eq!(resolver.resolve("ex", 61.0, Some("8thLeaf")).unwrap(), 88.3, epsilon = 1e-9);
        // Condition selects the series
        assert_relative_eq!(resolver.resolve("ex", 75.0, Some("2ndLeaf")).unwrap(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_midpoint_lies_between_neighbours() {
        let store = series();
        let resolver = InterpolationResolver::new(&store);
        let points: [(f64, f64); 4] = [(50.0, 85.0), (60.0, 88.0), (80.0, 94.0), (100.0, 100.0)];
        for pair in points.windows(2) {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            let mid = resolver.resolve("ex", (x1 + x2) / 2.0, Some("8thLeaf")).unwrap();
            assert!(mid >= y1.min(y2) && mid <= y1.max(y2), "{} not in [{}, {}]", mid, y1, y2);
        }
    }

    #[test]
    fn test_out_of_range_never_extrapolates() {
        let store = series();
        let resolver = InterpolationResolver::new(&store);
        let below = resolver.resolve("ex", 49.9, Some("8thLeaf"));
        assert!(matches!(below, Err(EngineError::OutOfRange { .. })));
        assert!(resolver.resolve("ex", 100.1, Some("8thLeaf")).is_err());
        assert!(resolver.resolve("ex", 70.0, Some("16thLeaf")).is_err());
        assert!(resolver.resolve("ex", 70.0, None).is_err());
        assert!(resolver.resolve("ex", f64::NAN, Some("8thLeaf")).is_err());
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(12.345_67, 2), 12.35, epsilon = 1e-12);
        assert_relative_eq!(round_to(-2.25, 1), -2.3, epsilon = 1e-12);
        assert_relative_eq!(round_to(3.0, 0), 3.0, epsilon = 1e-12);
    }
}
