use serde::{Deserialize, Serialize};

/// Closed or half-open range of elevation values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZRange {
    pub lower: f64,
    pub upper: f64,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl ZRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            include_lower: true,
            include_upper: true,
        }
    }

    pub fn infinite() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn is_infinite(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    /// True when no value can fall inside the range.
    pub fn is_empty(&self) -> bool {
        if self.lower > self.upper {
            return true;
        }
        self.lower == self.upper && !(self.include_lower && self.include_upper)
    }

    pub fn contains(&self, z: f64) -> bool {
        let above = if self.include_lower { z >= self.lower } else { z > self.lower };
        let below = if self.include_upper { z <= self.upper } else { z < self.upper };
        above && below
    }

    pub fn overlaps(&self, other: &ZRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        let lower_ok = if self.include_lower && other.include_upper {
            self.lower <= other.upper
        } else {
            self.lower < other.upper
        };
        let upper_ok = if self.include_upper && other.include_lower {
            other.lower <= self.upper
        } else {
            other.lower < self.upper
        };
        lower_ok && upper_ok
    }
}

impl Default for ZRange {
    fn default() -> Self {
        Self::infinite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinite_contains_everything() {
        let r = ZRange::infinite();
        assert!(r.is_infinite());
        assert!(r.contains(-1e300));
        assert!(r.contains(1e300));
        assert!(r.overlaps(&ZRange::new(5.0, 6.0)));
    }

    #[test]
    fn test_exclusive_bounds() {
        let r = ZRange {
            include_upper: false,
            ..ZRange::new(0.0, 10.0)
        };
        assert!(r.contains(0.0));
        assert!(!r.contains(10.0));
        assert!(!r.overlaps(&ZRange::new(10.0, 12.0)));
        assert!(ZRange::new(10.0, 12.0).overlaps(&ZRange::new(0.0, 10.0)));
    }

    #[test]
    fn test_empty() {
        assert!(ZRange::new(3.0, 1.0).is_empty());
        assert!(!ZRange::new(3.0, 3.0).is_empty());
        let r = ZRange {
            include_lower: false,
            ..ZRange::new(3.0, 3.0)
        };
        assert!(r.is_empty());
        assert!(!r.overlaps(&ZRange::infinite()));
    }
}
