use std::fmt;

use crate::error::{AnalyzerError, Result};

/// Approximation factor ε of a run, stored in thousandths so it can serve as
/// an exact, ordered map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epsilon(u32);

impl Epsilon {
    pub const fn from_thousandths(thousandths: u32) -> Self {
        Epsilon(thousandths)
    }

    /// ε from a file name suffix. The suffix `"10"` means the exact value 1;
    /// any other digit string `s` reads as `0.s` (`"45"` → 0.45, `"05"` → 0.05).
    pub fn from_suffix(digits: &str) -> Result<Self> {
        if digits == "10" {
            return Ok(Epsilon(1000));
        }
        if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnalyzerError::BadFileName(format!(
                "unsupported epsilon suffix: e{digits}"
            )));
        }
        let mut thousandths: u32 = digits
            .parse()
            .map_err(|_| AnalyzerError::BadFileName(format!("unsupported epsilon suffix: e{digits}")))?;
        for _ in digits.len()..3 {
            thousandths *= 10;
        }
        Ok(Epsilon(thousandths))
    }

    /// ε from its decimal form in a log line, e.g. `"0.45"` or `"1"`.
    /// Values are rounded to thousandths.
    pub fn parse(text: &str) -> Option<Self> {
        let value: f64 = text.parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(Epsilon((value * 1000.0).round() as u32))
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl fmt::Display for Epsilon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // n/1000 round-trips through the shortest f64 form ("0.45", "1")
        write!(f, "{}", self.value())
    }
}

/// Composite key identifying one experiment run: quadtree depth bound `d` and
/// approximation factor ε. Ordered by `d`, then ε.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey {
    pub d: u32,
    pub eps: Epsilon,
}

impl RunKey {
    pub fn new(d: u32, eps: Epsilon) -> Self {
        RunKey { d, eps }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d={}, e={}", self.d, self.eps)
    }
}
