use serde::Deserialize;
use serde::Serialize;

/// regret and strategy discounting regimes applied at each
/// discount tick. Static multiplies by fixed factors; Dcfr
/// derives its factors from the tick count and optionally
/// floors negative regrets like CFR+.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum Discount {
    Off,
    Static { alpha: f64, beta: f64 },
    Dcfr { reset: bool },
}

impl Discount {
    /// multiplicative (alpha, beta) for the tick ending at
    /// iteration t, or None when discounting is off
    pub fn factors(&self, t: usize) -> Option<(f64, f64)> {
        match self {
            Discount::Off => None,
            Discount::Static { alpha, beta } => Some((*alpha, *beta)),
            Discount::Dcfr { .. } => {
                let t = t.max(1) as f64;
                let alpha = t.powf(1.5) / (t.powf(1.5) + 1.0);
                let beta = t.powf(2.0) / (t.powf(2.0) + 1.0);
                Some((alpha, beta))
            }
        }
    }

    pub fn resets_negative(&self) -> bool {
        matches!(self, Discount::Dcfr { reset: true })
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::Dcfr { reset: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_yields_nothing() {
        assert!(Discount::Off.factors(100).is_none());
    }

    #[test]
    fn static_is_constant() {
        let discount = Discount::Static {
            alpha: 0.9,
            beta: 0.5,
        };
        assert!(discount.factors(1) == Some((0.9, 0.5)));
        assert!(discount.factors(1_000_000) == Some((0.9, 0.5)));
    }

    #[test]
    fn dcfr_approaches_unity() {
        let discount = Discount::Dcfr { reset: false };
        let (a1, b1) = discount.factors(1).unwrap();
        let (a9, b9) = discount.factors(1_000).unwrap();
        assert!(a1 < a9 && a9 < 1.0);
        assert!(b1 < b9 && b9 < 1.0);
    }
}
