//! Adaptive sub-step control.

use mp_core::{IOTA, Real, same_fraction};
use serde::{Deserialize, Serialize};

/// Sub-stepping parameters of a step, as fractions of one increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubstepControl {
    /// Fraction tried first when a step is entered.
    #[serde(default = "default_initial")]
    pub initial: Real,
    /// Smallest admissible fraction.
    #[serde(default = "default_minimal")]
    pub minimal: Real,
    /// Largest increase of the fraction between two sub-steps.
    #[serde(default = "default_growth")]
    pub growth: Real,
}

fn default_initial() -> Real {
    1.0
}

fn default_minimal() -> Real {
    0.01
}

fn default_growth() -> Real {
    1.0
}

impl Default for SubstepControl {
    fn default() -> Self {
        Self {
            initial: default_initial(),
            minimal: default_minimal(),
            growth: default_growth(),
        }
    }
}

/// Sub-step bookkeeping for the increment in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Substep {
    /// Step-size multiplier requested for the next sub-step.
    pub tnew_dt: Real,
    /// Fraction of the increment already accepted.
    pub tinc: Real,
    /// Fraction attempted by the current sub-step.
    pub dtinc: Real,
    /// Running sub-step size; persists across the increments of a step.
    pub dtinc_cur: Real,
}

impl Default for Substep {
    fn default() -> Self {
        Self {
            tnew_dt: 1.0,
            tinc: 0.0,
            dtinc: 0.0,
            dtinc_cur: 0.0,
        }
    }
}

impl Substep {
    pub fn begin_increment(&mut self) {
        self.tinc = 0.0;
        self.dtinc = 0.0;
    }

    pub fn accept(&mut self) {
        self.tinc += self.dtinc;
    }

    pub fn increment_done(&self) -> bool {
        1.0 - self.tinc < IOTA
    }
}

impl SubstepControl {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.minimal > 0.0 && self.minimal <= self.initial && self.initial <= 1.0) {
            return Err(format!(
                "sub-step fractions must satisfy 0 < minimal <= initial <= 1 (minimal {}, initial {})",
                self.minimal, self.initial
            ));
        }
        if !(self.growth > 0.0) {
            return Err(format!("sub-step growth {} must be positive", self.growth));
        }
        Ok(())
    }

    /// Size the next sub-step from the running size and the requested
    /// multiplier, then consume the multiplier.
    pub fn compute_inc(&self, s: &mut Substep) {
        if s.dtinc_cur <= 0.0 {
            s.dtinc_cur = self.initial;
        }
        if s.tnew_dt < 1.0 {
            s.dtinc_cur = (s.dtinc_cur * s.tnew_dt).max(self.minimal);
        } else if s.tnew_dt > 1.0 {
            s.dtinc_cur = (s.dtinc_cur * s.tnew_dt)
                .min(s.dtinc_cur + self.growth)
                .min(1.0);
        }
        s.dtinc = s.dtinc_cur.min(1.0 - s.tinc);
        s.tnew_dt = 1.0;
    }

    pub fn at_minimal(&self, s: &Substep) -> bool {
        same_fraction(s.dtinc_cur, self.minimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> SubstepControl {
        SubstepControl {
            initial: 0.5,
            minimal: 0.1,
            growth: 0.2,
        }
    }

    #[test]
    fn first_substep_uses_initial_fraction() {
        let mut s = Substep::default();
        control().compute_inc(&mut s);
        assert_eq!(s.dtinc, 0.5);
        assert_eq!(s.tnew_dt, 1.0);
    }

    #[test]
    fn shrinking_stops_at_minimal() {
        let c = control();
        let mut s = Substep::default();
        c.compute_inc(&mut s);
        for _ in 0..10 {
            s.tnew_dt = 0.5;
            c.compute_inc(&mut s);
        }
        assert_eq!(s.dtinc, 0.1);
        assert!(c.at_minimal(&s));
    }

    #[test]
    fn growth_is_bounded_by_growth_increment() {
        let c = control();
        let mut s = Substep::default();
        c.compute_inc(&mut s);
        s.tnew_dt = 2.0;
        c.compute_inc(&mut s);
        assert!((s.dtinc_cur - 0.7).abs() < 1e-15);
    }

    #[test]
    fn last_substep_is_clipped_to_the_remaining_fraction() {
        let c = control();
        let mut s = Substep::default();
        c.compute_inc(&mut s);
        s.accept();
        s.tnew_dt = 2.0;
        c.compute_inc(&mut s);
        assert_eq!(s.dtinc, 0.5);
        s.accept();
        assert!(s.increment_done());
    }

    #[test]
    fn validation_rejects_inverted_fractions() {
        let bad = SubstepControl {
            initial: 0.1,
            minimal: 0.5,
            growth: 1.0,
        };
        assert!(bad.validate().is_err());
        assert!(SubstepControl::default().validate().is_ok());
    }
}
