//! Frame timestamps: integer seconds plus a sub-second rational, with a
//! distinguished `UNKNOWN_SUBSECOND` value (§3.2).

/// A sub-second offset expressed as an exact rational `numerator/denominator`
/// of one second, or the distinguished unknown value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Subsecond(Option<Rational>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Rational {
    pub numerator: u64,
    pub denominator: u64,
}

impl Rational {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        assert!(denominator > 0);
        Rational { numerator, denominator }
    }

    pub fn as_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl Subsecond {
    pub const UNKNOWN: Subsecond = Subsecond(None);

    pub fn known(r: Rational) -> Self {
        Subsecond(Some(r))
    }

    pub fn from_seconds(seconds: f64) -> Self {
        // Represent with a denominator of 1e9 (nanosecond resolution), which
        // is finer than any format's actual resolution and avoids picking a
        // format-specific denominator here.
        let numerator = (seconds.rem_euclid(1.0) * 1_000_000_000.0).round() as u64;
        Subsecond(Some(Rational::new(numerator, 1_000_000_000)))
    }

    pub fn is_unknown(self) -> bool {
        self.0.is_none()
    }

    pub fn as_f64(self) -> Option<f64> {
        self.0.map(Rational::as_f64)
    }

    pub fn rational(self) -> Option<Rational> {
        self.0
    }
}

/// A frame timestamp: whole seconds since the Unix epoch, plus sub-second
/// offset (possibly unknown).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Timestamp {
    pub seconds: i64,
    pub subsecond: Subsecond,
}

impl Timestamp {
    pub fn new(seconds: i64, subsecond: Subsecond) -> Self {
        Timestamp { seconds, subsecond }
    }

    pub fn is_partial(self) -> bool {
        self.subsecond.is_unknown()
    }

    /// Add an exact number of seconds (as a rational), normalising the
    /// result so `subsecond` stays in `[0, 1)` and any overflow carries
    /// into `seconds`. Returns `UNKNOWN` subsecond if either side is unknown.
    pub fn add_seconds(self, delta: Rational) -> Timestamp {
        self.add_seconds_f64(delta.as_f64())
    }

    /// Add an arbitrary (possibly >1s) number of seconds, normalising the
    /// result so `subsecond` stays in `[0, 1)`. Returns `UNKNOWN` subsecond
    /// unchanged if the receiver's subsecond is unknown.
    pub fn add_seconds_f64(self, delta: f64) -> Timestamp {
        let Some(sub) = self.subsecond.as_f64() else {
            return self;
        };
        let total = sub + delta;
        let carry = total.floor();
        let frac = total - carry;
        Timestamp {
            seconds: self.seconds + carry as i64,
            subsecond: Subsecond::from_seconds(frac),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subsecond_marks_partial() {
        let ts = Timestamp::new(100, Subsecond::UNKNOWN);
        assert!(ts.is_partial());
    }

    #[test]
    fn known_subsecond_not_partial() {
        let ts = Timestamp::new(100, Subsecond::from_seconds(0.5));
        assert!(!ts.is_partial());
        assert!((ts.subsecond.as_f64().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn add_seconds_carries_into_whole_seconds() {
        let ts = Timestamp::new(10, Subsecond::from_seconds(0.75));
        let out = ts.add_seconds(Rational::new(1, 2)); // +0.5s
        assert_eq!(out.seconds, 11);
        assert!((out.subsecond.as_f64().unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn add_seconds_on_unknown_stays_unknown() {
        let ts = Timestamp::new(10, Subsecond::UNKNOWN);
        let out = ts.add_seconds(Rational::new(1, 2));
        assert!(out.subsecond.is_unknown());
        assert_eq!(out.seconds, 10);
    }
}
