use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

/// Stored amount in euro cents.
///
/// Personal and group expenses keep this exact value; settlement works on
/// [`MoneyCents::as_major`].
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount: MoneyCents = "12,5".parse().unwrap();
/// assert_eq!(amount.cents(), 1250);
/// assert_eq!(amount.to_string(), "€12.50");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);
    /// Largest amount a single expense may carry (€1,000,000,000.00).
    pub const MAX_ENTRY: MoneyCents = MoneyCents(100_000_000_000);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// Sum of `amounts`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidAmount`] when the total does not fit in an `i64`.
    pub fn total(amounts: impl IntoIterator<Item = MoneyCents>) -> ResultEngine<MoneyCents> {
        amounts
            .into_iter()
            .try_fold(MoneyCents::ZERO, MoneyCents::checked_add)
            .ok_or_else(|| EngineError::InvalidAmount("total too large".to_string()))
    }

    /// Amount in euros.
    #[must_use]
    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "€{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// `[+-]EUROS[(.|,)CENTS]`, at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |reason: &str| EngineError::InvalidAmount(format!("{reason}: {:?}", s.trim()));

        let input = s.trim();
        let (negative, digits) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            Some(_) => (false, input),
            None => return Err(reject("empty amount")),
        };

        let (whole, fraction) = match digits.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };
        if !all_digits(whole) || !(fraction.is_empty() || all_digits(fraction)) {
            return Err(reject("invalid amount"));
        }
        let fraction_cents = match fraction.len() {
            0 => 0,
            1 => i64::from(fraction.as_bytes()[0] - b'0') * 10,
            2 => fraction.parse::<i64>().map_err(|_| reject("invalid amount"))?,
            _ => return Err(reject("too many decimals")),
        };

        let cents = whole
            .parse::<i64>()
            .ok()
            .and_then(|euros| euros.checked_mul(100))
            .and_then(|cents| cents.checked_add(fraction_cents))
            .ok_or_else(|| reject("amount too large"))?;

        Ok(MoneyCents(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_eur() {
        assert_eq!(MoneyCents::new(0).to_string(), "€0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "€0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "€0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "€10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-€10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<MoneyCents>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<MoneyCents>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<MoneyCents>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("0.001".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<MoneyCents>().is_err());
        assert!("-".parse::<MoneyCents>().is_err());
        assert!("1.2.3".parse::<MoneyCents>().is_err());
        assert!("1,2.3".parse::<MoneyCents>().is_err());
        assert!(".50".parse::<MoneyCents>().is_err());
        assert!("ten".parse::<MoneyCents>().is_err());
        assert!("99999999999999999999".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn major_units_and_total() {
        assert_eq!(MoneyCents::new(1234).as_major(), 12.34);
        let total = MoneyCents::total([MoneyCents::new(150), MoneyCents::new(250)]).unwrap();
        assert_eq!(total, MoneyCents::new(400));
        assert_eq!(
            MoneyCents::total(std::iter::empty()).unwrap(),
            MoneyCents::ZERO
        );
    }

    #[test]
    fn total_reports_overflow() {
        let huge = MoneyCents::new(i64::MAX / 2 + 1);
        assert!(matches!(
            MoneyCents::total([huge, huge]),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(
            MoneyCents::new(i64::MIN).checked_sub(MoneyCents::new(1)),
            None
        );
    }
}
