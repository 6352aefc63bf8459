//! One-time verification codes.
//!
//! Every join request receives a fresh [`VerificationCode`] drawn from the
//! operating-system CSPRNG ([`rand::rngs::OsRng`]), so codes cannot be
//! predicted from earlier ones.

use std::fmt;

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 4;

/// A short numeric code mailed to the requester.
///
/// Compared verbatim at confirmation time: no trimming, no case folding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draws a new code of [`CODE_LENGTH`] uniformly random digits.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let code = (0..CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(code)
    }

    /// Wraps a stored code without validation (used when loading rows).
    #[must_use]
    pub fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Returns `true` if `submitted` is exactly this code.
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep codes out of logs.
impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_codes_are_four_digits() {
        for _ in 0..1_000 {
            let code = VerificationCode::generate();
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn digit_distribution_is_uniform() {
        let mut counts = [0u32; 10];
        for _ in 0..10_000 {
            for byte in VerificationCode::generate().as_str().bytes() {
                if let Some(slot) = counts.get_mut(usize::from(byte - b'0')) {
                    *slot += 1;
                }
            }
        }
        // 40k digits, 4k expected per bucket. Chi-square with 9 degrees of
        // freedom; 40.0 sits well past the 0.00001 critical value.
        let expected = 4_000.0_f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| {
                let diff = f64::from(c) - expected;
                diff * diff / expected
            })
            .sum();
        assert!(counts.iter().all(|&c| c > 0), "a digit was never produced");
        assert!(chi_square < 40.0, "chi-square too large: {chi_square}");
    }

    #[test]
    fn debug_hides_code() {
        let code = VerificationCode::from_stored("1234".to_string());
        assert!(!format!("{code:?}").contains("1234"));
    }

    proptest! {
        #[test]
        fn matches_only_exact_input(submitted in "\\PC{0,6}") {
            let code = VerificationCode::from_stored("0420".to_string());
            prop_assert_eq!(code.matches(&submitted), submitted == "0420");
        }

        #[test]
        fn padded_input_never_matches(pad in "[ \t]{1,3}") {
            let code = VerificationCode::from_stored("0420".to_string());
            let padded = format!("{pad}0420");
            prop_assert!(!code.matches(&padded));
        }
    }
}
