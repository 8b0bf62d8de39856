//! Compiled base58 pattern matching.
//!
//! A [`Subsequence`] decides whether the base58 encoding of a 32-byte public
//! key starts or ends with a pattern without producing the encoded string.
//! The reject path is the hot path: almost every candidate fails on the
//! first examined digit.

use thiserror::Error;

use crate::crypto::base58::{self, POWERS_OF_58, U256};
use crate::crypto::Pubkey;

/// Longest possible base58 encoding of a 32-byte key.
pub const MAX_PATTERN_LEN: usize = 44;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern is {0} characters, maximum is {MAX_PATTERN_LEN}")]
    TooLong(usize),
    #[error("character '{0}' is not in the base58 alphabet")]
    InvalidCharacter(char),
}

/// Where the pattern is anchored on the encoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Prefix,
    Suffix,
}

/// An immutable compiled pattern, shareable across worker threads.
///
/// Each position compiles to the set of acceptable base58 digit values,
/// stored as a bitmask. Case-insensitive compilation admits the case sibling
/// of a character when that sibling is itself part of the base58 alphabet
/// (`A`/`a` are siblings; `L` has none because `l` is excluded).
#[derive(Debug, Clone)]
pub struct Subsequence {
    raw: String,
    anchor: Anchor,
    case_sensitive: bool,
    sets: Vec<u64>,
    leading_ones: usize,
}

impl Subsequence {
    /// Validates and compiles a pattern.
    pub fn compile(raw: &str, anchor: Anchor, case_sensitive: bool) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if raw.len() > MAX_PATTERN_LEN {
            return Err(PatternError::TooLong(raw.len()));
        }

        let mut sets = Vec::with_capacity(raw.len());
        for c in raw.chars() {
            let Some(digit) = c.try_into().ok().and_then(base58::digit_index) else {
                return Err(PatternError::InvalidCharacter(c));
            };
            let mut set = 1u64 << digit;
            if !case_sensitive {
                let sibling = if c.is_ascii_lowercase() {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                if let Some(d) = base58::digit_index(sibling as u8) {
                    set |= 1u64 << d;
                }
            }
            sets.push(set);
        }

        let leading_ones = sets.iter().take_while(|&&set| set & 1 != 0).count();

        Ok(Self {
            raw: raw.to_string(),
            anchor,
            case_sensitive,
            sets,
            leading_ones,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Decides the match for `key` according to the compiled anchor.
    #[inline]
    pub fn matches(&self, key: &Pubkey) -> bool {
        match self.anchor {
            Anchor::Prefix => self.matches_prefix(key),
            Anchor::Suffix => self.matches_suffix(key),
        }
    }

    /// Does the base58 encoding of `key` start with this pattern?
    pub fn matches_prefix(&self, key: &Pubkey) -> bool {
        let len = self.sets.len();
        // Leading zero bytes encode as leading '1' characters.
        let zeros = key.leading_zero_bytes();
        if zeros >= len {
            return self.leading_ones == len;
        }
        if zeros > self.leading_ones {
            return false;
        }

        let value = U256::from_be_bytes(key.as_bytes());
        let digits = base58::digit_count(&value);
        if len - zeros > digits {
            // Pattern reaches past the end of the encoding.
            return false;
        }
        match_leading_digits(value, digits, &self.sets[zeros..])
    }

    /// Does the base58 encoding of `key` end with this pattern?
    pub fn matches_suffix(&self, key: &Pubkey) -> bool {
        let len = self.sets.len();
        let mut value = U256::from_be_bytes(key.as_bytes());
        // Emit digits low-to-high, comparing right-to-left. Once the value
        // is exhausted the remaining positions fall into the leading-'1'
        // run of the encoding.
        let mut padded = 0usize;
        for pos in (0..len).rev() {
            let digit = if value.is_zero() {
                padded += 1;
                0
            } else {
                value.div_rem_small(58)
            };
            if self.sets[pos] & (1u64 << digit) == 0 {
                return false;
            }
        }
        padded == 0 || key.leading_zero_bytes() >= padded
    }

    /// Expected number of candidates per match, assuming uniform digits.
    pub fn expected_attempts(&self) -> f64 {
        self.sets
            .iter()
            .map(|set| 58.0 / set.count_ones() as f64)
            .product()
    }

    /// Human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        match self.expected_attempts() {
            d if d <= 10_000.0 => "Very Easy (< 1 second)".into(),
            d if d <= 1_000_000.0 => "Easy (seconds)".into(),
            d if d <= 100_000_000.0 => "Medium (minutes)".into(),
            d if d <= 10_000_000_000.0 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

/// Walks the top `sets.len()` base58 digits of `value` (which has `digits`
/// digits in total), most significant first. The digit at exponent `e` is
/// `d` iff `d * 58^e <= value < (d + 1) * 58^e`; candidates are tried in
/// ascending order so the first under-shoot proves a mismatch.
fn match_leading_digits(mut value: U256, digits: usize, sets: &[u64]) -> bool {
    let mut exponent = digits;
    'positions: for &set in sets {
        exponent -= 1;
        let power = &POWERS_OF_58[exponent];
        let mut bits = set;
        while bits != 0 {
            let candidate = bits.trailing_zeros() as u64;
            bits &= bits - 1;
            let (low, carry) = power.mul_small(candidate);
            if carry != 0 || value < low {
                // The actual digit is below this candidate, and every
                // remaining candidate is larger still.
                return false;
            }
            let (high, overflow) = low.add(power);
            if overflow || value < high {
                value.sub_assign(&low);
                continue 'positions;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn key_from(bytes: [u8; 32]) -> Pubkey {
        Pubkey::from_bytes(bytes)
    }

    /// The case-fold sibling of `c` when that sibling is base58, else `c`.
    fn fold_sibling(c: char) -> char {
        let swapped = if c.is_ascii_lowercase() {
            c.to_ascii_uppercase()
        } else {
            c.to_ascii_lowercase()
        };
        if base58::digit_index(swapped as u8).is_some() {
            swapped
        } else {
            c
        }
    }

    #[test]
    fn compile_validation() {
        assert!(matches!(
            Subsequence::compile("", Anchor::Prefix, true),
            Err(PatternError::Empty)
        ));
        assert!(matches!(
            Subsequence::compile(&"a".repeat(45), Anchor::Prefix, true),
            Err(PatternError::TooLong(45))
        ));
        for bad in ["0", "O", "I", "l", "So!"] {
            assert!(matches!(
                Subsequence::compile(bad, Anchor::Prefix, true),
                Err(PatternError::InvalidCharacter(_))
            ));
        }
        assert!(Subsequence::compile(&"1".repeat(44), Anchor::Prefix, true).is_ok());
    }

    #[test]
    fn leading_ones_run() {
        let p = Subsequence::compile("11So", Anchor::Prefix, true).unwrap();
        assert_eq!(p.leading_ones, 2);
        let p = Subsequence::compile("So", Anchor::Prefix, true).unwrap();
        assert_eq!(p.leading_ones, 0);
        let p = Subsequence::compile("111", Anchor::Prefix, true).unwrap();
        assert_eq!(p.leading_ones, 3);
    }

    #[test]
    fn prefix_agrees_with_full_encoding() {
        let mut rng = StdRng::seed_from_u64(58);
        for round in 0..500 {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes[..]);
            // Mix in keys with leading zero bytes; they exercise the
            // '1'-run handling.
            for z in 0..(round % 5) {
                bytes[z as usize] = 0;
            }
            let key = key_from(bytes);
            let encoded = key.to_base58();

            for len in 1..=4usize.min(encoded.len()) {
                let pattern = &encoded[..len];
                let p = Subsequence::compile(pattern, Anchor::Prefix, true).unwrap();
                assert!(p.matches(&key), "{pattern} should prefix-match {encoded}");

                // Perturb the last pattern character to a different digit.
                let mut chars: Vec<char> = pattern.chars().collect();
                let last = *chars.last().unwrap();
                chars[len - 1] = if last == 'z' { 'y' } else { 'z' };
                let wrong: String = chars.iter().collect();
                if !encoded.starts_with(&wrong) {
                    let p = Subsequence::compile(&wrong, Anchor::Prefix, true).unwrap();
                    assert!(!p.matches(&key), "{wrong} should not prefix-match {encoded}");
                }
            }
        }
    }

    #[test]
    fn suffix_agrees_with_full_encoding() {
        let mut rng = StdRng::seed_from_u64(8658);
        for round in 0..500 {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes[..]);
            for z in 0..(round % 5) {
                bytes[z as usize] = 0;
            }
            let key = key_from(bytes);
            let encoded = key.to_base58();

            for len in 1..=4usize.min(encoded.len()) {
                let pattern = &encoded[encoded.len() - len..];
                let p = Subsequence::compile(pattern, Anchor::Suffix, true).unwrap();
                assert!(p.matches(&key), "{pattern} should suffix-match {encoded}");

                let mut chars: Vec<char> = pattern.chars().collect();
                let first = chars[0];
                chars[0] = if first == 'z' { 'y' } else { 'z' };
                let wrong: String = chars.iter().collect();
                if !encoded.ends_with(&wrong) {
                    let p = Subsequence::compile(&wrong, Anchor::Suffix, true).unwrap();
                    assert!(!p.matches(&key), "{wrong} should not suffix-match {encoded}");
                }
            }
        }
    }

    #[test]
    fn case_insensitive_accepts_siblings() {
        let mut rng = StdRng::seed_from_u64(4242);
        for _ in 0..200 {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes[..]);
            let key = key_from(bytes);
            let encoded = key.to_base58();

            let pattern: String = encoded[..3].chars().map(fold_sibling).collect();
            let p = Subsequence::compile(&pattern, Anchor::Prefix, false).unwrap();
            assert!(p.matches(&key), "{pattern} should loosely match {encoded}");

            let tail: String = encoded[encoded.len() - 3..].chars().map(fold_sibling).collect();
            let p = Subsequence::compile(&tail, Anchor::Suffix, false).unwrap();
            assert!(p.matches(&key), "{tail} should loosely suffix-match {encoded}");
        }
    }

    #[test]
    fn case_sensitive_rejects_siblings() {
        // 'a' and 'A' are distinct digits under case-sensitive matching.
        let mut rng = StdRng::seed_from_u64(99);
        loop {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes[..]);
            let key = key_from(bytes);
            let encoded = key.to_base58();
            let first = encoded.chars().next().unwrap();
            if !first.is_ascii_alphabetic() {
                continue;
            }
            let sibling = fold_sibling(first);
            if sibling == first {
                continue;
            }
            let p = Subsequence::compile(&sibling.to_string(), Anchor::Prefix, true).unwrap();
            assert!(!p.matches(&key));
            break;
        }
    }

    #[test]
    fn all_ones_prefix_on_zero_led_keys() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0;
        bytes[1] = 0;
        let key = key_from(bytes);
        assert!(key.to_base58().starts_with("11"));

        let two = Subsequence::compile("11", Anchor::Prefix, true).unwrap();
        assert!(two.matches(&key));
        let three = Subsequence::compile("111", Anchor::Prefix, true).unwrap();
        assert!(!three.matches(&key));
    }

    #[test]
    fn zero_key_edge_cases() {
        let key = key_from([0u8; 32]);
        // Encodes to exactly 32 '1' characters.
        let p = Subsequence::compile(&"1".repeat(32), Anchor::Prefix, true).unwrap();
        assert!(p.matches(&key));
        let p = Subsequence::compile(&"1".repeat(33), Anchor::Prefix, true).unwrap();
        assert!(!p.matches(&key));
        let p = Subsequence::compile(&"1".repeat(32), Anchor::Suffix, true).unwrap();
        assert!(p.matches(&key));
        let p = Subsequence::compile("2", Anchor::Suffix, true).unwrap();
        assert!(!p.matches(&key));
    }

    #[test]
    fn suffix_pad_reaches_into_ones_run() {
        // 31 zero bytes and a final 5 encode as "1" * 31 followed by "6".
        let mut bytes = [0u8; 32];
        bytes[31] = 5;
        let key = key_from(bytes);
        assert_eq!(key.to_base58(), format!("{}6", "1".repeat(31)));

        let p = Subsequence::compile("16", Anchor::Suffix, true).unwrap();
        assert!(p.matches(&key));
        let p = Subsequence::compile("66", Anchor::Suffix, true).unwrap();
        assert!(!p.matches(&key));
        // A suffix longer than the 32-character encoding cannot match.
        let p = Subsequence::compile(&format!("{}6", "1".repeat(32)), Anchor::Suffix, true).unwrap();
        assert!(!p.matches(&key));
    }

    #[test]
    fn expected_attempts_scales_with_sets() {
        let p = Subsequence::compile("1", Anchor::Prefix, true).unwrap();
        assert_eq!(p.expected_attempts(), 58.0);
        // 'A' and 'a' are both admitted when case-insensitive.
        let p = Subsequence::compile("A", Anchor::Prefix, false).unwrap();
        assert_eq!(p.expected_attempts(), 29.0);
        let p = Subsequence::compile("AB", Anchor::Prefix, true).unwrap();
        assert_eq!(p.expected_attempts(), 58.0 * 58.0);
    }
}
