//! Float to rational conversion for ISO 21496-1 fields.
//!
//! Bounded continued-fraction expansion: the result is the last convergent
//! whose denominator keeps the numerator within range.

use crate::error::{Result, UltraHdrError};

const MAX_ITERATIONS: usize = 39;

/// Encodes `v` as `(numerator, denominator)` with `|numerator| <= i32::MAX`.
pub fn float_to_signed_fraction(v: f32) -> Result<(i32, u32)> {
    let (num, den) = unsigned_fraction((v as f64).abs(), i32::MAX as u32)
        .ok_or_else(|| fraction_error("signed", v))?;
    let num = num as i32;
    Ok((if v < 0.0 { -num } else { num }, den))
}

/// Encodes a non-negative `v` as `(numerator, denominator)`.
pub fn float_to_unsigned_fraction(v: f32) -> Result<(u32, u32)> {
    unsigned_fraction(v as f64, u32::MAX).ok_or_else(|| fraction_error("unsigned", v))
}

fn fraction_error(kind: &str, v: f32) -> UltraHdrError {
    UltraHdrError::IsoError(format!("cannot encode {} as {} fraction", v, kind))
}

fn unsigned_fraction(v: f64, max_numerator: u32) -> Option<(u32, u32)> {
    if v.is_nan() || v < 0.0 || v > max_numerator as f64 {
        return None;
    }
    let max_d = if v <= 1.0 {
        u32::MAX as f64
    } else {
        (max_numerator as f64 / v).floor()
    };

    let mut den: u32 = 1;
    let mut prev_d: u32 = 0;
    let mut remainder = v - v.floor();

    for _ in 0..MAX_ITERATIONS {
        let exact = den as f64 * v;
        if exact > max_numerator as f64 {
            return None;
        }
        let num = exact.round() as u32;
        if exact == num as f64 || remainder == 0.0 {
            return Some((num, den));
        }
        remainder = 1.0 / remainder;
        let next_d = prev_d as f64 + remainder.floor() * den as f64;
        if next_d > max_d {
            return Some((num, den));
        }
        if next_d > u32::MAX as f64 {
            return None;
        }
        prev_d = den;
        den = next_d as u32;
        remainder -= remainder.floor();
    }
    Some(((den as f64 * v).round() as u32, den))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(n: i64, d: u32) -> f64 {
        n as f64 / d as f64
    }

    #[test]
    fn test_exact_values() {
        assert_eq!(float_to_unsigned_fraction(1.0).unwrap(), (1, 1));
        assert_eq!(float_to_unsigned_fraction(0.0).unwrap(), (0, 1));
        assert_eq!(float_to_unsigned_fraction(0.5).unwrap(), (1, 2));
        assert_eq!(float_to_signed_fraction(-2.0).unwrap(), (-2, 1));
        assert_eq!(float_to_signed_fraction(0.015625).unwrap(), (1, 64));
    }

    #[test]
    fn test_approximation_is_close() {
        for v in [0.1f32, 1.0 / 3.0, 2.321928, -0.7369656, 13.287712] {
            let (n, d) = float_to_signed_fraction(v).unwrap();
            assert!((value(n as i64, d) - v as f64).abs() < 1e-6, "{} -> {}/{}", v, n, d);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(float_to_unsigned_fraction(-1.0).is_err());
        assert!(float_to_unsigned_fraction(f32::NAN).is_err());
        assert!(float_to_signed_fraction(f32::NAN).is_err());
        assert!(float_to_signed_fraction(3.0e9).is_err());
        assert!(float_to_unsigned_fraction(f32::INFINITY).is_err());
    }

    #[test]
    fn test_deterministic() {
        let first = float_to_signed_fraction(2.718_281_8).unwrap();
        for _ in 0..1000 {
            assert_eq!(float_to_signed_fraction(2.718_281_8).unwrap(), first);
        }
    }
}
