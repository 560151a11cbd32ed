use colchunk_array::{MantissaWidth, expanded_to_f64, pow10};
use colchunk_error::{ChunkResult, chunk_bail};

use crate::DecimalHeader;

// Bounds of the f64 values that convert to i64 without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Conversions between stored mantissas and logical values under one [`DecimalHeader`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledCodec {
    bias: i64,
    scale_exponent: i32,
    width: MantissaWidth,
    divisor: f64,
}

impl ScaledCodec {
    pub fn new(header: &DecimalHeader) -> Self {
        Self {
            bias: header.bias(),
            scale_exponent: header.scale_exponent(),
            width: header.width(),
            divisor: pow10(header.scale_exponent().unsigned_abs()),
        }
    }

    #[inline(always)]
    pub fn is_na(&self, mantissa: i64) -> bool {
        mantissa == self.width.na_sentinel()
    }

    /// The logical value of `mantissa`, or `na_fill` if it is the sentinel.
    #[inline(always)]
    pub fn decode(&self, mantissa: i64, na_fill: f64) -> f64 {
        if self.is_na(mantissa) {
            na_fill
        } else {
            self.bias.wrapping_add(mantissa) as f64 / self.divisor
        }
    }

    /// The mantissa that decodes to exactly `value`, if there is one.
    pub fn encode_f64(&self, value: f64) -> Option<i64> {
        let mantissa = self.candidate(value)?;
        (self.decode(mantissa, f64::NAN).to_bits() == value.to_bits()).then_some(mantissa)
    }

    /// The mantissa whose decoded value narrows to exactly `value`, if there is one.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_f32(&self, value: f32) -> Option<i64> {
        let mantissa = self.candidate(f64::from(value))?;
        ((self.decode(mantissa, f64::NAN) as f32).to_bits() == value.to_bits()).then_some(mantissa)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn candidate(&self, value: f64) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * self.divisor).round();
        if !(I64_LOWER..I64_UPPER).contains(&scaled) {
            return None;
        }
        (scaled as i64)
            .checked_sub(self.bias)
            .filter(|&mantissa| self.width.contains(mantissa))
    }

    /// The decoded value of `mantissa` truncated toward zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_long(&self, mantissa: i64) -> ChunkResult<i64> {
        if self.is_na(mantissa) {
            chunk_bail!("value is missing");
        }
        Ok(self.decode(mantissa, f64::NAN) as i64)
    }

    /// Number of decimal digits after the point.
    pub fn precision(&self) -> u8 {
        u8::try_from(self.scale_exponent.unsigned_abs()).unwrap_or(u8::MAX)
    }

    /// Distance between two adjacent representable values, `10^scale_exponent`.
    pub fn step(&self) -> f64 {
        expanded_to_f64(1, self.scale_exponent)
    }

    /// `10^-scale_exponent`.
    #[inline]
    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    #[inline]
    pub fn bias(&self) -> i64 {
        self.bias
    }

    #[inline]
    pub fn scale_exponent(&self) -> i32 {
        self.scale_exponent
    }

    #[inline]
    pub fn width(&self) -> MantissaWidth {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    use super::*;

    fn codec(bias: i64, scale_exponent: i32, width: MantissaWidth) -> ScaledCodec {
        ScaledCodec::new(&DecimalHeader::try_new(bias, scale_exponent, width).unwrap())
    }

    #[rstest]
    #[case(50, 10.5)]
    #[case(0, 10.0)]
    #[case(99, 10.99)]
    #[case(254, 12.54)]
    fn decode(#[case] mantissa: i64, #[case] expected: f64) {
        let codec = codec(1000, -2, MantissaWidth::W1);
        assert_eq!(codec.decode(mantissa, f64::NAN), expected);
    }

    #[test]
    fn decode_sentinel() {
        let codec = codec(1000, -2, MantissaWidth::W1);
        assert_eq!(codec.decode(255, -1.0), -1.0);
        assert!(codec.decode(255, f64::NAN).is_nan());
        assert!(codec.is_na(255));
    }

    #[rstest]
    #[case(10.5, Some(50))]
    #[case(10.0, Some(0))]
    #[case(10.99, Some(99))]
    #[case(10.503, None)]
    #[case(9.99, None)]
    #[case(12.55, None)]
    #[case(f64::NAN, None)]
    #[case(f64::INFINITY, None)]
    #[case(f64::NEG_INFINITY, None)]
    fn encode(#[case] value: f64, #[case] expected: Option<i64>) {
        let codec = codec(1000, -2, MantissaWidth::W1);
        assert_eq!(codec.encode_f64(value), expected);
    }

    #[test]
    fn negative_zero_is_not_representable() {
        let codec = codec(0, -1, MantissaWidth::W2);
        assert_eq!(codec.encode_f64(0.0), Some(0));
        assert_eq!(codec.encode_f64(-0.0), None);
    }

    #[test]
    fn encode_never_produces_sentinel() {
        let codec = codec(-32768, -1, MantissaWidth::W2);
        // bias + i16::MIN would decode to this value
        assert_eq!(codec.encode_f64(-6553.6), None);
        assert_eq!(codec.encode_f64(-6553.5), Some(-32767));
    }

    #[test]
    fn encode_f32_compares_narrowed() {
        let codec = codec(0, -1, MantissaWidth::W4);
        assert_eq!(codec.encode_f32(0.1), Some(1));
        assert_eq!(codec.encode_f32(-12.3), Some(-123));
        assert_eq!(codec.encode_f64(f64::from(0.1f32)), None);
        assert_eq!(codec.encode_f32(0.15), None);
    }

    #[test]
    fn round_trip() {
        let mut rng = StdRng::seed_from_u64(0);
        let codec = codec(-5_000, -3, MantissaWidth::W4);
        for _ in 0..10_000 {
            let mantissa = rng.random_range(MantissaWidth::W4.min_value()..=MantissaWidth::W4.max_value());
            let value = codec.decode(mantissa, f64::NAN);
            assert_eq!(codec.encode_f64(value), Some(mantissa), "value {value}");
        }
    }

    #[rstest]
    #[case(50, 10)]
    #[case(99, 10)]
    #[case(0, 10)]
    fn to_long(#[case] mantissa: i64, #[case] expected: i64) {
        assert_eq!(codec(1000, -2, MantissaWidth::W1).to_long(mantissa).unwrap(), expected);
    }

    #[test]
    fn to_long_truncates_toward_zero() {
        let codec = codec(-1000, -2, MantissaWidth::W2);
        assert_eq!(codec.to_long(1).unwrap(), -9);
        assert!(codec.to_long(MantissaWidth::W2.na_sentinel()).is_err());
    }

    #[rstest]
    #[case(-1, 1, 0.1)]
    #[case(-2, 2, 0.01)]
    #[case(-6, 6, 1e-6)]
    fn precision_and_step(#[case] exponent: i32, #[case] precision: u8, #[case] step: f64) {
        let codec = codec(0, exponent, MantissaWidth::W1);
        assert_eq!(codec.precision(), precision);
        assert_eq!(codec.step(), step);
        assert_eq!(f64::from(codec.precision()), -codec.step().log10().round());
    }

    #[test]
    fn precision_saturates() {
        assert_eq!(codec(0, -300, MantissaWidth::W1).precision(), 255);
        assert_eq!(codec(0, i32::MIN, MantissaWidth::W1).precision(), 255);
    }
}
