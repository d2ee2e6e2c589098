/// Q15 fixed-point helpers and scalar kernels.

pub const Q15_MAX: i32 = i16::MAX as i32;
pub const Q15_MIN: i32 = i16::MIN as i32;
pub const Q15_SCALE: f32 = 32768.0;

/// Clamp a wide accumulator into the signed 16-bit range.
#[inline]
pub fn saturate_q15(x: i64) -> i16 {
    if x > Q15_MAX as i64 { return i16::MAX; }
    if x < Q15_MIN as i64 { return i16::MIN; }
    x as i16
}

/// True when `x` lies outside the int16 range and would be clipped.
#[inline]
pub fn saturates(x: i64) -> bool { x > Q15_MAX as i64 || x < Q15_MIN as i64 }

#[inline]
pub fn dot_q15(w_row: &[i16], x: &[i16]) -> i64 {
    // Scalar reference; both operands widen before the multiply.
    let mut acc: i64 = 0;
    for i in 0..w_row.len().min(x.len()) { acc += (w_row[i] as i64) * (x[i] as i64); }
    acc
}

/// Arithmetic right shift (sign-preserving) followed by saturation.
#[inline]
pub fn rescale_q15(acc: i64, shift: u32) -> i16 {
    saturate_q15(acc >> shift)
}

/// Round a real value onto the Q15 grid, clipping out-of-range inputs.
#[inline]
pub fn quantize_q15(x: f32) -> i16 {
    let q = (x * Q15_SCALE).round();
    if q >= Q15_MAX as f32 { return i16::MAX; }
    if q <= Q15_MIN as f32 { return i16::MIN; }
    q as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_is_arithmetic_shift() {
        assert_eq!(rescale_q15(-1, 15), -1);
        assert_eq!(rescale_q15(-65536, 15), -2);
        assert_eq!(rescale_q15(65535, 15), 1);
        assert_eq!(rescale_q15(1 << 40, 15), i16::MAX);
    }

    #[test]
    fn dot_widens_before_accumulating() {
        let w = vec![i16::MIN; 1152];
        let x = vec![i16::MIN; 1152];
        assert_eq!(dot_q15(&w, &x), 1152 * (1i64 << 30));
    }

    #[test]
    fn quantize_clips_and_rounds() {
        assert_eq!(quantize_q15(0.5), 16384);
        assert_eq!(quantize_q15(1.0), i16::MAX);
        assert_eq!(quantize_q15(-1.0), i16::MIN);
        assert_eq!(quantize_q15(-2.5), i16::MIN);
        assert_eq!(quantize_q15(0.0), 0);
    }
}
