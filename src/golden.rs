use crate::fixed::quant::quantize_q15;

/// Error statistics of produced head outputs against a golden Q15 stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub compared: usize,
    pub max_abs: i32,
    pub mean_abs: f64,
    /// Entries whose absolute difference exceeds the tolerance.
    pub mismatches: usize,
    /// Either side shorter than the requested length.
    pub length_mismatch: bool,
}

impl Comparison {
    pub fn passed(&self) -> bool { self.mismatches == 0 && !self.length_mismatch }
}

/// Compare the first `real_len` entries; padding beyond them is not scored.
pub fn compare(produced: &[i16], golden: &[i16], real_len: usize, tolerance: i32) -> Comparison {
    let n = real_len.min(produced.len()).min(golden.len());
    let mut max_abs = 0i32;
    let mut sum_abs = 0i64;
    let mut mismatches = 0usize;
    for i in 0..n {
        let d = (produced[i] as i32 - golden[i] as i32).abs();
        max_abs = max_abs.max(d);
        sum_abs += d as i64;
        if d > tolerance { mismatches += 1; }
    }
    Comparison {
        compared: n,
        max_abs,
        mean_abs: if n > 0 { sum_abs as f64 / n as f64 } else { 0.0 },
        mismatches,
        length_mismatch: n < real_len,
    }
}

/// True when every entry from `real_len` onward is zero.
pub fn padding_is_zero(values: &[i16], real_len: usize) -> bool {
    values.iter().skip(real_len).all(|&v| v == 0)
}

/// Quantize a real-valued golden stream onto the Q15 grid used by the heads.
pub fn quantize_golden(values: &[f32]) -> Vec<i16> {
    values.iter().map(|&v| quantize_q15(v)).collect()
}
