pub mod quant;
pub mod lanes;

pub use quant::{saturate_q15, rescale_q15, dot_q15, quantize_q15};
