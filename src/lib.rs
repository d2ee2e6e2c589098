// Q15 fully-connected heads fed by burst movers over bounded channels
pub mod error;
pub mod fixed;
pub mod stream;
pub mod head;
pub mod overlay;
pub mod blob;
pub mod golden;
pub mod synth;

pub use error::{HeadError, Result};
pub use fixed::quant::saturate_q15;
pub use head::{HeadConfig, HeadKernel, HeadTable};
pub use overlay::{run_head, run_heads, HeadJob, HeadOutput, OverlayParams};
pub use stream::{channel, move_to_channel, move_to_memory};
