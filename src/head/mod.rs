pub mod config;
pub mod scratch;
pub mod kernel;

pub use config::{HeadConfig, HeadTable, NamedHead, FLAG, POSE3D, WORLD};
pub use kernel::{forward, HeadKernel, KernelStats, Phase};
