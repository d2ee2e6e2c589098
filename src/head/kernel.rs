//! Quantized fully-connected head kernel.
//!
//! One generic kernel serves every head; only the [`HeadConfig`] differs.
//! An invocation walks `Load -> Compute[oc] -> Pad[oc] -> Done`, reading the
//! feature channel once, then `out_ch` rows of `[bias, w_0 .. w_{in_ch-1}]`
//! from the weight channel, and finally emitting `out_ch_pad - out_ch` zeros
//! without touching either input channel.
//!
//! A step that fails keeps everything it already read: the partial feature
//! load and the running accumulator of the current row. Calling `step` again
//! once more data is available resumes where it stopped.

use crate::error::{HeadError, Result};
use crate::fixed::quant::{dot_q15, rescale_q15, saturates};
use crate::head::config::HeadConfig;
use crate::head::scratch::FeatureBuffer;
use crate::stream::channel::{ChannelReader, ChannelWriter};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Compute { oc: usize },
    Pad { oc: usize },
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    pub features_read: u64,
    pub weights_read: u64,
    pub outputs_written: u64,
    /// Real outputs clipped by saturation.
    pub saturated: u64,
}

/// Progress through one `[bias, w_0 ..]` row.
#[derive(Debug, Clone, Copy)]
struct RowAcc {
    acc: i64,
    next: usize,
}

pub struct HeadKernel {
    cfg: HeadConfig,
    feats: FeatureBuffer,
    phase: Phase,
    row: Option<RowAcc>,
    stats: KernelStats,
}

impl HeadKernel {
    pub fn new(cfg: HeadConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, feats: FeatureBuffer::new(cfg.in_ch), phase: Phase::Done, row: None, stats: KernelStats::default() })
    }

    pub fn config(&self) -> &HeadConfig { &self.cfg }
    pub fn phase(&self) -> Phase { self.phase }

    /// Run one complete invocation.
    pub fn run(
        &mut self,
        feat: &mut ChannelReader<i16>,
        weights: &mut ChannelReader<i16>,
        out: &mut ChannelWriter<i16>,
    ) -> Result<KernelStats> {
        self.reset();
        while self.phase != Phase::Done {
            self.step(feat, weights, out)?;
        }
        Ok(self.stats)
    }

    /// Start a fresh invocation; the feature scratch does not survive it.
    pub fn reset(&mut self) {
        self.feats.clear();
        self.phase = Phase::Load;
        self.row = None;
        self.stats = KernelStats::default();
    }

    /// Advance by one phase unit: the whole load, one output row, or one pad
    /// value. Safe to call again after an error.
    pub fn step(
        &mut self,
        feat: &mut ChannelReader<i16>,
        weights: &mut ChannelReader<i16>,
        out: &mut ChannelWriter<i16>,
    ) -> Result<Phase> {
        let next = match self.phase {
            Phase::Load => {
                while self.feats.len() < self.cfg.in_ch {
                    self.feats.push(feat.read()?);
                    self.stats.features_read += 1;
                }
                debug!("kernel loaded {} features from '{}'", self.feats.len(), feat.name());
                self.after_row(0)
            }
            Phase::Compute { oc } => {
                let acc = self.accumulate_row(weights)?;
                out.write(rescale_q15(acc, self.cfg.shift))?;
                self.row = None;
                if saturates(acc >> self.cfg.shift) { self.stats.saturated += 1; }
                self.stats.outputs_written += 1;
                self.after_row(oc + 1)
            }
            Phase::Pad { oc } => {
                out.write(0)?;
                self.stats.outputs_written += 1;
                self.after_pad(oc + 1)
            }
            Phase::Done => Phase::Done,
        };
        if next == Phase::Done && self.phase != Phase::Done {
            debug!(
                "kernel done: {} outputs ({} saturated) to '{}'",
                self.stats.outputs_written, self.stats.saturated, out.name()
            );
        }
        self.phase = next;
        Ok(next)
    }

    /// Read the rest of the current row and return its accumulator. On a
    /// failed read the partial row is kept for the next attempt.
    fn accumulate_row(&mut self, weights: &mut ChannelReader<i16>) -> Result<i64> {
        let mut row = match self.row {
            Some(r) => r,
            None => {
                let bias = weights.read()?;
                self.stats.weights_read += 1;
                RowAcc { acc: bias as i64, next: 0 }
            }
        };
        let x = self.feats.as_slice();
        while row.next < x.len() {
            match weights.read() {
                Ok(w) => {
                    row.acc += (x[row.next] as i64) * (w as i64);
                    row.next += 1;
                    self.stats.weights_read += 1;
                }
                Err(e) => {
                    self.row = Some(row);
                    return Err(e);
                }
            }
        }
        self.row = Some(row);
        Ok(row.acc)
    }

    fn after_row(&self, oc: usize) -> Phase {
        if oc < self.cfg.out_ch { Phase::Compute { oc } } else { self.after_pad(oc) }
    }

    fn after_pad(&self, oc: usize) -> Phase {
        if oc < self.cfg.out_ch_pad { Phase::Pad { oc } } else { Phase::Done }
    }
}

/// Direct evaluation over in-memory buffers, without channels.
///
/// Lengths are checked up front; a short feature vector or weight table is
/// reported as [`HeadError::Truncated`].
pub fn forward(cfg: &HeadConfig, features: &[i16], weights: &[i16]) -> Result<Vec<i16>> {
    cfg.validate()?;
    if features.len() < cfg.in_ch {
        return Err(HeadError::Truncated { what: "features".into(), have: features.len(), need: cfg.in_ch });
    }
    if weights.len() < cfg.weight_len() {
        return Err(HeadError::Truncated { what: "weights".into(), have: weights.len(), need: cfg.weight_len() });
    }
    let x = &features[..cfg.in_ch];
    let mut out = vec![0i16; cfg.out_ch_pad];
    for (oc, y) in out.iter_mut().take(cfg.out_ch).enumerate() {
        let row = &weights[oc * cfg.row_stride()..(oc + 1) * cfg.row_stride()];
        let acc = row[0] as i64 + dot_q15(&row[1..], x);
        *y = rescale_q15(acc, cfg.shift);
    }
    Ok(out)
}
