//! Host-side wiring of the heads: per head, a feature mover and a weight
//! mover feed the kernel over bounded channels and an output mover drains the
//! result back to memory. Heads share nothing and run in parallel.

use crate::error::{HeadError, Result};
use crate::head::config::{HeadConfig, HeadTable};
use crate::head::kernel::{HeadKernel, KernelStats};
use crate::stream::channel::{channel, DEFAULT_DEPTH, DEFAULT_TIMEOUT};
use crate::stream::mover::{move_to_channel, move_to_memory};
use log::{debug, info};
use rayon::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct OverlayParams {
    /// Capacity of every channel, in values.
    pub depth: usize,
    /// Longest a kernel or output mover waits on an empty channel.
    pub timeout: Duration,
    pub parallel: bool,
}

impl Default for OverlayParams {
    fn default() -> Self { Self { depth: DEFAULT_DEPTH, timeout: DEFAULT_TIMEOUT, parallel: true } }
}

fn env_parse_usize(name: &str) -> Option<usize> { std::env::var(name).ok().and_then(|s| s.parse().ok()) }
fn env_parse_u64(name: &str) -> Option<u64> { std::env::var(name).ok().and_then(|s| s.parse().ok()) }

impl OverlayParams {
    /// Defaults, overridden by `POSEHEAD_CHANNEL_DEPTH` and `POSEHEAD_READ_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut p = Self::default();
        if let Some(d) = env_parse_usize("POSEHEAD_CHANNEL_DEPTH") { p.depth = d; }
        if let Some(ms) = env_parse_u64("POSEHEAD_READ_TIMEOUT_MS") { p.timeout = Duration::from_millis(ms); }
        p
    }
}

/// One head's weight table, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct HeadJob<'a> {
    pub name: &'a str,
    pub config: HeadConfig,
    pub weights: &'a [i16],
}

#[derive(Debug, Clone)]
pub struct HeadOutput {
    pub name: String,
    pub values: Vec<i16>,
    pub stats: KernelStats,
    pub elapsed: Duration,
}

fn check_len(what: String, have: usize, need: usize) -> Result<()> {
    if have < need { return Err(HeadError::Truncated { what, have, need }); }
    Ok(())
}

fn join<T>(h: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    match h.join() {
        Ok(r) => r,
        Err(p) => std::panic::resume_unwind(p),
    }
}

/// Pick the error that caused a failed head. The kernel error is the root
/// cause when movers see a closed channel, except when the output mover gave
/// up first: its own error then explains the kernel's `ConsumerGone`.
fn settle(kernel: Result<KernelStats>, feat: Result<()>, w: Result<()>, out: Result<()>) -> Result<KernelStats> {
    let stats = match (kernel, out) {
        (Err(HeadError::ConsumerGone { .. }), Err(e)) => return Err(e),
        (kernel, out) => {
            let stats = kernel?;
            out?;
            stats
        }
    };
    feat?;
    w?;
    Ok(stats)
}

/// Run one head end to end and return its padded output vector.
pub fn run_head(job: &HeadJob<'_>, features: &[i16], params: &OverlayParams) -> Result<HeadOutput> {
    let cfg = job.config;
    cfg.validate()?;
    check_len(format!("{} features", job.name), features.len(), cfg.in_ch)?;
    check_len(format!("{} weights", job.name), job.weights.len(), cfg.weight_len())?;

    // Each head owns its feature copy. Writers move into their mover threads
    // so the kernel sees the channel close once a burst is complete.
    let feat_mem: Vec<i16> = features[..cfg.in_ch].to_vec();
    let w_mem = job.weights;
    let mut out_mem = vec![0i16; cfg.out_ch_pad];

    let (mut feat_tx, mut feat_rx) = channel::<i16>(&format!("{}.feat", job.name), params.depth, params.timeout)?;
    let (mut w_tx, mut w_rx) = channel::<i16>(&format!("{}.w", job.name), params.depth, params.timeout)?;
    let (mut out_tx, mut out_rx) = channel::<i16>(&format!("{}.out", job.name), params.depth, params.timeout)?;
    let mut kernel = HeadKernel::new(cfg)?;

    let t0 = Instant::now();
    let (kernel_res, feat_res, w_res, out_res) = thread::scope(|s| {
        let feat_h = s.spawn(move || move_to_channel(&feat_mem, 0, cfg.in_ch, &mut feat_tx));
        let w_h = s.spawn(move || move_to_channel(w_mem, 0, cfg.weight_len(), &mut w_tx));
        let k_h = s.spawn(move || kernel.run(&mut feat_rx, &mut w_rx, &mut out_tx));
        let out_res = move_to_memory(&mut out_rx, &mut out_mem, 0, cfg.out_ch_pad);
        drop(out_rx);
        (join(k_h), join(feat_h), join(w_h), out_res)
    });
    let elapsed = t0.elapsed();

    let stats = settle(kernel_res, feat_res, w_res, out_res)?;

    info!("head {}: {} outputs ({} real, {} saturated) in {:.3}ms",
        job.name, out_mem.len(), cfg.out_ch, stats.saturated, elapsed.as_secs_f64() * 1000.0);
    Ok(HeadOutput { name: job.name.to_string(), values: out_mem, stats, elapsed })
}

/// Run every job against the shared feature vector, preserving job order.
pub fn run_heads(jobs: &[HeadJob<'_>], features: &[i16], params: &OverlayParams) -> Result<Vec<HeadOutput>> {
    debug!("running {} heads (parallel={}, depth={}, timeout={:?})", jobs.len(), params.parallel, params.depth, params.timeout);
    if params.parallel {
        jobs.par_iter().map(|job| run_head(job, features, params)).collect()
    } else {
        jobs.iter().map(|job| run_head(job, features, params)).collect()
    }
}

/// Pair each table entry with its weight table by name.
pub fn jobs_for<'a>(table: &'a HeadTable, weights: &'a [(String, Vec<i16>)]) -> Result<Vec<HeadJob<'a>>> {
    table.heads.iter().map(|h| {
        let w = weights.iter().find(|(n, _)| *n == h.name)
            .ok_or_else(|| HeadError::InvalidConfig(format!("no weights for head '{}'", h.name)))?;
        Ok(HeadJob { name: &h.name, config: h.config, weights: &w.1 })
    }).collect()
}
