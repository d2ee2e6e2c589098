//! Bounded single-producer/single-consumer FIFO with blocking hand-off.
//!
//! A write blocks while the channel holds `depth` values. A read blocks while
//! it is empty, for at most the configured timeout, so a starved consumer
//! reports an error instead of suspending forever.

use crate::error::{HeadError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Matches the 1000-deep GMIO port buffers.
pub const DEFAULT_DEPTH: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

pub struct ChannelWriter<T> {
    name: String,
    tx: Sender<T>,
    produced: u64,
}

pub struct ChannelReader<T> {
    name: String,
    rx: Receiver<T>,
    timeout: Duration,
    consumed: u64,
}

/// Create a bounded channel. `depth` must be at least one.
pub fn channel<T>(name: &str, depth: usize, timeout: Duration) -> Result<(ChannelWriter<T>, ChannelReader<T>)> {
    if depth == 0 {
        return Err(HeadError::InvalidConfig(format!("channel '{}': depth must be >= 1", name)));
    }
    let (tx, rx) = bounded(depth);
    Ok((
        ChannelWriter { name: name.to_string(), tx, produced: 0 },
        ChannelReader { name: name.to_string(), rx, timeout, consumed: 0 },
    ))
}

impl<T> ChannelWriter<T> {
    pub fn name(&self) -> &str { &self.name }
    pub fn produced(&self) -> u64 { self.produced }

    pub fn write(&mut self, v: T) -> Result<()> {
        self.tx.send(v).map_err(|_| HeadError::ConsumerGone { channel: self.name.clone() })?;
        self.produced += 1;
        Ok(())
    }
}

impl<T> ChannelReader<T> {
    pub fn name(&self) -> &str { &self.name }
    pub fn consumed(&self) -> u64 { self.consumed }

    pub fn read(&mut self) -> Result<T> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(v) => {
                self.consumed += 1;
                Ok(v)
            }
            Err(RecvTimeoutError::Timeout) => Err(HeadError::Starved {
                channel: self.name.clone(),
                after: self.consumed,
                timeout: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(HeadError::ProducerGone {
                channel: self.name.clone(),
                after: self.consumed,
            }),
        }
    }

    /// Values currently buffered and ready to read.
    pub fn available(&self) -> usize { self.rx.len() }
}
