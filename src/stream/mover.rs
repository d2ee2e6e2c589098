//! Burst movers between addressable buffers and ordered channels.
use crate::error::{HeadError, Result};
use crate::stream::channel::{ChannelReader, ChannelWriter};

#[inline]
fn check_range(start: usize, count: usize, len: usize) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(HeadError::OutOfBounds { start, count, len }),
    }
}

/// Append `buf[start..start+count)` to `out` in ascending index order.
pub fn move_to_channel<W: Copy>(buf: &[W], start: usize, count: usize, out: &mut ChannelWriter<W>) -> Result<()> {
    check_range(start, count, buf.len())?;
    for &w in &buf[start..start + count] {
        out.write(w)?;
    }
    Ok(())
}

/// Drain `count` values from `input` into `buf[start..start+count)`.
///
/// Values are staged until the whole burst has arrived, so a starved or
/// closed channel leaves `buf` untouched.
pub fn move_to_memory<W: Copy>(input: &mut ChannelReader<W>, buf: &mut [W], start: usize, count: usize) -> Result<()> {
    check_range(start, count, buf.len())?;
    let mut staged = Vec::with_capacity(count);
    for _ in 0..count {
        staged.push(input.read()?);
    }
    buf[start..start + count].copy_from_slice(&staged);
    Ok(())
}
