//! Packing of int16 samples into 128-bit transfer words.
//!
//! Lane 0 occupies the least significant 16 bits of the word, matching the
//! little-endian layout of the packed binary blobs.

pub const LANES: usize = 8;

#[inline]
pub fn words_for(samples: usize) -> usize { samples.div_ceil(LANES) }

/// Pack samples eight to a word; the last word is zero-filled.
pub fn pack_lanes(samples: &[i16]) -> Vec<u128> {
    let mut out = Vec::with_capacity(words_for(samples.len()));
    for chunk in samples.chunks(LANES) {
        let mut w: u128 = 0;
        for (lane, &s) in chunk.iter().enumerate() {
            w |= ((s as u16) as u128) << (16 * lane);
        }
        out.push(w);
    }
    out
}

/// Unpack `samples` lanes from `words`; lanes beyond the words read as zero.
pub fn unpack_lanes(words: &[u128], samples: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(samples);
    for i in 0..samples {
        let v = match words.get(i / LANES) {
            Some(w) => (w >> (16 * (i % LANES))) as u16 as i16,
            None => 0,
        };
        out.push(v);
    }
    out
}

/// Split one word into its eight lanes.
#[inline]
pub fn word_lanes(w: u128) -> [i16; LANES] {
    let mut out = [0i16; LANES];
    for (lane, v) in out.iter_mut().enumerate() { *v = (w >> (16 * lane)) as u16 as i16; }
    out
}
