use crate::error::{HeadError, Result};
use crate::fixed::lanes::{pack_lanes, word_lanes};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

// Binary blobs are packed little-endian int16 with no header:
//   feature file : in_ch values
//   weight file  : out_ch rows of [bias, w_0 .. w_{in_ch-1}]
//   output file  : out_ch_pad values

/// Read exactly `elems` int16 values; trailing bytes beyond them are ignored.
pub fn load_i16_bin<P: AsRef<Path>>(path: P, elems: usize) -> Result<Vec<i16>> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let need_bytes = elems.checked_mul(2)
        .ok_or_else(|| HeadError::InvalidConfig(format!("{} int16 values overflow usize", elems)))?;
    let have_bytes = f.metadata()?.len() as usize;
    if have_bytes < need_bytes {
        return Err(HeadError::Truncated { what: path.display().to_string(), have: have_bytes / 2, need: elems });
    }
    let mut r = BufReader::new(f);
    let mut buf = vec![0u8; need_bytes];
    r.read_exact(&mut buf)?;
    let out: Vec<i16> = buf.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
    debug!("loaded {} int16 values from {}", out.len(), path.display());
    Ok(out)
}

pub fn write_i16_bin<P: AsRef<Path>>(path: P, values: &[i16]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path.as_ref())?);
    for v in values { w.write_all(&v.to_le_bytes())?; }
    w.flush()?;
    Ok(())
}

/// One decimal integer per line, in index order.
pub fn write_i16_txt<P: AsRef<Path>>(path: P, values: &[i16]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path.as_ref())?);
    for v in values { writeln!(w, "{}", v)?; }
    w.flush()?;
    Ok(())
}

/// Parse whitespace-separated integers, any number per line.
pub fn read_i16_txt<P: AsRef<Path>>(path: P) -> Result<Vec<i16>> {
    let f = File::open(path.as_ref())?;
    parse_i16_stream(BufReader::new(f))
}

pub fn parse_i16_stream<R: BufRead>(r: R) -> Result<Vec<i16>> {
    let mut out = Vec::new();
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        for tok in line.split_whitespace() {
            let v: i64 = tok.parse().map_err(|_| HeadError::Parse { line: i + 1, text: tok.to_string() })?;
            let v = i16::try_from(v)
                .map_err(|_| HeadError::InvalidConfig(format!("line {}: {} is outside int16", i + 1, v)))?;
            out.push(v);
        }
    }
    Ok(out)
}

/// Real-valued golden streams, whitespace separated like the int16 ones.
pub fn read_f32_txt<P: AsRef<Path>>(path: P) -> Result<Vec<f32>> {
    let f = File::open(path.as_ref())?;
    parse_f32_stream(BufReader::new(f))
}

pub fn parse_f32_stream<R: BufRead>(r: R) -> Result<Vec<f32>> {
    let mut out = Vec::new();
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        for tok in line.split_whitespace() {
            let v: f32 = tok.parse().map_err(|_| HeadError::Parse { line: i + 1, text: tok.to_string() })?;
            if !v.is_finite() {
                return Err(HeadError::Parse { line: i + 1, text: tok.to_string() });
            }
            out.push(v);
        }
    }
    Ok(out)
}

/// Eight samples per line (one 128-bit word), zero-padding the last line.
pub fn write_lane_txt<P: AsRef<Path>>(path: P, values: &[i16]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path.as_ref())?);
    for word in pack_lanes(values) {
        let line: Vec<String> = word_lanes(word).iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", line.join(" "))?;
    }
    w.flush()?;
    Ok(())
}

/// Build a weight table of rows `[bias, w_0 .. w_{in_ch-1}]` from a flat
/// row-major weight matrix and a bias vector. Returns the table and `out_ch`.
pub fn pack_fc(weights: &[i16], bias: &[i16], in_ch: usize, expected_out_ch: Option<usize>) -> Result<(Vec<i16>, usize)> {
    if in_ch == 0 {
        return Err(HeadError::InvalidConfig("cannot infer out_ch with in_ch = 0".into()));
    }
    if weights.len() % in_ch != 0 {
        return Err(HeadError::InvalidConfig(format!("weights length {} not divisible by in_ch {}", weights.len(), in_ch)));
    }
    let out_ch = weights.len() / in_ch;
    if let Some(exp) = expected_out_ch {
        if exp != out_ch {
            return Err(HeadError::InvalidConfig(format!("expected out_ch {}, got {}", exp, out_ch)));
        }
    }
    if bias.len() != out_ch {
        return Err(HeadError::InvalidConfig(format!("bias length {} does not match out_ch {}", bias.len(), out_ch)));
    }
    let mut fc = Vec::with_capacity(out_ch * (1 + in_ch));
    for (row, &b) in weights.chunks_exact(in_ch).zip(bias) {
        fc.push(b);
        fc.extend_from_slice(row);
    }
    Ok((fc, out_ch))
}
