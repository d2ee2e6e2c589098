/// Invocation-local feature buffer owned by one kernel instance.
#[derive(Clone, Debug)]
pub struct FeatureBuffer {
    buf: Vec<i16>,
    filled: usize,
}

impl FeatureBuffer {
    pub fn new(in_ch: usize) -> Self { Self { buf: vec![0; in_ch], filled: 0 } }
    pub fn clear(&mut self) { for v in &mut self.buf { *v = 0; } self.filled = 0; }

    #[inline]
    pub fn push(&mut self, v: i16) {
        self.buf[self.filled] = v;
        self.filled += 1;
    }

    pub fn len(&self) -> usize { self.filled }
    pub fn as_slice(&self) -> &[i16] { &self.buf[..self.filled] }
}
