//! Two-dimensional bit grid with bounding-rectangle extraction.
//!
//! Bits are addressed by `(x, y) -> x + y * width` over `u64` words. The last
//! word may be padded beyond `width * height`; scans never report padding.

use raster_common::GridExtent;

const WORD_BITS: usize = 64;

/// A `width × height` grid of bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet2D {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitSet2D {
    /// Grid with every bit cleared.
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of addressable bits.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) outside grid");
        x + y * self.width
    }

    pub fn get_flat(&self, index: usize) -> bool {
        index < self.len() && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    pub fn set_flat(&mut self, index: usize) {
        if index < self.len() {
            self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        }
    }

    pub fn clear_flat(&mut self, index: usize) {
        if index < self.len() {
            self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.get_flat(self.index(x, y))
    }

    pub fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.set_flat(index);
        }
    }

    pub fn clear(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.clear_flat(index);
        }
    }

    /// Set every bit of the rectangle, clipped to the grid.
    pub fn set_rect(&mut self, area: &GridExtent) {
        let x0 = area.x_min.max(0) as usize;
        let y0 = area.y_min.max(0) as usize;
        if area.x_max < 0 || area.y_max < 0 {
            return;
        }
        let x1 = (area.x_max as usize).min(self.width.saturating_sub(1));
        let y1 = (area.y_max as usize).min(self.height.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set(x, y);
            }
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// First set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        self.scan_forward(from, false)
    }

    /// First cleared bit at or after `from`, never past the logical grid.
    pub fn next_clear_bit(&self, from: usize) -> Option<usize> {
        self.scan_forward(from, true)
    }

    /// Last set bit at or before `from`.
    pub fn previous_set_bit(&self, from: usize) -> Option<usize> {
        self.scan_backward(from, false)
    }

    /// Last cleared bit at or before `from`.
    pub fn previous_clear_bit(&self, from: usize) -> Option<usize> {
        self.scan_backward(from, true)
    }

    fn scan_forward(&self, from: usize, invert: bool) -> Option<usize> {
        let len = self.len();
        if from >= len {
            return None;
        }
        let mut word_index = from / WORD_BITS;
        let word = |i: usize| if invert { !self.words[i] } else { self.words[i] };
        let mut bits = word(word_index) & (u64::MAX << (from % WORD_BITS));
        loop {
            if bits != 0 {
                let found = word_index * WORD_BITS + bits.trailing_zeros() as usize;
                return (found < len).then_some(found);
            }
            word_index += 1;
            if word_index >= self.words.len() {
                return None;
            }
            bits = word(word_index);
        }
    }

    fn scan_backward(&self, from: usize, invert: bool) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let from = from.min(len - 1);
        let mut word_index = from / WORD_BITS;
        let word = |i: usize| if invert { !self.words[i] } else { self.words[i] };
        let offset = from % WORD_BITS;
        let mask = if offset == WORD_BITS - 1 {
            u64::MAX
        } else {
            (1u64 << (offset + 1)) - 1
        };
        let mut bits = word(word_index) & mask;
        loop {
            if bits != 0 {
                return Some(word_index * WORD_BITS + (WORD_BITS - 1) - bits.leading_zeros() as usize);
            }
            if word_index == 0 {
                return None;
            }
            word_index -= 1;
            bits = word(word_index);
        }
    }

    /// Smallest rectangle enclosing the set bits, `None` when no bit is set.
    ///
    /// Rows are scanned downward from the first set bit until a row without
    /// any set bit; the set bits are expected to form one vertical run.
    pub fn area_set(&self) -> Option<GridExtent> {
        self.bounding_area(|i| self.next_set_bit(i), |i| self.previous_set_bit(i))
    }

    /// Smallest rectangle enclosing the cleared bits, `None` when all are set.
    pub fn area_cleared(&self) -> Option<GridExtent> {
        self.bounding_area(|i| self.next_clear_bit(i), |i| self.previous_clear_bit(i))
    }

    /// Smallest rectangle enclosing bits set in both grids.
    ///
    /// Grids of different dimensions share nothing.
    pub fn intersect_set(&self, other: &BitSet2D) -> Option<GridExtent> {
        if !self.same_shape(other) {
            return None;
        }
        self.bounding_area(
            |i| next_shared(i, |k| self.next_set_bit(k), |k| other.next_set_bit(k)),
            |i| previous_shared(i, |k| self.previous_set_bit(k), |k| other.previous_set_bit(k)),
        )
    }

    /// Smallest rectangle enclosing bits cleared in both grids.
    pub fn intersect_cleared(&self, other: &BitSet2D) -> Option<GridExtent> {
        if !self.same_shape(other) {
            return None;
        }
        self.bounding_area(
            |i| next_shared(i, |k| self.next_clear_bit(k), |k| other.next_clear_bit(k)),
            |i| previous_shared(i, |k| self.previous_clear_bit(k), |k| other.previous_clear_bit(k)),
        )
    }

    fn same_shape(&self, other: &BitSet2D) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn bounding_area<N, P>(&self, next: N, previous: P) -> Option<GridExtent>
    where
        N: Fn(usize) -> Option<usize>,
        P: Fn(usize) -> Option<usize>,
    {
        let first = next(0)?;
        let y_min = first / self.width;
        let mut x_min = usize::MAX;
        let mut x_max = 0;
        let mut y_max = y_min;

        for y in y_min..self.height {
            let row_start = y * self.width;
            let row_end = row_start + self.width - 1;
            let Some(head) = next(row_start).filter(|&i| i <= row_end) else {
                break;
            };
            // Non-empty row, so a last match exists at or after `head`
            let tail = previous(row_end).unwrap_or(head);
            x_min = x_min.min(head - row_start);
            x_max = x_max.max(tail - row_start);
            y_max = y;
        }

        GridExtent::new(x_min as i64, y_min as i64, x_max as i64, y_max as i64).ok()
    }
}

/// First index at or after `from` reported by both scans.
fn next_shared<A, B>(from: usize, a: A, b: B) -> Option<usize>
where
    A: Fn(usize) -> Option<usize>,
    B: Fn(usize) -> Option<usize>,
{
    let mut i = a(from)?;
    let mut j = b(i)?;
    while i != j {
        if i < j {
            i = a(j)?;
        } else {
            j = b(i)?;
        }
    }
    Some(i)
}

/// Last index at or before `from` reported by both scans.
fn previous_shared<A, B>(from: usize, a: A, b: B) -> Option<usize>
where
    A: Fn(usize) -> Option<usize>,
    B: Fn(usize) -> Option<usize>,
{
    let mut i = a(from)?;
    let mut j = b(i)?;
    while i != j {
        if i > j {
            i = a(j)?;
        } else {
            j = b(i)?;
        }
    }
    Some(i)
}
