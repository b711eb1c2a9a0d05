use serde::{Deserialize, Serialize};

/// Storage order of a [`Grid2D`].
///
/// With [`AxisOrder::XMajor`], entries sharing the same x live in one piece
/// of consecutive memory, so an `for x { for y { .. } }` loop walks the flat
/// storage linearly. [`AxisOrder::YMajor`] is the transpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    XMajor,
    YMajor,
}

impl Default for AxisOrder {
    fn default() -> Self {
        AxisOrder::XMajor
    }
}

/// A dense 2D container backed by a flat `Vec`, addressed by an `(x, y)` pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid2D<T> {
    data: Vec<T>,
    x_size: usize,
    y_size: usize,
    order: AxisOrder,
}

impl<T: Default + Clone> Grid2D<T> {
    pub fn new(x_size: usize, y_size: usize) -> Self {
        Self::filled(x_size, y_size, T::default())
    }

    pub fn resize(&mut self, x_size: usize, y_size: usize) {
        self.data.resize(x_size * y_size, T::default());
        self.x_size = x_size;
        self.y_size = y_size;
    }
}

impl<T: Clone> Grid2D<T> {
    pub fn filled(x_size: usize, y_size: usize, value: T) -> Self {
        Self {
            data: vec![value; x_size * y_size],
            x_size,
            y_size,
            order: AxisOrder::default(),
        }
    }
}

impl<T> Grid2D<T> {
    pub fn with_order(mut self, order: AxisOrder) -> Self {
        self.order = order;
        self
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.x_size = 0;
        self.y_size = 0;
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn order(&self) -> AxisOrder {
        self.order
    }

    // ── Index conversion ─────────────────────────────────────────────

    pub fn index_of(&self, x: usize, y: usize) -> usize {
        match self.order {
            AxisOrder::XMajor => self.y_size * x + y,
            AxisOrder::YMajor => self.x_size * y + x,
        }
    }

    pub fn x_of(&self, idx: usize) -> usize {
        match self.order {
            AxisOrder::XMajor => idx / self.y_size,
            AxisOrder::YMajor => idx % self.x_size,
        }
    }

    pub fn y_of(&self, idx: usize) -> usize {
        match self.order {
            AxisOrder::XMajor => idx % self.y_size,
            AxisOrder::YMajor => idx / self.x_size,
        }
    }

    pub fn xy_of(&self, idx: usize) -> (usize, usize) {
        (self.x_of(idx), self.y_of(idx))
    }

    // ── Element access ───────────────────────────────────────────────

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.x_size || y >= self.y_size {
            return None;
        }
        self.data.get(self.index_of(x, y))
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.x_size || y >= self.y_size {
            return None;
        }
        let idx = self.index_of(x, y);
        self.data.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<T> std::ops::Index<(usize, usize)> for Grid2D<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.data[self.index_of(x, y)]
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for Grid2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let idx = self.index_of(x, y);
        &mut self.data[idx]
    }
}
