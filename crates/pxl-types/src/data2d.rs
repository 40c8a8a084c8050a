use anyhow::{Result, ensure};

use crate::Rect;

/// Rectangular buffer addressed in a local coordinate space.
///
/// `bounds` places the buffer in that space: valid coordinates run from
/// `bounds.left()` (inclusive) to `bounds.right()` (exclusive), and likewise
/// for y. A default-constructed buffer is empty and owns no storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Data2D<T> {
    data: Vec<T>,
    bounds: Rect,
}

impl<T: Copy + Default> Data2D<T> {
    /// Allocate a buffer covering `bounds`, filled with `T::default()`.
    pub fn with_bounds(bounds: Rect) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }
        Self {
            data: vec![T::default(); (bounds.width * bounds.height) as usize],
            bounds,
        }
    }

    /// Wrap an existing row-major buffer. The data length must match the
    /// bounds area exactly.
    pub fn from_vec(bounds: Rect, data: Vec<T>) -> Result<Self> {
        let expected = if bounds.is_empty() {
            0
        } else {
            (bounds.width * bounds.height) as usize
        };
        ensure!(
            data.len() == expected,
            "Data2D size mismatch: {} elements for {}x{} bounds",
            data.len(),
            bounds.width,
            bounds.height
        );
        if expected == 0 {
            return Ok(Self::default());
        }
        Ok(Self { data, bounds })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn start_x(&self) -> i32 {
        self.bounds.left()
    }

    pub fn end_x(&self) -> i32 {
        self.bounds.right()
    }

    pub fn start_y(&self) -> i32 {
        self.bounds.top()
    }

    pub fn end_y(&self) -> i32 {
        self.bounds.bottom()
    }

    /// Row-major contents, top-left first.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let col = (x - self.bounds.x) as usize;
        let row = (y - self.bounds.y) as usize;
        Some(row * self.bounds.width as usize + col)
    }

    /// Value at the given coordinates, or `None` outside the bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        self.index_of(x, y).map(|i| self.data[i])
    }

    /// Store a value. Coordinates must lie inside the bounds.
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        let i = match self.index_of(x, y) {
            Some(i) => i,
            None => panic!("Data2D::set out of bounds: ({x}, {y}) not in {:?}", self.bounds),
        };
        self.data[i] = value;
    }

    /// Return a buffer whose bounds contain `target`, copying the current
    /// contents over. If the current bounds already contain `target`, the
    /// buffer is returned unchanged (no copy).
    pub fn lazy_copy_expand_to_contain(self, target: Rect) -> Self {
        if self.bounds.contains_rect(&target) {
            return self;
        }
        let union = Rect::union_ignore_empty(self.bounds, target);
        let mut expanded = Self::with_bounds(union);
        for y in self.start_y()..self.end_y() {
            for x in self.start_x()..self.end_x() {
                if let Some(v) = self.get(x, y) {
                    expanded.set(x, y, v);
                }
            }
        }
        expanded
    }
}
