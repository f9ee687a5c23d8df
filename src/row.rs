// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A row is one scanline of the image, tagged with its index.

use image::Rgb;
use num::Complex;

/// One scanline: its index in the image plus `width` payload elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Row<T> {
    /// The row's index, from `height - 1` down to 0.
    pub index: usize,
    /// The samples or pixels of the row, left to right.
    pub items: Vec<T>,
}

/// A row of points on the complex plane, on its way to a worker.
pub type SampleRow = Row<Complex<f64>>;

/// A row of finished pixels, on its way to the sink.
pub type PixelRow = Row<Rgb<u8>>;

impl<T> Row<T> {
    /// Wrap `items` as row `index`.
    pub fn new(index: usize, items: Vec<T>) -> Self {
        Row { index, items }
    }

    /// The number of elements in the row.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True for a row with no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the row, transforming every element, and keep the index.
    pub fn map<U, F>(self, f: F) -> Row<U>
    where
        F: FnMut(T) -> U,
    {
        Row {
            index: self.index,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
