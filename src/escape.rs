// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.

use num::Complex;

/// How a point's orbit ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Escape {
    /// Iterations taken before the orbit left the escape radius, or the
    /// iteration cap if it never did.
    pub iterations: u64,
    /// The last value of the orbit.
    pub z: Complex<f64>,
}

impl Escape {
    /// True if the orbit left the escape radius before the cap.
    pub fn escaped(&self, max_iterations: u64) -> bool {
        self.iterations < max_iterations
    }
}

/// Iterate `z = z * z + c` from zero until `|z|` reaches `radius` or
/// `max_iterations` is used up.
pub fn escape_time(c: Complex<f64>, max_iterations: u64, radius: f64) -> Escape {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for i in 0..max_iterations {
        z = z * z + c;
        if z.norm() >= radius {
            return Escape { iterations: i, z };
        }
    }
    Escape {
        iterations: max_iterations,
        z,
    }
}
