// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns an escape result into a pixel: smooth the iteration count,
//! walk it through an HSV palette, convert to 8-bit RGB.

use crate::escape::Escape;
use image::Rgb;

/// A colour in hue (degrees), saturation and value (both 0..1).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hsv {
    /// Hue in degrees.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Value.
    pub v: f64,
}

/// Scale a 0..1 component to a channel.  Out-of-range values saturate
/// and NaN becomes 0.
fn channel(c: f64) -> u8 {
    (255.999 * c) as u8
}

fn rgb(r: f64, g: f64, b: f64) -> Rgb<u8> {
    Rgb([channel(r), channel(g), channel(b)])
}

impl Hsv {
    /// Convert to 8-bit RGB with the usual six-sector formula.
    pub fn to_rgb(&self) -> Rgb<u8> {
        let v = self.v;
        if self.s <= 0.0 {
            return rgb(v, v, v);
        }
        let hh = (if self.h >= 360.0 { 0.0 } else { self.h }) / 60.0;
        let sector = hh as i64;
        let ff = hh - sector as f64;
        let p = v * (1.0 - self.s);
        let q = v * (1.0 - self.s * ff);
        let t = v * (1.0 - self.s * (1.0 - ff));
        match sector {
            0 => rgb(v, t, p),
            1 => rgb(q, v, p),
            2 => rgb(p, v, t),
            3 => rgb(p, q, v),
            4 => rgb(t, p, v),
            _ => rgb(v, p, q),
        }
    }
}

/// The fractional iteration count: how far past the last whole
/// iteration the orbit got before crossing the escape radius.
pub fn smooth(escape: &Escape, radius: f64) -> f64 {
    let ratio = escape.z.norm().ln() / radius.ln();
    escape.iterations as f64 - ratio.ln() / std::f64::consts::LN_2
}

/// Map a smoothed count onto the palette.  Points that never escaped
/// are black.
///
/// # Panics
///
/// Panics if `max_iterations` is zero.
pub fn palette(smoothed: f64, escaped: bool, max_iterations: u64) -> Hsv {
    let max = max_iterations as f64;
    // Whole degrees per iteration; caps above 360 give a single hue.
    let step = (360 / max_iterations) as f64;
    let mut h = smoothed * step + 235.0;
    if h > 360.0 {
        h = 720.0 - h;
    }
    Hsv {
        h,
        s: 1.0 - smoothed / max,
        v: if escaped { smoothed / max } else { 0.0 },
    }
}

/// Colour one escape result.
pub fn shade(escape: &Escape, max_iterations: u64, radius: f64) -> Rgb<u8> {
    let smoothed = smooth(escape, radius);
    palette(smoothed, escape.escaped(max_iterations), max_iterations).to_rgb()
}
