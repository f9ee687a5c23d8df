// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a region of the complex plane described by a centre point and a
//! zoom factor.
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the column, row of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of the integral plane onto the complex plane.  The
/// centre of the integral plane lands on `origin`; the shorter side of
/// the integral plane spans `2 / zoom` units of the complex plane.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The width and height of the integral plane.
    pub integral_plane: IntegralPlane,
    /// The complex point at the centre of the image.
    pub origin: Complex<f64>,
    // Pixels per complex unit at zoom 1: half the shorter side.
    scale: f64,
    zoom: f64,
    // The centre of the integral plane, in pixels.
    centre: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane, the point of
    /// the complex plane that should sit at its centre, and a zoom.
    pub fn new(width: usize, height: usize, origin: Complex<f64>, zoom: f64) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            origin,
            scale: 0.5 * (width.min(height) as f64),
            zoom,
            centre: (0.5 * width as f64, 0.5 * height as f64),
        }
    }

    /// Given a pixel on the integral cartesian plane, return the complex
    /// number at the equivalent location on the complex plane.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let re = ((pixel.0 as f64 - self.centre.0) / self.scale) / self.zoom;
        let im = ((pixel.1 as f64 - self.centre.1) / self.scale) / self.zoom;
        Complex::new(re, im) + self.origin
    }

    /// Every point of one row, left to right.
    pub fn row_points(&self, row: usize) -> Vec<Complex<f64>> {
        (0..self.integral_plane.0)
            .map(|column| self.pixel_to_point(&Pixel(column, row)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_pixel_maps_to_origin() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-0.5, 0.0), 0.75);
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(-0.5, 0.0));
    }

    #[test]
    fn pixel_to_point_on_unit_planes() {
        let pm = PlaneMapper::new(4, 4, Complex::new(0.0, 0.0), 1.0);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-1.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(0.5, -0.5));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(1.0, 1.0));
    }

    #[test]
    fn zoom_shrinks_the_region() {
        let pm = PlaneMapper::new(4, 4, Complex::new(0.0, 0.0), 2.0);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-0.5, -0.5));
    }

    #[test]
    fn shorter_side_sets_the_scale() {
        let pm = PlaneMapper::new(8, 4, Complex::new(0.0, 0.0), 1.0);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(8, 4)), Complex::new(2.0, 1.0));
    }

    #[test]
    fn row_points_walk_left_to_right() {
        let pm = PlaneMapper::new(4, 2, Complex::new(1.0, 1.0), 1.0);
        let row = pm.row_points(1);
        assert_eq!(row.len(), 4);
        assert_eq!(row[0], Complex::new(-1.0, 1.0));
        assert_eq!(row[3], Complex::new(2.0, 1.0));
    }
}
