// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render configuration.  Built once, validated once, and then only
//! ever borrowed by the stages of the pipeline.

use crate::error::{PipelineError, Result};
use num::Complex;

/// Default number of iterations before a point is considered inside the
/// set.
pub const DEFAULT_ITERATIONS: u64 = 1024;
/// Default escape radius.  Large, so the smoothed colouring is smooth.
pub const DEFAULT_RADIUS: f64 = 10_000.0;
/// Default zoom; 1.0 fits the range -1..1 across the shorter side.
pub const DEFAULT_ZOOM: f64 = 0.75;
/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;
/// Default slot count of the queue feeding the workers.
pub const DEFAULT_INPUT_CAPACITY: usize = 400;
/// Default slot count of the queue feeding the sink.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 100;

/// Everything a render needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Iteration cap for the escape-time test.
    pub max_iterations: u64,
    /// Distance from the origin at which a point counts as escaped.
    pub radius: f64,
    /// Magnification; larger values look at a smaller region.
    pub zoom: f64,
    /// The point of the complex plane at the centre of the image.
    pub origin: Complex<f64>,
    /// Number of worker threads.
    pub workers: usize,
    /// Slot count of the producer-to-worker queue.
    pub input_capacity: usize,
    /// Slot count of the worker-to-sink queue.
    pub output_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 800,
            height: 800,
            max_iterations: DEFAULT_ITERATIONS,
            radius: DEFAULT_RADIUS,
            zoom: DEFAULT_ZOOM,
            origin: Complex::new(-0.5, 0.0),
            workers: DEFAULT_WORKERS,
            input_capacity: DEFAULT_INPUT_CAPACITY,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }
}

impl RenderConfig {
    /// The default configuration at a given size.
    pub fn with_size(width: usize, height: usize) -> Self {
        RenderConfig {
            width,
            height,
            ..RenderConfig::default()
        }
    }

    /// The number of pixels in the image.
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Reject configurations the pipeline cannot run.
    pub fn validate(&self) -> Result<()> {
        fn fail<T>(msg: String) -> Result<T> {
            Err(PipelineError::Config(msg))
        }

        if self.width == 0 || self.height == 0 {
            return fail(format!(
                "image must be at least 1x1, got {}x{}",
                self.width, self.height
            ));
        }
        if self.max_iterations == 0 {
            return fail("iteration cap must be at least 1".to_string());
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return fail(format!("escape radius must be positive, got {}", self.radius));
        }
        if !(self.zoom > 0.0) || !self.zoom.is_finite() {
            return fail(format!("zoom must be positive, got {}", self.zoom));
        }
        if !self.origin.re.is_finite() || !self.origin.im.is_finite() {
            return fail("origin must be a finite point".to_string());
        }
        if self.workers == 0 {
            return fail("at least one worker is required".to_string());
        }
        if self.input_capacity < 2 || self.output_capacity < 2 {
            return fail(format!(
                "queue capacities must be at least 2, got {} and {}",
                self.input_capacity, self.output_capacity
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RenderConfig::default().validate().is_ok());
        assert!(RenderConfig::with_size(4, 4).validate().is_ok());
        assert_eq!(RenderConfig::with_size(6, 9).pixels(), 54);
    }

    #[test]
    fn rejects_empty_images() {
        assert!(RenderConfig::with_size(0, 4).validate().is_err());
        assert!(RenderConfig::with_size(4, 0).validate().is_err());
    }

    #[test]
    fn rejects_unusable_pipelines() {
        let mut config = RenderConfig::with_size(4, 4);
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::with_size(4, 4);
        config.output_capacity = 1;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::with_size(4, 4);
        config.zoom = std::f64::NAN;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::with_size(4, 4);
        config.max_iterations = 0;
        assert!(config.validate().is_err());
    }
}
