// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The head of the pipeline: turns the image into rows of complex
//! samples, last row first, and feeds them to the input queue.

use crate::config::RenderConfig;
use crate::error::{PipelineError, Result};
use crate::planes::PlaneMapper;
use crate::queue::BoundedQueue;
use crate::row::{Row, SampleRow};
use tracing::debug;

/// Generates the sample rows of an image.
pub struct RowProducer {
    plane: PlaneMapper,
}

impl RowProducer {
    /// A producer for the image `config` describes.
    pub fn new(config: &RenderConfig) -> Self {
        RowProducer {
            plane: PlaneMapper::new(config.width, config.height, config.origin, config.zoom),
        }
    }

    /// Every row of the image, from index `height - 1` down to 0.
    pub fn rows<'a>(&'a self) -> impl Iterator<Item = SampleRow> + 'a {
        (0..self.plane.integral_plane.1)
            .rev()
            .map(move |index| Row::new(index, self.plane.row_points(index)))
    }

    /// Push every row into `queue`, blocking whenever it is full, then
    /// finish the queue.  Returns the number of rows fed.  A refused row
    /// is an error: the queue only closes early when the pipeline is
    /// being torn down.
    pub fn feed(&self, queue: &BoundedQueue<SampleRow>) -> Result<usize> {
        let mut fed = 0;
        for row in self.rows() {
            let index = row.index;
            queue.add(row).map_err(|_| PipelineError::QueueClosed {
                stage: "input",
                row: index,
            })?;
            fed += 1;
        }
        debug!(rows = fed, "all rows queued, finishing input");
        queue.finish();
        Ok(fed)
    }
}
