// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The worker pool.  Each worker takes sample rows off the input queue,
//! colours every pixel, waits at the gate for its row's turn and then
//! publishes the finished row to the output queue.

use crate::color::shade;
use crate::config::RenderConfig;
use crate::error::{PipelineError, Result};
use crate::escape::escape_time;
use crate::gate::OrderGate;
use crate::queue::BoundedQueue;
use crate::row::{PixelRow, SampleRow};
use tracing::{debug, debug_span};

/// One member of the pool.
pub struct Worker<'a> {
    id: usize,
    config: &'a RenderConfig,
}

impl<'a> Worker<'a> {
    /// Worker number `id`, rendering with `config`.
    pub fn new(id: usize, config: &'a RenderConfig) -> Self {
        Worker { id, config }
    }

    /// Escape-time and colour every sample in a row.
    pub fn render_row(&self, row: SampleRow) -> PixelRow {
        let max = self.config.max_iterations;
        let radius = self.config.radius;
        row.map(|c| shade(&escape_time(c, max, radius), max, radius))
    }

    /// Work until the input queue runs dry.  Returns the number of rows
    /// this worker rendered.
    pub fn run(
        &self,
        input: &BoundedQueue<SampleRow>,
        gate: &OrderGate,
        output: &BoundedQueue<PixelRow>,
    ) -> Result<usize> {
        let _span = debug_span!("worker", id = self.id).entered();
        let mut rendered = 0;
        while let Some(row) = input.remove() {
            let pixels = self.render_row(row);
            let index = pixels.index;
            let turn = gate
                .wait_turn(index)
                .map_err(|_| PipelineError::GateAborted(index))?;
            output.add(pixels).map_err(|_| PipelineError::QueueClosed {
                stage: "output",
                row: index,
            })?;
            turn.pass();
            rendered += 1;
        }
        debug!(rendered, "input exhausted");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::RowProducer;

    fn config() -> RenderConfig {
        let mut config = RenderConfig::with_size(6, 9);
        config.max_iterations = 50;
        config
    }

    #[test]
    fn render_row_keeps_index_and_width() {
        let config = config();
        let worker = Worker::new(0, &config);
        let row = RowProducer::new(&config).rows().next().unwrap();
        let pixels = worker.render_row(row);
        assert_eq!(pixels.index, 8);
        assert_eq!(pixels.len(), 6);
    }

    #[test]
    fn pool_publishes_rows_in_descending_order() {
        let config = config();
        let producer = RowProducer::new(&config);
        let input = BoundedQueue::new(4);
        let output = BoundedQueue::new(3);
        let gate = OrderGate::new(config.height);

        let (published, rendered) = crossbeam::scope(|s| {
            let pool: Vec<_> = (0..3)
                .map(|id| {
                    let worker = Worker::new(id, &config);
                    let (input, gate, output) = (&input, &gate, &output);
                    s.spawn(move |_| worker.run(input, gate, output))
                })
                .collect();
            let drain = s.spawn(|_| {
                let mut seen = Vec::new();
                while let Some(row) = output.remove() {
                    seen.push(row.index);
                }
                seen
            });
            producer.feed(&input).unwrap();
            let rendered: usize = pool.into_iter().map(|w| w.join().unwrap().unwrap()).sum();
            output.finish();
            (drain.join().unwrap(), rendered)
        })
        .unwrap();

        assert_eq!(rendered, 9);
        assert_eq!(published, (0..9).rev().collect::<Vec<_>>());
        assert_eq!(gate.next_required(), None);
    }

    #[test]
    fn closed_output_is_an_error() {
        let config = config();
        let input = BoundedQueue::new(4);
        let output: BoundedQueue<PixelRow> = BoundedQueue::new(4);
        let gate = OrderGate::new(config.height);
        input
            .add(RowProducer::new(&config).rows().next().unwrap())
            .unwrap();
        input.close();
        output.close();
        match Worker::new(0, &config).run(&input, &gate, &output) {
            Err(PipelineError::QueueClosed { stage: "output", row: 8 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn aborted_gate_is_an_error() {
        let config = config();
        let input = BoundedQueue::new(4);
        let output: BoundedQueue<PixelRow> = BoundedQueue::new(4);
        let gate = OrderGate::new(config.height);
        let producer = RowProducer::new(&config);
        let mut rows = producer.rows();
        rows.next();
        input.add(rows.next().unwrap()).unwrap();
        input.close();
        gate.abort();
        match Worker::new(0, &config).run(&input, &gate, &output) {
            Err(PipelineError::GateAborted(7)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
