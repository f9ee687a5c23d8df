// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wires the stages together and runs the shutdown cascade.
//!
//! ```text
//! RowProducer -> input queue -> Worker x N -> OrderGate -> output queue -> OutputSink
//! ```
//!
//! Every stage runs on its own scoped thread, borrowing the queues, the
//! gate and the configuration.  Shutdown is cooperative: the producer
//! finishes the input queue, the workers drain it and exit, and once they
//! have all been joined the output queue is finished and the sink drains
//! it.  If any stage fails or panics both queues are discarded and the
//! gate aborted, so that nothing is left blocked waiting for a stage that
//! is gone.

use crate::config::RenderConfig;
use crate::error::{PipelineError, Result};
use crate::gate::OrderGate;
use crate::producer::RowProducer;
use crate::queue::BoundedQueue;
use crate::row::{PixelRow, SampleRow};
use crate::sink::{OutputSink, PpmSink, RowSink, SinkReport};
use crate::workers::Worker;
use crossbeam::thread::ScopedJoinHandle;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What a finished render did.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Rows written by the sink.
    pub rows: usize,
    /// Pixels written by the sink.
    pub pixels: usize,
    /// Rows rendered by each worker, by worker number.
    pub rows_per_worker: Vec<usize>,
    /// Wall-clock time from start to the sink closing.
    pub elapsed: Duration,
}

// The shared state every stage borrows.
struct Channels {
    input: BoundedQueue<SampleRow>,
    gate: OrderGate,
    output: BoundedQueue<PixelRow>,
}

impl Channels {
    fn new(config: &RenderConfig) -> Self {
        Channels {
            input: BoundedQueue::new(config.input_capacity),
            gate: OrderGate::new(config.height),
            output: BoundedQueue::new(config.output_capacity),
        }
    }

    fn abort(&self) {
        self.gate.abort();
        let input = self.input.discard();
        let output = self.output.discard();
        debug!(input, output, "pipeline aborted, queued rows dropped");
    }
}

// Tears the pipeline down if the stage holding it unwinds.
struct AbortOnPanic<'a>(&'a Channels);

impl<'a> Drop for AbortOnPanic<'a> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

fn guarded<T, F>(channels: &Channels, stage: &str, body: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _guard = AbortOnPanic(channels);
    let result = body();
    if let Err(ref err) = result {
        if err.is_consequence() {
            debug!(stage, %err, "stage stopped by teardown");
        } else {
            warn!(stage, %err, "stage failed, tearing the pipeline down");
        }
        channels.abort();
    }
    result
}

fn join<T>(stage: &str, handle: ScopedJoinHandle<Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(PipelineError::Panicked(stage.to_string())))
}

// The first error that is not just fallout from the teardown.
fn root_cause(errors: Vec<PipelineError>) -> Option<PipelineError> {
    let first = errors.iter().position(|err| !err.is_consequence()).unwrap_or(0);
    errors.into_iter().nth(first)
}

/// A configured, validated render.
pub struct Pipeline {
    config: RenderConfig,
}

impl Pipeline {
    /// Validate `config` and prepare to render it.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    /// The configuration this pipeline renders.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the image into `sink`.  Returns once every row has been
    /// written and the sink closed, or once every stage has stopped after
    /// a failure, in which case the error that started the teardown is
    /// returned.
    pub fn render<S: RowSink + Send + ?Sized>(&self, sink: &mut S) -> Result<RenderReport> {
        let config = &self.config;
        info!(
            width = config.width,
            height = config.height,
            pixels = config.pixels(),
            workers = config.workers,
            iterations = config.max_iterations,
            "render starting"
        );
        let started = Instant::now();
        let channels = Channels::new(config);
        let channels = &channels;

        let outcome = crossbeam::scope(|scope| -> Result<RenderReport> {
            let spawn_failed = |stage: String, err| {
                channels.abort();
                PipelineError::Spawn(stage, err)
            };

            let drain = scope
                .builder()
                .name("sink".to_string())
                .spawn(move |_| {
                    guarded(channels, "sink", || {
                        OutputSink::new(sink, config.height).drain(&channels.output)
                    })
                })
                .map_err(|err| spawn_failed("sink".to_string(), err))?;

            let mut pool = Vec::with_capacity(config.workers);
            for id in 0..config.workers {
                let name = format!("worker-{}", id);
                let worker = Worker::new(id, config);
                let handle = scope
                    .builder()
                    .name(name.clone())
                    .spawn(move |_| {
                        guarded(channels, "worker", || {
                            worker.run(&channels.input, &channels.gate, &channels.output)
                        })
                    })
                    .map_err(|err| spawn_failed(name, err))?;
                pool.push(handle);
            }

            let producer = scope
                .builder()
                .name("producer".to_string())
                .spawn(move |_| {
                    guarded(channels, "producer", || {
                        RowProducer::new(config).feed(&channels.input)
                    })
                })
                .map_err(|err| spawn_failed("producer".to_string(), err))?;

            let mut errors = Vec::new();
            if let Err(err) = join("producer", producer) {
                errors.push(err);
            }
            debug!("input finished, workers draining");

            let mut rows_per_worker = Vec::with_capacity(pool.len());
            for handle in pool {
                match join("worker", handle) {
                    Ok(rendered) => rows_per_worker.push(rendered),
                    Err(err) => {
                        rows_per_worker.push(0);
                        errors.push(err);
                    }
                }
            }
            debug!(?rows_per_worker, "workers joined, finishing output");
            channels.output.finish();

            let sunk = join("sink", drain);
            debug!("sink reached end of stream");
            let report: SinkReport = match sunk {
                Ok(report) => report,
                Err(err) => {
                    errors.insert(0, err);
                    SinkReport::default()
                }
            };

            match root_cause(errors) {
                Some(err) => Err(err),
                None => Ok(RenderReport {
                    rows: report.rows,
                    pixels: report.pixels,
                    rows_per_worker,
                    elapsed: started.elapsed(),
                }),
            }
        });

        let report = outcome
            .unwrap_or_else(|_| Err(PipelineError::Panicked("pipeline".to_string())))?;
        info!(
            rows = report.rows,
            pixels = report.pixels,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "render finished"
        );
        Ok(report)
    }
}

/// Render `config` as a plain-text pixmap into `writer`.
pub fn render_ppm<W: Write + Send>(config: RenderConfig, writer: W) -> Result<RenderReport> {
    let pipeline = Pipeline::new(config)?;
    let mut sink = PpmSink::new(writer, pipeline.config().width, pipeline.config().height);
    pipeline.render(&mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::shade;
    use crate::escape::escape_time;
    use std::io;

    fn small(workers: usize) -> RenderConfig {
        let mut config = RenderConfig::with_size(4, 4);
        config.max_iterations = 50;
        config.workers = workers;
        config
    }

    fn render_text(config: RenderConfig) -> String {
        let mut out = Vec::new();
        render_ppm(config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // The image computed the slow, obvious way.
    fn expected_text(config: &RenderConfig) -> String {
        let mut text = format!("P3\n{} {}\n255\n", config.width, config.height);
        for row in RowProducer::new(config).rows() {
            for c in row.items {
                let escape = escape_time(c, config.max_iterations, config.radius);
                let px = shade(&escape, config.max_iterations, config.radius);
                text.push_str(&format!("{} {} {}\n", px[0], px[1], px[2]));
            }
        }
        text
    }

    #[test]
    fn four_by_four_has_header_and_sixteen_pixels() {
        let text = render_text(small(4));
        assert!(text.starts_with("P3\n4 4\n255\n"));
        assert_eq!(text.lines().count(), 3 + 16);
        assert_eq!(text, expected_text(&small(4)));
    }

    #[test]
    fn one_worker_matches_four() {
        assert_eq!(render_text(small(1)), render_text(small(4)));
    }

    #[test]
    fn tight_queues_with_many_workers() {
        let mut config = RenderConfig::with_size(17, 31);
        config.max_iterations = 200;
        config.workers = 8;
        config.input_capacity = 2;
        config.output_capacity = 2;
        assert_eq!(render_text(config.clone()), expected_text(&config));
    }

    #[test]
    fn report_counts_every_row() {
        let mut out = Vec::new();
        let config = small(3);
        let report = render_ppm(config.clone(), &mut out).unwrap();
        assert_eq!(report.rows, 4);
        assert_eq!(report.pixels, config.pixels());
        assert_eq!(report.pixels, 16);
        assert_eq!(report.rows_per_worker.len(), 3);
        assert_eq!(report.rows_per_worker.iter().sum::<usize>(), 4);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = small(1);
        config.workers = 0;
        match Pipeline::new(config) {
            Err(PipelineError::Config(_)) => (),
            Err(other) => panic!("unexpected {:?}", other),
            Ok(_) => panic!("accepted zero workers"),
        }
    }

    // Accepts a few rows, then fails every write.
    struct FailingSink {
        rows_left: usize,
    }

    impl RowSink for FailingSink {
        fn write_row(&mut self, _: &PixelRow) -> Result<()> {
            if self.rows_left == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away").into());
            }
            self.rows_left -= 1;
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_sink_stops_the_pipeline() {
        let mut config = RenderConfig::with_size(32, 200);
        config.max_iterations = 20;
        config.input_capacity = 4;
        config.output_capacity = 2;
        let pipeline = Pipeline::new(config).unwrap();
        let mut sink = FailingSink { rows_left: 5 };
        match pipeline.render(&mut sink) {
            Err(PipelineError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    struct PanickingSink;

    impl RowSink for PanickingSink {
        fn write_row(&mut self, _: &PixelRow) -> Result<()> {
            panic!("sink blew up");
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn panicking_stage_is_reported() {
        let pipeline = Pipeline::new(small(2)).unwrap();
        match pipeline.render(&mut PanickingSink) {
            Err(PipelineError::Panicked(ref stage)) if stage == "sink" => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn root_cause_skips_teardown_fallout() {
        let errors = vec![
            PipelineError::GateAborted(3),
            PipelineError::Panicked("worker".to_string()),
            PipelineError::QueueClosed { stage: "input", row: 1 },
        ];
        match root_cause(errors) {
            Some(PipelineError::Panicked(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        match root_cause(vec![PipelineError::GateAborted(3)]) {
            Some(PipelineError::GateAborted(3)) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(root_cause(Vec::new()).is_none());
    }
}
