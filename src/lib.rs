#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane for
//! which the orbit `z = z * z + c`, started at zero, never runs off to
//! infinity.  Points outside the set are coloured by how quickly their
//! orbit escapes; points inside are black.
//!
//! The interesting part of this crate is not the arithmetic but the
//! plumbing around it.  An image is rendered as a stream of rows:
//!
//! * a [`RowProducer`] generates rows of complex samples, last row first,
//!   into a bounded input queue, blocking when the workers fall behind;
//! * a pool of [`Worker`]s takes rows off that queue and colours them in
//!   parallel, finishing them in whatever order the arithmetic allows;
//! * an [`OrderGate`] makes each worker wait until its row is the next
//!   one due, so rows reach the bounded output queue in the order they
//!   were produced;
//! * an [`OutputSink`] drains the output queue into a [`RowSink`], such
//!   as the plain-text pixmap writer [`PpmSink`].
//!
//! [`Pipeline`] runs all of the above and the shutdown that follows.

pub mod color;
pub mod config;
pub mod error;
pub mod escape;
pub mod gate;
pub mod pipeline;
pub mod planes;
pub mod producer;
pub mod queue;
pub mod row;
pub mod sink;
pub mod workers;

pub use crate::config::RenderConfig;
pub use crate::error::{PipelineError, Result};
pub use crate::gate::OrderGate;
pub use crate::pipeline::{render_ppm, Pipeline, RenderReport};
pub use crate::producer::RowProducer;
pub use crate::queue::BoundedQueue;
pub use crate::row::{PixelRow, Row, SampleRow};
pub use crate::sink::{ImageSink, OutputSink, PpmSink, RowSink};
pub use crate::workers::Worker;
