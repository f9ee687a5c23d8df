// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type every stage of the pipeline reports through.

use failure::Fail;
use std::io;

/// Everything that can stop a render.  Queue and gate failures are
/// usually the *consequence* of some other stage failing first; see
/// [`PipelineError::is_consequence`].
#[derive(Debug, Fail)]
pub enum PipelineError {
    /// The render configuration was rejected before anything started.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(String),

    /// A stage tried to hand a row to a queue that had already closed.
    #[fail(display = "{} queue closed before row {} could be enqueued", stage, row)]
    QueueClosed {
        /// Which queue refused the row ("input" or "output").
        stage: &'static str,
        /// Index of the row that was refused.
        row: usize,
    },

    /// A worker was waiting for its turn to publish when the pipeline
    /// was torn down.
    #[fail(display = "row {} was abandoned while waiting for its turn", _0)]
    GateAborted(usize),

    /// The sink saw the stream end before every row had arrived.
    #[fail(display = "output ended after {} of {} rows", written, expected)]
    Truncated {
        /// Rows the image should have.
        expected: usize,
        /// Rows that actually arrived.
        written: usize,
    },

    /// A stage panicked.
    #[fail(display = "{} thread panicked", _0)]
    Panicked(String),

    /// The operating system refused to start a thread.
    #[fail(display = "could not start {} thread: {}", _0, _1)]
    Spawn(String, #[cause] io::Error),

    /// Writing the image failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),

    /// The image crate failed to encode or save the picture.
    #[fail(display = "image error: {}", _0)]
    Image(#[cause] image::ImageError),
}

impl PipelineError {
    /// True for errors that only happen because the pipeline was already
    /// being torn down on behalf of some other failure.
    pub fn is_consequence(&self) -> bool {
        match self {
            PipelineError::QueueClosed { .. }
            | PipelineError::GateAborted(_)
            | PipelineError::Truncated { .. } => true,
            _ => false,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::Image(err)
    }
}

/// Results of pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
