// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The end of the pipeline.  [`OutputSink`] drains the output queue and
//! hands each row, in the order received, to a [`RowSink`].

use crate::error::{PipelineError, Result};
use crate::queue::BoundedQueue;
use crate::row::PixelRow;
use image::{ImageFormat, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can consume finished rows.
pub trait RowSink {
    /// Accept the next row.
    fn write_row(&mut self, row: &PixelRow) -> Result<()>;

    /// Called once, after the last row.
    fn close(&mut self) -> Result<()>;
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn write_row(&mut self, row: &PixelRow) -> Result<()> {
        (**self).write_row(row)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Writes rows as a plain-text (P3) pixmap: the header, then one
/// `R G B` line per pixel.
pub struct PpmSink<W: Write> {
    writer: W,
    width: usize,
    height: usize,
    header_written: bool,
}

impl<W: Write> PpmSink<W> {
    /// A sink for a `width` by `height` image.
    pub fn new(writer: W, width: usize, height: usize) -> Self {
        PpmSink {
            writer,
            width,
            height,
            header_written: false,
        }
    }

    fn header(&mut self) -> Result<()> {
        if !self.header_written {
            write!(self.writer, "P3\n{} {}\n255\n", self.width, self.height)?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for PpmSink<W> {
    fn write_row(&mut self, row: &PixelRow) -> Result<()> {
        debug_assert_eq!(row.len(), self.width);
        self.header()?;
        for pixel in &row.items {
            writeln!(self.writer, "{} {} {}", pixel[0], pixel[1], pixel[2])?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.header()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects rows into an in-memory image and saves it, in whatever
/// format the file extension names, once the stream ends.  Row `i` lands
/// on line `height - 1 - i`, the same orientation as the P3 stream.
pub struct ImageSink {
    image: RgbImage,
    path: PathBuf,
}

impl ImageSink {
    /// A sink that will save a `width` by `height` image to `path`.
    /// Fails up front if the extension names no format `image` knows.
    pub fn new<P: AsRef<Path>>(path: P, width: usize, height: usize) -> Result<Self> {
        ImageFormat::from_path(path.as_ref())?;
        Ok(ImageSink {
            image: RgbImage::new(width as u32, height as u32),
            path: path.as_ref().to_path_buf(),
        })
    }

    /// The image as assembled so far.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl RowSink for ImageSink {
    fn write_row(&mut self, row: &PixelRow) -> Result<()> {
        let y = self.image.height() - 1 - row.index as u32;
        for (x, pixel) in row.items.iter().enumerate() {
            self.image.put_pixel(x as u32, y, *pixel);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.image.save(&self.path)?;
        debug!(path = %self.path.display(), "image saved");
        Ok(())
    }
}

/// What the sink saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Rows written.
    pub rows: usize,
    /// Pixels written.
    pub pixels: usize,
}

/// Drains the output queue into a [`RowSink`].
pub struct OutputSink<'a, S: RowSink + ?Sized> {
    sink: &'a mut S,
    expected_rows: usize,
}

impl<'a, S: RowSink + ?Sized> OutputSink<'a, S> {
    /// Drain into `sink`, expecting `expected_rows` rows in all.
    pub fn new(sink: &'a mut S, expected_rows: usize) -> Self {
        OutputSink {
            sink,
            expected_rows,
        }
    }

    /// Write rows until the queue reports end of stream, then close the
    /// sink.  A stream that ends short, which only happens when the
    /// pipeline is being torn down, is not closed and reports
    /// [`PipelineError::Truncated`].
    pub fn drain(self, queue: &BoundedQueue<PixelRow>) -> Result<SinkReport> {
        let mut report = SinkReport::default();
        while let Some(row) = queue.remove() {
            self.sink.write_row(&row)?;
            report.rows += 1;
            report.pixels += row.len();
        }
        if report.rows != self.expected_rows {
            return Err(PipelineError::Truncated {
                expected: self.expected_rows,
                written: report.rows,
            });
        }
        self.sink.close()?;
        debug!(rows = report.rows, pixels = report.pixels, "output drained");
        Ok(report)
    }
}
