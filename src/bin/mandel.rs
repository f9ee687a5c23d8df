// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use mandelpipe::{ImageSink, Pipeline, PpmSink, RenderConfig, RowSink};
use num::Complex;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const RADIUS: &str = "radius";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const INPUT_CAPACITY: &str = "input-capacity";
const OUTPUT_CAPACITY: &str = "output-capacity";

const MAX_THREADS: usize = 256;

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandel")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; .ppm/.pnm get the text pixmap, others are saved by extension. Defaults to stdout"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| match parse_pair::<u16>(&s, 'x') {
                    Some((w, h)) if w > 0 && h > 0 => Ok(()),
                    Some(_) => Err("Image size must be at least 1x1".to_string()),
                    None => Err("Could not parse output image size".to_string()),
                })
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Point of the complex plane at the center of the image"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0.75")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse zoom",
                        "Zoom must be positive",
                    )
                })
                .help("Magnification; 1.0 spans -1..1 across the shorter side"),
        )
        .arg(
            Arg::with_name(RADIUS)
                .required(false)
                .long(RADIUS)
                .short("r")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse escape radius",
                        "Escape radius must be positive",
                    )
                })
                .help("Escape radius"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("4")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of worker threads"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1024")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iterations before a point counts as inside the set"),
        )
        .arg(
            Arg::with_name(INPUT_CAPACITY)
                .required(false)
                .long(INPUT_CAPACITY)
                .takes_value(true)
                .default_value("400")
                .validator(|s| {
                    validate_range(
                        &s,
                        2,
                        1_000_000,
                        "Could not parse input queue capacity",
                        "Queue capacity must be at least 2",
                    )
                })
                .help("Slots in the queue feeding the workers"),
        )
        .arg(
            Arg::with_name(OUTPUT_CAPACITY)
                .required(false)
                .long(OUTPUT_CAPACITY)
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        2,
                        1_000_000,
                        "Could not parse output queue capacity",
                        "Queue capacity must be at least 2",
                    )
                })
                .help("Slots in the queue feeding the writer"),
        )
        .get_matches()
}

// Every argument has a default and a validator.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> T {
    T::from_str(matches.value_of(name).unwrap())
        .ok()
        .expect("Argument passed validation but did not parse")
}

fn config(matches: &ArgMatches) -> RenderConfig {
    let (width, height): (u16, u16) =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let origin =
        parse_complex(matches.value_of(CENTER).unwrap()).expect("Error parsing center point");
    RenderConfig {
        width: width as usize,
        height: height as usize,
        max_iterations: value(matches, ITERATIONS),
        radius: value(matches, RADIUS),
        zoom: value(matches, ZOOM),
        origin,
        workers: value(matches, THREADS),
        input_capacity: value(matches, INPUT_CAPACITY),
        output_capacity: value(matches, OUTPUT_CAPACITY),
    }
}

fn sink_for(
    output: Option<&str>,
    config: &RenderConfig,
) -> mandelpipe::Result<Box<dyn RowSink + Send>> {
    let (width, height) = (config.width, config.height);
    let path = match output {
        None | Some("-") => {
            let stdout = BufWriter::new(io::stdout());
            return Ok(Box::new(PpmSink::new(stdout, width, height)));
        }
        Some(path) => Path::new(path),
    };
    let text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("ppm") || ext.eq_ignore_ascii_case("pnm"));
    if text {
        let file = BufWriter::new(File::create(path)?);
        Ok(Box::new(PpmSink::new(file, width, height)))
    } else {
        Ok(Box::new(ImageSink::new(path, width, height)?))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = args();
    let config = config(&matches);
    if config.workers > num_cpus::get() {
        warn!(
            workers = config.workers,
            cpus = num_cpus::get(),
            "more worker threads than CPUs"
        );
    }

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
    };
    let mut sink = match sink_for(matches.value_of(OUTPUT), pipeline.config()) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Could not open output: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pipeline.render(&mut sink) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
