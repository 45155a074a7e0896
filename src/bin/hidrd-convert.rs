// SPDX-License-Identifier: MIT

//! Convert a HID report descriptor between formats.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use hidrd::fmt::Format;
use hidrd::strm::{copy, OutBuf};
use log::info;

#[derive(clap::Parser)]
#[command(version, about = "Convert a HID report descriptor")]
struct Args {
    /// Input format
    #[arg(short = 'i', long = "input-format", value_name = "FORMAT", default_value = "natv")]
    input_format: Format,

    /// Input format options, comma-separated name=value pairs
    #[arg(long = "io", value_name = "OPTS", default_value = "")]
    input_options: String,

    /// Output format
    #[arg(short = 'o', long = "output-format", value_name = "FORMAT", default_value = "natv")]
    output_format: Format,

    /// Output format options, comma-separated name=value pairs
    #[arg(long = "oo", value_name = "OPTS", default_value = "")]
    output_options: String,

    /// List the formats and their options and exit
    #[arg(short = 'l', long)]
    list_formats: bool,

    /// Input file, standard input if missing or "-"
    input: Option<PathBuf>,

    /// Output file, standard output if missing or "-"
    output: Option<PathBuf>,
}

fn is_stdio(path: &Option<PathBuf>) -> bool {
    path.as_ref().map_or(true, |p| p.as_os_str() == "-")
}

fn list_formats() {
    for format in Format::ALL {
        let directions = match (format.has_source(), format.has_sink()) {
            (true, true) => "source, sink",
            (true, false) => "source",
            (false, _) => "sink",
        };
        println!("{:<6}{} ({directions})", format.name(), format.description());
        if format.has_source() {
            for spec in format.source_options() {
                println!("      source option {spec}");
            }
        }
        if format.has_sink() {
            for spec in format.sink_options() {
                println!("      sink option {spec}");
            }
        }
    }
}

fn convert(args: &Args) -> hidrd::Result<()> {
    let mut input = Vec::new();
    match &args.input {
        Some(path) if !is_stdio(&args.input) => input = std::fs::read(path)?,
        _ => {
            std::io::stdin().read_to_end(&mut input)?;
        }
    }
    info!(
        "Converting {} bytes from {} to {}",
        input.len(),
        args.input_format,
        args.output_format
    );

    let mut output = Vec::new();
    {
        let mut source = args.input_format.source(&input, &args.input_options)?;
        let mut sink = args
            .output_format
            .sink(OutBuf::from(&mut output), &args.output_options)?;
        let count = copy(source.as_mut(), sink.as_mut())?;
        info!("Converted {count} items");
    }

    match &args.output {
        Some(path) if !is_stdio(&args.output) => std::fs::write(path, &output)?,
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Args = clap::Parser::parse();
    if args.list_formats {
        list_formats();
        return ExitCode::SUCCESS;
    }

    match convert(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hidrd-convert: {e}");
            ExitCode::FAILURE
        }
    }
}
