use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::{Arg, Command, value_parser};
use grib_conv::Grib1Transcoder;

fn app() -> Command {
    Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts a GRIB2 file to a GRIB1 file")
        .arg(
            Arg::new("input")
                .help("GRIB2 file to convert")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("output")
                .help("GRIB1 file to create")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let matches = app().get_matches();
    let input = matches.get_one::<PathBuf>("input").unwrap();
    let output = matches.get_one::<PathBuf>("output").unwrap();

    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);

    let mut transcoder = Grib1Transcoder::new();
    let (messages, grids) = transcoder.transcode_stream(reader, &mut writer)?;

    println!("Number of GRIB2 messages read: {messages}");
    println!("Number of GRIB1 grids written to output: {grids}");
    Ok(())
}

fn main() {
    if let Err(ref e) = real_main() {
        let red = console::Style::new().red();
        eprintln!("{}: {e}", red.apply_to("error"));
        std::process::exit(1);
    }
}
