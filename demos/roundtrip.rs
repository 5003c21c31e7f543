//! Encode a label given on the command line and decode it again.
//!
//! ```text
//! cargo run --example roundtrip -- -4 3 4 11
//! ORDPATH_SETUP="0:3:-4 1:3" cargo run --example roundtrip -- 5 -1
//! ```

use std::process::ExitCode;

use ordpath_rs::{Codec, DEFAULT_SETUP, OrdpathErr};

fn run(setup: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let codec = Codec::new(setup)?;
    println!("codec: {codec:?}");

    let label = args.iter().map(|arg| arg.parse::<i64>()).collect::<Result<Vec<_>, _>>()?;
    let encoded = codec.encode_to_bytes(&label)?;
    println!("bits:  {}", encoded.bit_len());
    println!("bytes: {:02x?}", encoded.as_bytes());

    let decoded = encoded.decode(&codec)?;
    println!("label: {decoded:?}");
    if decoded != label {
        return Err(OrdpathErr::Internal.into());
    }
    Ok(())
}

fn main() -> ExitCode {
    let setup = std::env::var("ORDPATH_SETUP").unwrap_or_else(|_| DEFAULT_SETUP.to_string());
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&setup, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
