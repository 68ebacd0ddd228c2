use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use voidpen_core::words;

#[derive(Args)]
pub struct CountArgs {
    /// File to count; reads stdin when omitted
    pub file: Option<PathBuf>,
}

pub fn run(args: CountArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = match args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    println!("{}", words::count(&text));
    Ok(())
}
