use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use chorus_sync::cached_file::CachedFile;

#[derive(Parser)]
#[command(name = "verify-sng")]
#[command(about = "Check a downloaded .sng archive against its catalog MD5")]
struct Args {
    /// Archive to verify
    file: PathBuf,

    /// Expected MD5 hex digest; defaults to the file stem, which is the
    /// digest for archives fetched straight from the catalog
    expected: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let expected = match args.expected {
        Some(expected) => expected,
        None => match args.file.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if stem.len() == 32 && stem.bytes().all(|b| b.is_ascii_hexdigit()) => {
                stem.to_string()
            }
            _ => bail!(
                "{:?} is not named after its digest; pass the expected MD5 explicitly",
                args.file
            ),
        },
    };

    let cached = CachedFile::build(args.file.clone())?;
    let actual = cached.digest()?;

    if !actual.eq_ignore_ascii_case(&expected) {
        bail!(
            "Digest mismatch for {:?}: expected {}, got {}",
            args.file,
            expected,
            actual
        );
    }

    println!("{} OK ({} bytes)", actual, cached.size());
    Ok(())
}
