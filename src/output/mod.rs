use anyhow::Result;
use std::path::Path;

use crate::transcript::Transcript;

/// Save the finished transcript to a file.
pub fn save_to_file(transcript: &Transcript, path: &Path) -> Result<()> {
    fs_err::write(path, format!("{transcript}\n"))?;
    Ok(())
}

/// Print the finished transcript to stdout.
pub fn print_to_console(transcript: &Transcript) {
    println!("{transcript}");
}
