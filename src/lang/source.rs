use super::Error;
use crate::error;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Only the first line, without its terminator.
    FirstLine,
    WholeFile,
}

/// Reads source text, keeping at most `limit - 1` bytes.
pub fn read_source(filename: &str, mode: ReadMode, limit: usize) -> Result<String, Error> {
    let file = match File::open(filename) {
        Ok(file) => file,
        Err(error) => {
            let msg = format!("could not open({})", filename);
            match error.kind() {
                ErrorKind::NotFound => return Err(error!(FileNotFound; &msg)),
                _ => return Err(error!(IoError; &format!("{}: {}", msg, error))),
            }
        }
    };
    let max = limit.saturating_sub(1) as u64;
    let mut reader = BufReader::new(file).take(max);
    let mut bytes = vec![];
    let result = match mode {
        ReadMode::FirstLine => reader.read_until(b'\n', &mut bytes),
        ReadMode::WholeFile => reader.read_to_end(&mut bytes),
    };
    if let Err(error) = result {
        return Err(error!(IoError; &error.to_string()));
    }
    if mode == ReadMode::FirstLine {
        while let Some(b'\n') | Some(b'\r') = bytes.last() {
            bytes.pop();
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
