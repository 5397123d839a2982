use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::input::InputError;

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads one line into `buf`, replacing invalid UTF-8 (timing consoles often
/// export Latin-1 names). Returns `false` at end of input.
pub fn read_line_lossy<R: BufRead + ?Sized>(
    reader: &mut R,
    raw: &mut Vec<u8>,
    buf: &mut String,
) -> Result<bool, InputError> {
    raw.clear();
    buf.clear();
    let read = reader.read_until(b'\n', raw)?;
    if read == 0 {
        return Ok(false);
    }
    buf.push_str(&String::from_utf8_lossy(raw));
    Ok(true)
}
