//! Roster and config file reading.

use std::path::Path;

use log::warn;

use crate::CliError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How a byte buffer was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Windows1252,
}

/// Decode file bytes: UTF-8 with an optional BOM, else Windows-1252
/// (spreadsheet exports). Windows-1252 decoding never fails.
pub fn decode(bytes: &[u8]) -> (String, Encoding) {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), Encoding::Utf8),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (decoded.into_owned(), Encoding::Windows1252)
        }
    }
}

/// Read a roster file into text.
pub fn read_roster(path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::input(format!("cannot read {}: {e}", path.display())))?;
    let (text, encoding) = decode(&bytes);
    if encoding == Encoding::Windows1252 {
        warn!("{} is not valid UTF-8; decoded as Windows-1252", path.display());
    }
    Ok(text)
}

pub fn read_config(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", path.display())))
}
