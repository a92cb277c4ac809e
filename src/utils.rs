//! Utility functions for files and paths.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::io::{self, BufRead, BufReader, Read};
use std::env;

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file appears to be gzip-compressed.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let Ok(file) = File::open(filename) else {
        return false;
    };
    let mut reader = BufReader::new(file);
    let mut magic = [0; 2];
    let len = reader.read(&mut magic).ok();
    len == Some(2) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(&filename)?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

//-----------------------------------------------------------------------------

// Path handling.

/// Expands a leading `~` to the home directory and makes the path absolute.
///
/// The path does not need to exist.
/// If the home directory or the working directory cannot be determined, the path is returned as far as it was resolved.
pub fn absolute_path(path: &str) -> PathBuf {
    let expanded = match (path.strip_prefix('~'), env::var_os("HOME")) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            let mut buf = PathBuf::from(home);
            buf.push(rest.trim_start_matches('/'));
            buf
        },
        _ => PathBuf::from(path),
    };
    if expanded.is_absolute() {
        return expanded;
    }
    match env::current_dir() {
        Ok(mut buf) => {
            buf.push(expanded);
            buf
        },
        Err(_) => expanded,
    }
}

/// Returns the file name without `.vcf` or `.vcf.gz`.
///
/// Other extensions are kept as a part of the name.
pub fn vcf_stem<P: AsRef<Path>>(filename: P) -> Option<String> {
    let name = filename.as_ref().file_name()?.to_str()?;
    let stem = name.strip_suffix(".vcf.gz").or_else(|| name.strip_suffix(".vcf")).unwrap_or(name);
    Some(stem.to_string())
}

/// Returns `true` if the file name ends with `.vcf` or `.vcf.gz`.
pub fn is_vcf_name<P: AsRef<Path>>(filename: P) -> bool {
    filename.as_ref().file_name().and_then(|x| x.to_str()).is_some_and(|name| {
        name.ends_with(".vcf") || name.ends_with(".vcf.gz")
    })
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
