//! The `.arc` archive text format: newline-delimited `key <genome>` /
//! `id <identifier>` records with an optional leading format stamp.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::error::Error;

/// Stamp emitted at the top of archives we write. Archives lacking it
/// are "external": their keys may not follow the canonical convention
/// and must be re-canonicalized by the caller.
pub const FORMAT_STAMP: &str = "Made by CrystalNets.jl v";

/// The format major version this reader understands.
const SUPPORTED_MAJOR: u32 = 0;

#[derive(Debug, Clone, Default)]
pub struct ArcContents {
    /// Version from the format stamp; `None` for external archives.
    pub version: Option<String>,
    /// `(genome key, identifier)` pairs in file order.
    pub entries: Vec<(String, String)>,
}

impl ArcContents {
    pub fn is_external(&self) -> bool {
        self.version.is_none()
    }
}

pub fn read_file(path: &Path) -> Result<ArcContents, Error> {
    read(BufReader::new(File::open(path)?))
}

pub fn read<R: BufRead>(reader: R) -> Result<ArcContents, Error> {
    let mut version = None;
    let mut entries = Vec::new();
    let mut pending_key: Option<(usize, String)> = None;
    let mut first_content = true;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if first_content {
            first_content = false;
            if let Some(rest) = trimmed.strip_prefix(FORMAT_STAMP) {
                check_version(rest)?;
                version = Some(rest.to_string());
                continue;
            }
        }
        if let Some(genome) = trimmed.strip_prefix("key ") {
            if let Some((at, _)) = pending_key {
                return Err(Error::archive(at, "key record without a following id"));
            }
            pending_key = Some((lineno, genome.trim().to_string()));
        } else if let Some(id) = trimmed.strip_prefix("id ") {
            let Some((_, genome)) = pending_key.take() else {
                return Err(Error::archive(lineno, "id record without a preceding key"));
            };
            entries.push((genome, id.trim().to_string()));
        } else {
            return Err(Error::archive(
                lineno,
                format!("unrecognized record '{}'", trimmed),
            ));
        }
    }
    if let Some((at, _)) = pending_key {
        return Err(Error::archive(at, "key record without a following id"));
    }
    Ok(ArcContents { version, entries })
}

fn check_version(version: &str) -> Result<(), Error> {
    let major = version
        .split('.')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| Error::ArchiveVersion(version.to_string()))?;
    if major != SUPPORTED_MAJOR {
        return Err(Error::ArchiveVersion(version.to_string()));
    }
    Ok(())
}

pub fn write_file<'a, I>(path: &Path, entries: I) -> Result<(), Error>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut file = File::create(path)?;
    write(&mut file, entries)
}

pub fn write<'a, W, I>(out: &mut W, entries: I) -> Result<(), Error>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    writeln!(out, "{}{}", FORMAT_STAMP, env!("CARGO_PKG_VERSION"))?;
    for (genome, id) in entries {
        writeln!(out, "key {}", genome)?;
        writeln!(out, "id {}", id)?;
    }
    Ok(())
}
