use anyhow::Result;
use err_derive::Error;
use log::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A document whose on-disk shape is tagged with an integer format version.
///
/// Documents carrying any other version are refused outright; there is no
/// migration between versions.
pub trait Versioned {
    const FORMAT_VERSION: u32;

    fn format_version(&self) -> u32;
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error(
    display = "format version {} is not supported (expected {})",
    found,
    expected
)]
pub struct VersionMismatch {
    pub found: u32,
    pub expected: u32,
}

// Only the version tag is read before committing to the full shape, so an
// incompatible document is reported as a mismatch rather than as whatever
// field happened to change.
#[derive(Deserialize, Debug)]
struct VersionProbe {
    #[serde(rename = "formatVersion", alias = "version")]
    format_version: u32,
}

pub fn decode<D: DeserializeOwned + Versioned>(body: &str) -> Result<D> {
    let probe: VersionProbe = serde_json::from_str(body)?;
    trace!("Probed format version: {}", probe.format_version);
    if probe.format_version != D::FORMAT_VERSION {
        return Err(VersionMismatch {
            found: probe.format_version,
            expected: D::FORMAT_VERSION,
        }
        .into());
    }

    let doc = serde_json::from_str(body)?;
    Ok(doc)
}

pub fn encode<D: Serialize + Versioned>(doc: &D) -> Result<String> {
    debug_assert_eq!(doc.format_version(), D::FORMAT_VERSION);
    let json = serde_json::to_string(doc)?;
    Ok(json)
}
