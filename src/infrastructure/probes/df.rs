//! Decoder for `df` output.
//!
//! Columns are located by header name, so both the default GNU layout
//! (`1K-blocks`, `Use%`) and the POSIX `-P` layout (`1024-blocks`,
//! `Capacity`) decode. Block counts are converted to bytes.

use std::collections::BTreeMap;

use thiserror::Error;

const BLOCK_SIZE: u64 = 1024;

/// One mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub filesystem: String,
    pub total: Option<u64>,
    pub used: Option<u64>,
    pub free: Option<u64>,
    pub percent: Option<String>,
    pub mountpoint: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DfError {
    #[error("df produced no output")]
    NoOutput,

    #[error("Could not decode df header: {0}")]
    BadHeader(String),

    #[error("Block count {0} does not fit in bytes")]
    BlockOverflow(String),
}

/// Bytes for a block count cell. Non-numeric cells (`-`) have no value.
fn block_bytes(cell: &str) -> Result<Option<u64>, DfError> {
    let Ok(blocks) = cell.parse::<u64>() else {
        return Ok(None);
    };
    blocks
        .checked_mul(BLOCK_SIZE)
        .map(Some)
        .ok_or_else(|| DfError::BlockOverflow(cell.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Filesystem,
    Total,
    Used,
    Free,
    Percent,
    Mountpoint,
}

impl Column {
    fn from_heading(heading: &str) -> Option<Self> {
        let h = heading.to_lowercase();
        if h.contains("filesystem") {
            Some(Self::Filesystem)
        } else if h.contains("blocks") {
            Some(Self::Total)
        } else if h == "used" {
            Some(Self::Used)
        } else if h.contains("avail") {
            Some(Self::Free)
        } else if h.contains("use%") || h.contains("capacity") {
            Some(Self::Percent)
        } else if h.contains("mount") {
            Some(Self::Mountpoint)
        } else {
            None
        }
    }
}

/// Decode `df` output into mounts keyed by mountpoint.
pub fn decode_df(output: &str) -> Result<BTreeMap<String, MountInfo>, DfError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or(DfError::NoOutput)?;
    let columns: Vec<Option<Column>> = header.split_whitespace().map(Column::from_heading).collect();
    if !columns.contains(&Some(Column::Mountpoint)) {
        return Err(DfError::BadHeader(header.to_string()));
    }

    let mut mounts = BTreeMap::new();
    for line in lines {
        let mut info = MountInfo {
            filesystem: String::new(),
            total: None,
            used: None,
            free: None,
            percent: None,
            mountpoint: String::new(),
        };
        for (cell, column) in line.split_whitespace().zip(&columns) {
            match column {
                Some(Column::Filesystem) => info.filesystem = cell.to_string(),
                Some(Column::Total) => info.total = block_bytes(cell)?,
                Some(Column::Used) => info.used = block_bytes(cell)?,
                Some(Column::Free) => info.free = block_bytes(cell)?,
                Some(Column::Percent) => info.percent = Some(cell.to_string()),
                Some(Column::Mountpoint) => info.mountpoint = cell.to_string(),
                None => {}
            }
        }
        if !info.mountpoint.is_empty() {
            mounts.insert(info.mountpoint.clone(), info);
        }
    }
    Ok(mounts)
}
