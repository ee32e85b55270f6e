//! JSON export of aligned tiers.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::error::AlignmentError;
use crate::types::{AlignmentOutput, Tier};

const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct Export<'a> {
    pub schema_version: u32,
    pub meta: ExportMeta,
    pub tiers: &'a [Tier],
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMeta {
    pub generated_at: String,
    pub duration_ms: u64,
    pub unit_count: usize,
}

impl<'a> Export<'a> {
    pub fn new(output: &'a AlignmentOutput) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            meta: ExportMeta {
                generated_at: Utc::now().to_rfc3339(),
                duration_ms: output.duration_ms,
                unit_count: output.units.len(),
            },
            tiers: &output.tiers,
        }
    }
}

pub fn to_json_string(output: &AlignmentOutput) -> Result<String, AlignmentError> {
    serde_json::to_string_pretty(&Export::new(output))
        .map_err(|e| AlignmentError::json("serialize tiers", e))
}

/// Write the export to `path`, creating parent directories as needed.
pub fn write_json(path: &Path, output: &AlignmentOutput) -> Result<(), AlignmentError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AlignmentError::io("create export directory", e))?;
    }
    let mut file = File::create(path).map_err(|e| AlignmentError::io("create export file", e))?;
    serde_json::to_writer_pretty(&mut file, &Export::new(output))
        .map_err(|e| AlignmentError::json("serialize tiers", e))?;
    file.write_all(b"\n")
        .map_err(|e| AlignmentError::io("finalize export file", e))?;
    tracing::info!(path = %path.display(), units = output.units.len(), "export: wrote tiers");
    Ok(())
}
