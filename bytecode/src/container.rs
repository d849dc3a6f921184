//! Persisted container format.
//!
//! A container is one compiled source file: metadata, the literal tables and
//! every closure. Two encodings are supported: JSON for hand-written and
//! inspected programs, and a compact binary encoding (postcard).

use serde::{Deserialize, Serialize};

use crate::{Instruction, Op};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),

    #[error("invalid JSON container: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid binary container: {0}")]
    Binary(#[from] postcard::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub format: String,
    pub format_version: String,
    pub target_version: String,
    pub path: String,
    pub timestamp: u64,
    pub encoding: String,
    pub author: String,
    pub string_literal_table: Vec<String>,
    pub fpt_literal_table: Vec<f64>,
    pub closures: Vec<ClosureRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosureRecord {
    pub name: String,
    pub id: u64,
    #[serde(default)]
    pub parent_id: Option<u64>,
    pub instructions: Vec<InstructionRecord>,
    #[serde(default)]
    pub locs: Vec<LocRecord>,
    #[serde(default)]
    pub catch_sites: Vec<CatchSiteRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub code: u16,
    #[serde(default)]
    pub oprd1: u64,
    #[serde(default)]
    pub oprd2: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocRecord {
    pub index: u64,
    pub lineno: u32,
    pub col_offset: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchSiteRecord {
    pub from: u64,
    pub to: u64,
    pub dst: u64,
}

impl Container {
    pub const FORMAT: &'static str = "pbvm";
    pub const FORMAT_VERSION: &'static str = "1";

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            format: Self::FORMAT.to_owned(),
            format_version: Self::FORMAT_VERSION.to_owned(),
            target_version: env!("CARGO_PKG_VERSION").to_owned(),
            path: path.into(),
            encoding: "utf-8".to_owned(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        Ok(postcard::to_allocvec(self)?)
    }
}

impl From<&Instruction> for InstructionRecord {
    fn from(instr: &Instruction) -> Self {
        Self {
            code: instr.op.code(),
            oprd1: instr.oprd1,
            oprd2: instr.oprd2,
        }
    }
}

impl TryFrom<&InstructionRecord> for Instruction {
    type Error = FormatError;

    fn try_from(rec: &InstructionRecord) -> Result<Self, Self::Error> {
        Ok(Instruction::new(Op::try_from(rec.code)?, rec.oprd1, rec.oprd2))
    }
}
