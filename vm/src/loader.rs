//! Turns persisted containers into compartments.
//!
//! Files ending in `.json` are read as JSON, anything else as the compact
//! binary encoding.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use bytecode::{ClosureRecord, Container, FormatError, Instruction};

use crate::{CatchSite, Closure, Compartment};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unsupported container format `{format}` version `{version}`")]
    UnsupportedFormat { format: String, version: String },

    #[error("closure `{closure}`: unknown opcode {code:#06x} at instruction {index}")]
    UnknownOpcode {
        closure: String,
        index: usize,
        code: u16,
    },

    #[error("closure id {0} is defined twice")]
    DuplicateClosure(u64),

    #[error("closure `{closure}`: catch site destination {dest} is outside its code")]
    InvalidCatchSite { closure: String, dest: u64 },
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn read_container(path: impl AsRef<Path>) -> Result<Container, LoadError> {
    let path = path.as_ref();
    let io = |source: std::io::Error| LoadError::Io {
        path: path.to_owned(),
        source,
    };
    let container = if is_json(path) {
        Container::from_json(&fs::read_to_string(path).map_err(io)?)?
    } else {
        Container::from_bytes(&fs::read(path).map_err(io)?)?
    };
    log::debug!(
        "read container `{}` with {} closure(s)",
        path.display(),
        container.closures.len()
    );
    Ok(container)
}

pub fn write_container(path: impl AsRef<Path>, container: &Container) -> Result<(), LoadError> {
    let path = path.as_ref();
    let bytes = if is_json(path) {
        container.to_json()?.into_bytes()
    } else {
        container.to_bytes()?
    };
    fs::write(path, bytes).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

fn closure_from_record(rec: &ClosureRecord) -> Result<Closure, LoadError> {
    let code = rec
        .instructions
        .iter()
        .enumerate()
        .map(|(index, instr)| {
            Instruction::try_from(instr).map_err(|_| LoadError::UnknownOpcode {
                closure: rec.name.clone(),
                index,
                code: instr.code,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let len = code.len();
    let mut closure = Closure::new(rec.name.clone(), rec.id, rec.parent_id, code);
    for loc in &rec.locs {
        closure = closure.with_loc(loc.index as usize, loc.lineno, loc.col_offset);
    }
    for site in &rec.catch_sites {
        if site.dst >= len as u64 {
            return Err(LoadError::InvalidCatchSite {
                closure: rec.name.clone(),
                dest: site.dst,
            });
        }
        closure = closure.with_catch_site(CatchSite::new(
            site.from as usize,
            site.to as usize,
            site.dst as usize,
        ));
    }
    Ok(closure)
}

pub fn compartment_from_container(container: &Container) -> Result<Compartment, LoadError> {
    let known_format = container.format.is_empty() || container.format == Container::FORMAT;
    let known_version = container.format_version.is_empty()
        || container.format_version == Container::FORMAT_VERSION;
    if !known_format || !known_version {
        return Err(LoadError::UnsupportedFormat {
            format: container.format.clone(),
            version: container.format_version.clone(),
        });
    }

    let mut seen = HashSet::new();
    let mut closures = Vec::with_capacity(container.closures.len());
    for rec in &container.closures {
        if !seen.insert(rec.id) {
            return Err(LoadError::DuplicateClosure(rec.id));
        }
        closures.push(closure_from_record(rec)?);
    }

    let mut compartment = Compartment::new(container.path.clone());
    compartment.set_string_literal_table(container.string_literal_table.clone());
    compartment.set_fpt_literal_table(container.fpt_literal_table.clone());
    compartment.set_closure_table(closures);
    Ok(compartment)
}

/// Reads `path` and builds its compartment. A container without a recorded
/// path is named after the file.
pub fn load_path(path: impl AsRef<Path>) -> Result<Compartment, LoadError> {
    let path = path.as_ref();
    let mut container = read_container(path)?;
    if container.path.is_empty() {
        container.path = path.display().to_string();
    }
    compartment_from_container(&container)
}
