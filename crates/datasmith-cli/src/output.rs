use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use datasmith_trees::Tree;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CliError, CliResult};

pub fn load_json(path: &Path) -> CliResult<Value> {
    let contents = std::fs::read_to_string(path).map_err(|err| CliError::io(path, err))?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn load_tree(path: &Path) -> CliResult<Tree> {
    match load_json(path)? {
        Value::Object(tree) => Ok(tree),
        _ => Err(CliError::InvalidConfig(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// Write `value` as JSON to `out`, or to stdout when no path is given.
pub fn emit<T: Serialize>(value: &T, out: Option<&Path>, pretty: bool) -> CliResult<()> {
    let mut data = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    data.push(b'\n');

    match out {
        Some(path) => write_bytes_atomic(path, &data),
        None => io::stdout()
            .write_all(&data)
            .map_err(|err| CliError::io("<stdout>", err)),
    }
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> CliResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent).map_err(|err| CliError::io(parent, err))?;
    }

    let tmp_path = temp_path(path)?;
    let write = || -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    };
    write().map_err(|err| {
        let _ = std::fs::remove_file(&tmp_path);
        CliError::io(path, err)
    })
}

fn temp_path(path: &Path) -> CliResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidConfig(format!("invalid output path {}", path.display())))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
