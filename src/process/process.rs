use std::{fs, io, path::PathBuf};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unable to open file, or process {source_arg}")]
    Unresolvable {
        source_arg: String,
        #[source]
        source: io::Error,
    },
}

/// Where a report's text came from.
#[derive(Debug, PartialEq)]
pub enum Origin {
    File(PathBuf),
    Process { pid: String, cmd_line: Option<String> },
}

/// The text of an smaps report, fully read before any parsing happens.
pub struct SmapsReport {
    pub origin: Origin,
    pub content: String,
}

impl TryFrom<&str> for SmapsReport {
    type Error = InputError;

    /// Tries `arg` as a file first, then as `/proc/<arg>/smaps`.
    fn try_from(arg: &str) -> Result<Self, Self::Error> {
        let path = PathBuf::from(arg);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("read report from {}", path.display());
                return Ok(SmapsReport {
                    origin: Origin::File(path),
                    content,
                });
            }
            Err(err) => debug!("failed to open file {}: {}", path.display(), err),
        }

        let smaps_path = smaps_path(arg);
        let content = fs::read_to_string(&smaps_path).map_err(|source| InputError::Unresolvable {
            source_arg: arg.to_string(),
            source,
        })?;
        debug!("read report from {}", smaps_path.display());

        Ok(SmapsReport {
            origin: Origin::Process {
                pid: arg.to_string(),
                cmd_line: read_cmd_line(arg),
            },
            content,
        })
    }
}

fn smaps_path(pid: &str) -> PathBuf {
    PathBuf::from("/proc").join(pid).join("smaps")
}

fn read_cmd_line(pid: &str) -> Option<String> {
    let raw = fs::read_to_string(PathBuf::from("/proc").join(pid).join("cmdline")).ok()?;
    let cmd_line = raw.replace('\0', " ").trim().to_string();
    (!cmd_line.is_empty()).then_some(cmd_line)
}
