//! The external converter seam.
//!
//! The [`Converter`] trait is the only thing the rest of the pipeline knows
//! about the tool that turns one source file into one HTML artifact. The
//! production implementation is [`MarimoConverter`], which shells out to
//! `uvx marimo export ...` (or any configured prefix) and waits for it.
//!
//! ## Invocation
//!
//! ```text
//! <tool...> <kind export args...> <source> -o <output>
//! uvx marimo export html --sandbox notebooks/fibonacci.py -o _site/notebooks/fibonacci.html
//! ```
//!
//! Standard streams are captured. A nonzero exit, a failed launch and a
//! timeout are reported as distinct [`ConvertError`] variants so callers can
//! tell a broken environment from a broken notebook.

use crate::config::ConverterConfig;
use crate::kind::{DEFAULT_TOOL, Kind};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// How often a running conversion is polled when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Converter command is empty")]
    EmptyCommand,
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Converter exited with {}: {}", describe_code(.code), .stderr.trim())]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("Converter timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Converter reported success but wrote no file at {0}")]
    MissingOutput(PathBuf),
    #[error("Output {} is already produced by {}", .output.display(), .first.display())]
    DuplicateOutput { output: PathBuf, first: PathBuf },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (killed by signal)".to_string(),
    }
}

/// Converts one source file into one HTML file.
///
/// Implementations must be `Sync`: the exporter calls them from a rayon pool.
pub trait Converter: Sync {
    fn convert(&self, kind: Kind, source: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// Runs the marimo CLI as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct MarimoConverter {
    tool: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for MarimoConverter {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.iter().map(|s| s.to_string()).collect(),
            timeout: None,
        }
    }
}

impl MarimoConverter {
    pub fn new(tool: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { tool, timeout }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.command.clone(), config.timeout())
    }

    /// The complete argument vector for one conversion, program first.
    pub fn invocation(&self, kind: Kind, source: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.tool.iter().map(OsString::from).collect();
        args.extend(kind.export_args().iter().map(OsString::from));
        args.push(source.as_os_str().to_owned());
        args.push("-o".into());
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Converter for MarimoConverter {
    fn convert(&self, kind: Kind, source: &Path, output: &Path) -> Result<(), ConvertError> {
        let args = self.invocation(kind, source, output);
        let (program, rest) = args.split_first().ok_or(ConvertError::EmptyCommand)?;
        debug!(command = ?args, "running converter");

        let start = Instant::now();
        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout reaches the tool's children too.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command
            .spawn()
            .map_err(|source| ConvertError::Launch {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty tool can't block on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = wait(&mut child, self.timeout)? else {
            // Readers are detached: grandchildren may still hold the pipes open.
            return Err(ConvertError::TimedOut(self.timeout.unwrap_or_default()));
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        debug!(
            source = %source.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            stdout = %stdout.trim(),
            "converter finished"
        );

        if status.success() {
            Ok(())
        } else {
            Err(ConvertError::NonZeroExit {
                code: status.code(),
                stderr,
            })
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for the child, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` when the child was killed.
fn wait(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            kill(child);
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and, on unix, every process in its group.
///
/// `uvx` starts marimo as a grandchild; killing only the direct child would
/// leave it running and still able to write the output file.
fn kill(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let status = Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            debug!(error = %e, "could not signal process group");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
