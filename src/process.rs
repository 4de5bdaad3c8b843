//! Invocation of external command-line tools.
//!
//! Adapters map the plain-text failure returned here onto their own error
//! variant, so a missing `pdftoppm` becomes a render error and a missing
//! `tesseract` a recognition error.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_CHARS: usize = 300;

/// Run `program` with `args`, optionally feeding `stdin`, and return stdout.
///
/// Fails with a human-readable reason when the program cannot be spawned or
/// exits unsuccessfully.
pub(crate) fn run_tool<I, S>(
    program: &Path,
    args: I,
    stdin: Option<&[u8]>,
) -> std::result::Result<Vec<u8>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to run {}: {}", name, e))?;

    let output = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => std::thread::scope(|scope| {
            // Feed stdin from a second thread so a full stdout pipe cannot deadlock us.
            let writer = scope.spawn(move || pipe.write_all(input));
            let output = child.wait_with_output();
            match writer.join() {
                Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    log::warn!("{}: failed to write stdin: {}", name, e);
                },
                Err(_) => log::warn!("{}: stdin writer panicked", name),
                _ => {},
            }
            output
        }),
        _ => child.wait_with_output(),
    }
    .map_err(|e| format!("failed to wait for {}: {}", name, e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
        Err(format!("{} exited with {}: {}", name, output.status, excerpt))
    }
}
