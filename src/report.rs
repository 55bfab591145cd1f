//! Status lines printed by the command-line tools.
//!
//! Every run prints at most three lines to its sink: `Processing: <path>`
//! once the arguments resolve, then either `SUCCESS` or `ERROR: <message>`.
//! The exit code follows the last line: 0 for success, 1 for any error.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

/// Writes status lines to a sink and maps outcomes to exit codes.
///
/// Write failures on the sink are ignored: a closed stdout must not turn a
/// successful conversion into a failure.
#[derive(Debug)]
pub struct StatusReporter<W: Write> {
    out: W,
}

impl<W: Write> StatusReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn processing(&mut self, input: &Path) {
        let _ = writeln!(self.out, "Processing: {}", input.display());
        let _ = self.out.flush();
    }

    pub fn success(&mut self) -> u8 {
        let _ = writeln!(self.out, "SUCCESS");
        let _ = self.out.flush();
        0
    }

    pub fn error(&mut self, message: impl Display) -> u8 {
        let _ = writeln!(self.out, "ERROR: {message}");
        let _ = self.out.flush();
        1
    }

    /// Report `outcome` and return the matching process exit code.
    pub fn finish<T, E: Display>(&mut self, outcome: Result<T, E>) -> ExitCode {
        let code = match outcome {
            Ok(_) => self.success(),
            Err(e) => self.error(e),
        };
        ExitCode::from(code)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
