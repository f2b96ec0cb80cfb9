//! Oracle backed by a child process speaking one JSON line per event.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use seatlog_core::Oracle;
use seatlog_engine::{SeatError, SeatResult};
use tracing::debug;

/// Runs `program` and talks to it over its stdin/stdout.
///
/// Every event is written as one line and the child must answer with
/// exactly one line: an action, or `null`/an empty line for no action.
/// The child's stderr is inherited.
pub struct ProcessOracle {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl ProcessOracle {
    pub fn spawn(program: &str, args: &[String]) -> SeatResult<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SeatError::oracle(format!("failed to spawn {program}: {e}")))?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SeatError::oracle("oracle stdout is not piped"))?;
        debug!(program, pid = child.id(), "oracle process started");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            line: String::new(),
        })
    }
}

impl Oracle for ProcessOracle {
    fn react(&mut self, event: &str) -> SeatResult<Option<String>> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SeatError::oracle("oracle stdin is closed"))?;
        writeln!(stdin, "{event}")
            .and_then(|()| stdin.flush())
            .map_err(|e| SeatError::oracle(format!("writing to oracle: {e}")))?;

        self.line.clear();
        let read = self
            .stdout
            .read_line(&mut self.line)
            .map_err(|e| SeatError::oracle(format!("reading from oracle: {e}")))?;
        if read == 0 {
            return Err(SeatError::oracle("oracle exited before answering"));
        }
        Ok(parse_response(&self.line))
    }
}

impl Drop for ProcessOracle {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill().and_then(|()| self.child.wait().map(drop)) {
            debug!(error = %e, "oracle process already gone");
        }
    }
}

/// `null` or a blank line means the oracle passes.
fn parse_response(line: &str) -> Option<String> {
    let line = line.trim();
    (!line.is_empty() && line != "null").then(|| line.to_owned())
}
