//! Text output and line input seen by the interpreter
//!
//! The interpreter only ever emits decoded text and newline requests, and
//! only asks for whole lines of input. Console implementations back the CLI;
//! the capturing and scripted ones drive tests.

use crate::error::ZError;
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Where decoded text goes
pub trait OutputSink {
    fn print(&mut self, text: &str) -> Result<(), ZError>;

    fn new_line(&mut self) -> Result<(), ZError>;
}

/// Where `sread` gets its lines. `None` means input is exhausted.
pub trait LineSource {
    fn read_line(&mut self) -> Result<Option<String>, ZError>;
}

/// Writes to stdout, flushing after each print so prompts appear before input
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn print(&mut self, text: &str) -> Result<(), ZError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn new_line(&mut self) -> Result<(), ZError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Collects output into a shared transcript. Clones share the same buffer,
/// so a test can keep one handle and give the other to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    transcript: Rc<RefCell<String>>,
}

impl CaptureOutput {
    pub fn new() -> Self {
        CaptureOutput::default()
    }

    pub fn transcript(&self) -> String {
        self.transcript.borrow().clone()
    }
}

impl OutputSink for CaptureOutput {
    fn print(&mut self, text: &str) -> Result<(), ZError> {
        self.transcript.borrow_mut().push_str(text);
        Ok(())
    }

    fn new_line(&mut self) -> Result<(), ZError> {
        self.transcript.borrow_mut().push('\n');
        Ok(())
    }
}

/// Reads lines from stdin. End of file ends input.
#[derive(Debug, Default)]
pub struct StdinInput;

impl LineSource for StdinInput {
    fn read_line(&mut self) -> Result<Option<String>, ZError> {
        let mut line = String::new();
        let bytes_read = io::stdin().lock().read_line(&mut line)?;
        if bytes_read == 0 {
            debug!("stdin closed");
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Replays a fixed list of lines, then reports end of input
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self) -> Result<Option<String>, ZError> {
        Ok(self.lines.pop_front())
    }
}

/// No input at all; the first `sread` halts the run
#[derive(Debug, Default)]
pub struct NoInput;

impl LineSource for NoInput {
    fn read_line(&mut self) -> Result<Option<String>, ZError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_capture_shares_transcript() {
        let capture = CaptureOutput::new();
        let mut sink: Box<dyn OutputSink> = Box::new(capture.clone());
        sink.print("West of House").unwrap();
        sink.new_line().unwrap();
        sink.print(">").unwrap();
        assert_eq!(capture.transcript(), "West of House\n>");
    }

    #[test]
    fn test_scripted_input_runs_out() {
        let mut input = ScriptedInput::new(["open mailbox", "read leaflet"]);
        assert_eq!(input.read_line().unwrap().as_deref(), Some("open mailbox"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("read leaflet"));
        assert_eq!(input.read_line().unwrap(), None);
        assert_eq!(NoInput.read_line().unwrap(), None);
    }
}
