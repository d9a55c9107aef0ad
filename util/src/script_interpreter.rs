//! # Shore message script interpreter
//!
//! This module provides an interpreter for timed scripts of shore station messages, allowing the
//! boat to be exercised without a real shore station. Each line of a script has the form
//!
//! ```text
//! <time_s>: <message as JSON>;
//! ```
//!
//! for example `5.0: {"CmdOther": {"ack": true, "command": "ReturnStation"}};`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::msg::Message;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Matches `<time>: <payload>;` at the start of a line.
const LINE_PATTERN: &str = r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to occur at a specific time.
#[derive(Debug)]
pub struct Command {
    /// The time the message is supposed to arrive at
    exec_time_s: f64,

    msg: Message
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to acquire a list of
/// messages that are now due.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: PathBuf,
    cmds: VecDeque<Command>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMessage(f64, serde_json::Error),

    #[error("Script timestamps must not decrease (found {1} s after {0} s)")]
    OutOfOrder(f64, f64)
}

/// Messages that are due from the script.
#[derive(Debug, PartialEq)]
pub enum PendingMessages {
    None,
    Some(Vec<Message>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::parse(&script)?;
        si.script_path = path;

        Ok(si)
    }

    /// Create a new interpreter from the text of a script.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let mut cmds: VecDeque<Command> = VecDeque::new();

        // The pattern is a constant, so it only fails to build if it's been edited badly
        let re = match RegexBuilder::new(LINE_PATTERN).multi_line(true).build() {
            Ok(r) => r,
            Err(_) => return Err(ScriptError::ScriptEmpty)
        };

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}: {}", time_str, e)))?;

            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let msg: Message = serde_json::from_str(payload.trim())
                .map_err(|e| ScriptError::InvalidMessage(exec_time_s, e))?;

            if let Some(prev) = cmds.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s));
                }
            }

            cmds.push_back(Command { exec_time_s, msg });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: PathBuf::new(),
            cmds
        })
    }

    /// Return the messages whose time is at or before `now_s`.
    pub fn get_pending(&mut self, now_s: f64) -> PendingMessages {
        if self.cmds.is_empty() {
            return PendingMessages::EndOfScript
        }

        let mut msgs = vec![];

        while let Some(c) = self.cmds.front() {
            if c.exec_time_s > now_s {
                break
            }
            if let Some(c) = self.cmds.pop_front() {
                msgs.push(c.msg);
            }
        }

        if msgs.is_empty() {
            PendingMessages::None
        }
        else {
            PendingMessages::Some(msgs)
        }
    }

    /// Get the number of messages remaining in the script
    pub fn get_num_msgs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Path the script was loaded from (empty for scripts built from text)
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msg::{Command as ShoreCommand, EcefStatus};

    const SCRIPT: &str = r#"
        0.5: {"GpsEcef": {"ack": true, "status": "Origin", "x": 3980000.0, "y": -10000.0, "z": 4970000.0}};
        # comments and blank lines are skipped

        4: {"Heartbeat": {"data": 0}};
        4.0: {"CmdOther": {"ack": true, "command": "ReturnStation"}};
    "#;

    #[test]
    fn test_pending_messages() {
        let mut si = ScriptInterpreter::parse(SCRIPT).unwrap();

        assert_eq!(si.get_num_msgs(), 3);
        assert_eq!(si.get_duration(), 4.0);

        assert_eq!(si.get_pending(0.0), PendingMessages::None);

        match si.get_pending(1.0) {
            PendingMessages::Some(m) => {
                assert_eq!(m.len(), 1);
                assert!(matches!(m[0], Message::GpsEcef { status: EcefStatus::Origin, .. }));
            },
            p => panic!("Expected one message, got {:?}", p)
        }

        match si.get_pending(4.0) {
            PendingMessages::Some(m) => {
                assert_eq!(m, vec![
                    Message::Heartbeat { data: 0 },
                    Message::CmdOther { ack: true, command: ShoreCommand::ReturnStation }
                ]);
            },
            p => panic!("Expected two messages, got {:?}", p)
        }

        assert_eq!(si.get_pending(100.0), PendingMessages::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(ScriptInterpreter::parse(""), Err(ScriptError::ScriptEmpty)));
        assert!(matches!(
            ScriptInterpreter::parse(r#"1.0: {"Launch": {}};"#),
            Err(ScriptError::InvalidMessage(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::parse(
                "2.0: {\"Heartbeat\": {\"data\": 0}};\n1.0: {\"Heartbeat\": {\"data\": 0}};"
            ),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/no/such/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
