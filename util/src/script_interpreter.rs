//! # Navigation script interpreter module
//!
//! This module provides an interpreter for timed navigation message scripts,
//! allowing the inbound message streams (goals, pose fixes, detections,
//! encoder samples and tuning updates) to be replayed into the exec.

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
use nav_if::msg::{Msg, MsgParseError};
use crate::session::get_elapsed_seconds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to arrive at a specific time.
pub struct TimedMsg {
    /// The time the message is supposed to arrive at
    arrival_time_s: f64,

    /// The message itself
    msg: Msg
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_msgs` to acquire a list of messages that have arrived.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    msgs: VecDeque<TimedMsg>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, MsgParseError)
}

pub enum PendingMsgs {
    None,
    Some(Vec<Msg>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.to_str().unwrap().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        // Empty queue of messages
        let mut msg_queue: VecDeque<TimedMsg> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        let mut num_caps = 0;

        for cap in re.captures_iter(&script) {
            // Parse the arrival time
            let arrival_time_s: f64 = match cap.get(1).unwrap().as_str().parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Parse the message from the payload. The scripts contain JSON
            // only.
            let msg = match Msg::from_json(
                cap.get(3).unwrap().as_str())
            {
                Ok(m) => m,
                Err(e) => return Err(ScriptError::InvalidMsg(
                    arrival_time_s, e
                ))
            };

            // Build the timed message from the match
            msg_queue.push_back(TimedMsg {
                arrival_time_s,
                msg
            });

            num_caps += 1;
        }

        if num_caps == 0 {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            _script_path: path,
            msgs: msg_queue
        })
    }

    /// Return a vector of pending messages, or `None` if no messages have
    /// arrived yet.
    pub fn get_pending_msgs(&mut self) -> PendingMsgs {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.msgs.len() == 0 {
            return PendingMsgs::EndOfScript
        }

        let mut msg_vec: Vec<Msg> = vec![];

        let current_time_s = get_elapsed_seconds();

        // Peek items from the queue, if the head's arrival time is lower than
        // the current time add it to the vector, and keep adding messages
        // until the arrival times are larger than the current time.
        while
            self.msgs.len() > 0
            &&
            self.msgs.front().unwrap().arrival_time_s < current_time_s
        {
            msg_vec.push(self.msgs.pop_front().unwrap().msg);
        }

        // If the vector is longer than 0 return Some, otherwise None
        if msg_vec.len() > 0 {
            PendingMsgs::Some(msg_vec)
        }
        else {
            PendingMsgs::None
        }
    }

    /// Get the number of messages in the script
    pub fn get_num_msgs(&self) -> usize {
        self.msgs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.msgs.back() {
            Some(m) => m.arrival_time_s,
            None => 0f64
        }
    }
}
