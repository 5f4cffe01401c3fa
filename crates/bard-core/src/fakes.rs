//! In-process fake for [`ProcessRunner`] (testing only)
//!
//! `ScriptedRunner` answers each launch with the next scripted response and
//! records every [`CommandSpec`] it was asked to run.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::executor::{CommandSpec, ExecutionResult, ProcessRunner};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process cannot be started
    SpawnError(String),
}

impl Scripted {
    pub fn exit(code: i32) -> Self {
        Scripted::Exit {
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn output(code: i32, stdout: &str, stderr: &str) -> Self {
        Scripted::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

/// Runner that replays scripted exits; unscripted launches exit 0
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        ScriptedRunner {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every spec run so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<ExecutionResult> {
        self.calls.lock().unwrap().push(spec.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::exit(0));

        match next {
            Scripted::Exit {
                code,
                stdout,
                stderr,
            } => Ok(ExecutionResult::new(Some(code), stdout, stderr, 0)),
            Scripted::SpawnError(msg) => Err(std::io::Error::new(std::io::ErrorKind::NotFound, msg)),
        }
    }
}
