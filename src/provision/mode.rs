// src/provision/mode.rs
//! VM execution mode and the oracles that report it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// How the VM runs user code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Ahead-of-time: the VM runs precompiled snapshot instructions
    Precompiled,
    /// Just-in-time: the VM loads portable kernel bytecode
    Jit,
}

impl ExecutionMode {
    #[inline]
    pub fn is_precompiled(self) -> bool {
        matches!(self, ExecutionMode::Precompiled)
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Jit
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Precompiled => write!(f, "precompiled"),
            ExecutionMode::Jit => write!(f, "jit"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precompiled" | "aot" => Ok(ExecutionMode::Precompiled),
            "jit" => Ok(ExecutionMode::Jit),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// Source of truth for the VM's execution mode
pub trait ExecutionModeOracle {
    fn execution_mode(&self) -> ExecutionMode;
}

impl ExecutionModeOracle for ExecutionMode {
    #[inline]
    fn execution_mode(&self) -> ExecutionMode {
        *self
    }
}

static PROCESS_MODE: OnceLock<ExecutionMode> = OnceLock::new();

/// The process-wide execution mode of the VM subsystem.
///
/// Set at most once per process with [`ProcessExecutionMode::install`];
/// reads before that observe [`ExecutionMode::Jit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutionMode;

impl ProcessExecutionMode {
    /// Record the process mode. Returns the mode already installed if one was.
    pub fn install(mode: ExecutionMode) -> Result<(), ExecutionMode> {
        PROCESS_MODE.set(mode).map_err(|_| Self::current())
    }

    pub fn current() -> ExecutionMode {
        PROCESS_MODE.get().copied().unwrap_or_default()
    }
}

impl ExecutionModeOracle for ProcessExecutionMode {
    fn execution_mode(&self) -> ExecutionMode {
        Self::current()
    }
}
