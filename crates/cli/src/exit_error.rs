// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Daemon errors carry an HTTP status; map it onto a small, stable set
    /// of process exit codes rather than echoing the status byte-for-byte.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            403 => 77,
            404 | 409 => 1,
            _ => 1,
        };
        Self::new(code, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
