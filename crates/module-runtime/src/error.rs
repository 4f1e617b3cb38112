// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Errors produced by the module runtime substrate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No usable device exists yet; the supervisor retries after a backoff
    /// rather than treating this as fatal.
    #[error("initialization error: {0}")]
    Initialization(String),

    #[error("precondition failed: recording state is not {expected}")]
    PreconditionFailed { expected: bool },

    #[error("{command} is not supported by this module")]
    NotSupported { command: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] daq_protocol::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
