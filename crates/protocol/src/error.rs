// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! Errors produced while encoding or decoding protocol messages.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string 'command' field")]
    MissingCommand,

    #[error("message is not a status object")]
    NotAStatus,

    #[error("I/O error: {0}")]
    Io(String),
}
