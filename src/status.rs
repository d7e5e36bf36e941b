// src/status.rs

//! Deployment progress as an explicit state value
//!
//! The caller owns a `DeployStatus` and passes it by `&mut` to whatever
//! drives a deployment. Transitions:
//!
//! ```text
//! Idle | Success | Error  -> Deploying
//! Deploying              -> Success | Error
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Invalid deploy status transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeployStatus {
    #[default]
    Idle,
    Deploying {
        started_at: DateTime<Utc>,
    },
    Success {
        identifier: String,
        finished_at: DateTime<Utc>,
    },
    Error {
        message: String,
        finished_at: DateTime<Utc>,
    },
}

impl DeployStatus {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Deploying { .. } => "deploying",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_deploying(&self) -> bool {
        matches!(self, Self::Deploying { .. })
    }

    /// Enter `Deploying`; refused while a deployment is already running
    pub fn begin(&mut self) -> Result<(), StatusError> {
        if self.is_deploying() {
            return Err(self.refuse("deploying"));
        }
        *self = Self::Deploying {
            started_at: Utc::now(),
        };
        Ok(())
    }

    pub fn succeed(&mut self, identifier: impl Into<String>) -> Result<(), StatusError> {
        if !self.is_deploying() {
            return Err(self.refuse("success"));
        }
        *self = Self::Success {
            identifier: identifier.into(),
            finished_at: Utc::now(),
        };
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StatusError> {
        if !self.is_deploying() {
            return Err(self.refuse("error"));
        }
        *self = Self::Error {
            message: message.into(),
            finished_at: Utc::now(),
        };
        Ok(())
    }

    fn refuse(&self, to: &'static str) -> StatusError {
        StatusError::InvalidTransition {
            from: self.label(),
            to,
        }
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Deploying { started_at } => {
                write!(f, "deploying since {}", started_at.format("%H:%M:%S"))
            }
            Self::Success { identifier, .. } => write!(f, "deployed as {}", identifier),
            Self::Error { message, .. } => write!(f, "failed: {}", message),
        }
    }
}
