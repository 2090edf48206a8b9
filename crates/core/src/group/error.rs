// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for task supervision

use crate::cancel::CancelError;
use std::fmt;
use thiserror::Error;

/// Error returned by a unit of work
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from adding work to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("group closed")]
    Closed,
}

/// Every error collected from a group's units, in the order they were reported
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<TaskError>,
}

impl AggregateError {
    /// `Ok(())` when nothing failed
    pub(crate) fn check(errors: Vec<TaskError>) -> Result<(), AggregateError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AggregateError { errors })
        }
    }

    pub fn errors(&self) -> &[TaskError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<TaskError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [only] => write!(f, "1 error occurred: {}", only),
            errors => {
                write!(f, "{} errors occurred: ", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {}

/// Whether `err` only reports that the unit was told to stop
pub(crate) fn is_cancellation(err: &TaskError) -> bool {
    matches!(err.downcast_ref::<CancelError>(), Some(CancelError::Canceled))
}
