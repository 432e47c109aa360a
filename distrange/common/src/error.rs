// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! distrange error types

use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::result;

/// Result type for operations that could result in a [RangeError]
pub type Result<T, E = RangeError> = result::Result<T, E>;

/// Error type for generic operations that could result in RangeError::DataAccess
pub type GenericError = Box<dyn error::Error + Send + Sync>;

/// distrange error
#[derive(Debug)]
pub enum RangeError {
    /// A caller broke the contract of a partitioning operation, e.g. asked
    /// for zero partitions, passed a fraction outside `[0, 1]` or a cluster
    /// list that does not cover the tree.
    InvalidArgument(String),
    /// The row count / cluster boundaries of a tree could not be retrieved.
    /// Raised by tree metadata providers and never retried here.
    DataAccess(GenericError),
    /// Error returned while checking the results of a distributed run.
    /// Examples include a dataset whose processed rows do not add up.
    Execution(String),
    /// Error returned as a consequence of an error in distrange.
    /// This error should not happen in normal usage.
    // The partitioning math has invariants that we are unable to ask the compiler to check for us.
    Internal(String),
    /// Error associated to I/O operations and associated traits.
    IoError(io::Error),
    /// Error while encoding or decoding JSON.
    Json(serde_json::Error),
    /// Wraps an error with a message describing what was being done.
    Context(String, Box<RangeError>),
}

impl RangeError {
    /// Wraps this error with additional context
    pub fn context(self, description: impl Into<String>) -> Self {
        RangeError::Context(description.into(), Box::new(self))
    }

    /// Strips [`RangeError::Context`] layers and returns the innermost error
    pub fn find_root(&self) -> &Self {
        let mut last = self;
        while let RangeError::Context(_, inner) = last {
            last = inner.as_ref();
        }
        last
    }
}

impl From<io::Error> for RangeError {
    fn from(e: io::Error) -> Self {
        RangeError::IoError(e)
    }
}

impl From<serde_json::Error> for RangeError {
    fn from(e: serde_json::Error) -> Self {
        RangeError::Json(e)
    }
}

impl From<GenericError> for RangeError {
    fn from(err: GenericError) -> Self {
        RangeError::DataAccess(err)
    }
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match *self {
            RangeError::InvalidArgument(ref desc) => {
                write!(f, "Invalid argument: {desc}")
            }
            RangeError::DataAccess(ref desc) => write!(f, "Data access error: {desc}"),
            RangeError::Execution(ref desc) => write!(f, "Execution error: {desc}"),
            RangeError::Internal(ref desc) => {
                write!(f, "Internal error: {desc}. This was likely caused by a bug in distrange's \
                    code and we would welcome that you file a bug report in our issue tracker")
            }
            RangeError::IoError(ref desc) => write!(f, "IO error: {desc}"),
            RangeError::Json(ref desc) => write!(f, "JSON error: {desc}"),
            RangeError::Context(ref desc, ref err) => {
                write!(f, "{desc}\ncaused by\n{err}")
            }
        }
    }
}

impl error::Error for RangeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RangeError::DataAccess(e) => Some(e.as_ref()),
            RangeError::IoError(e) => Some(e),
            RangeError::Json(e) => Some(e),
            RangeError::Context(_, e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Returns `Err(RangeError::Internal(..))` built from a format string
#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        Err($crate::RangeError::Internal(format!($($arg)*)))
    };
}

/// Returns `Err(RangeError::InvalidArgument(..))` built from a format string
#[macro_export]
macro_rules! invalid_argument_err {
    ($($arg:tt)*) => {
        Err($crate::RangeError::InvalidArgument(format!($($arg)*)))
    };
}

/// Returns `Err(RangeError::Execution(..))` built from a format string
#[macro_export]
macro_rules! exec_err {
    ($($arg:tt)*) => {
        Err($crate::RangeError::Execution(format!($($arg)*)))
    };
}
