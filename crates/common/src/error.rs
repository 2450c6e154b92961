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

use std::fmt;

/// Every fallible operation in the engine returns this. Construction-time
/// errors (`TypeMismatch`, `UnsupportedLowering`) and runtime resource errors
/// (`ResourceMissing`, `Corrupt`) are both modeled here per spec.md §7; the
/// engine does not distinguish them by error-handling strategy, only by
/// when they are raised.
#[derive(Debug, thiserror::Error)]
pub enum KeplerError {
    /// The catalog names a path that does not exist on disk.
    #[error("resource missing: {0}")]
    ResourceMissing(String),

    /// A column or index file's header is inconsistent with its length.
    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// An expression or operator was constructed with incompatible types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// An operator/expression was handed to a backend that cannot lower it.
    #[error("unsupported lowering: {0}")]
    UnsupportedLowering(String),

    /// Propagated I/O failure underlying a `ResourceMissing`/`Corrupt` case.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KeplerError {
    pub fn resource_missing(path: impl fmt::Display) -> Self {
        KeplerError::ResourceMissing(path.to_string())
    }

    pub fn corrupt(msg: impl fmt::Display) -> Self {
        KeplerError::Corrupt(msg.to_string())
    }

    pub fn type_mismatch(msg: impl fmt::Display) -> Self {
        KeplerError::TypeMismatch(msg.to_string())
    }

    pub fn unsupported_lowering(msg: impl fmt::Display) -> Self {
        KeplerError::UnsupportedLowering(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KeplerError>;
