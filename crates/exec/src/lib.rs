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

//! The reference interpreted executor for the Kepler query engine
//! (spec.md §2's "Translator -> Executable Query" row, treated here as an
//! in-process tree-walk rather than the out-of-scope native-codegen
//! backend). Every [`kepler_plan::Operator`] variant gets a `RowSource`
//! implementation in [`interpreter::build_row_source`]; [`Output`][out]
//! formatting follows spec.md §4.9.
//!
//! [out]: kepler_plan::OutputOp

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod context;
pub mod interpreter;
pub mod join_exec;
pub mod order_by;
pub mod output;
pub mod scan;
pub mod select;
pub mod skinner_scan;
pub mod translator;

pub use config::EngineConfig;
pub use context::ExecutionContext;
pub use interpreter::{build_row_source, execute_to_string};
