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

//! The push-based codegen seam a native `asm`/`llvm` backend would sit
//! behind (spec.md §1, §6: the backend lowers operators to calls against a
//! stable primitive ABI). `kepler-exec` never lowers -- it only
//! interprets -- so nothing in this crate implements `Translator`; it is
//! carried here so a future backend crate has a contract to target, the
//! same division the reference implementation draws between its tree-walk
//! `OperatorTranslator` and the `compute()` entry point it produces.

use kepler_common::Result;
use kepler_plan::Operator;

/// One node's half of the pull/push codegen protocol: `produce` asks a
/// node to emit the code that drives its children, `consume` hands a
/// produced tuple up to the parent. Mirrors `Produce`/`Consume` in
/// `compilation/translators/translator.h`, generalized from "emit C++" to
/// "emit into `Sink`".
pub trait Translator<Sink> {
    fn produce(&self, op: &Operator, sink: &mut Sink) -> Result<()>;
    fn consume(&self, op: &Operator, source: &Operator, sink: &mut Sink) -> Result<()>;
}
