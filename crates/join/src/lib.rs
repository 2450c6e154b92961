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

//! Join execution for the Kepler query engine: the equi-join `HashJoin`
//! (spec.md §4.4) and the adaptive n-ary `SkinnerJoin` (spec.md §4.6).
//! Neither executor evaluates an `Operator` tree itself -- both drain
//! whatever [`RowSource`] the interpreter in `kepler-exec` hands them,
//! which is what keeps this crate free of a dependency on `kepler-plan`.

mod bindings;
mod hash_join;
mod key;
mod row;
mod skinner;

pub use bindings::{SingleRowBindings, SkinnerBindings};
pub use hash_join::{HashJoinProbe, HashTable};
pub use key::{JoinKey, JoinKeyPart};
pub use row::{drain_all, Row, RowSource, VecRowSource};
pub use skinner::SkinnerJoinExecutor;
