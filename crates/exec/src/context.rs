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

//! The handles an interpreted run needs: the catalog, the process-scoped
//! `FileManager`/`EnumManager` (spec.md §9: threaded as context, never a
//! singleton), and the resolved `EngineConfig`. One `ExecutionContext` is
//! built per query and borrowed by every operator in the tree.

use kepler_catalog::Database;
use kepler_runtime::{EnumManager, FileManager};

use crate::config::EngineConfig;

pub struct ExecutionContext<'a> {
    pub db: &'a Database,
    pub files: &'a FileManager,
    pub enums: &'a EnumManager,
    pub config: EngineConfig,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        db: &'a Database,
        files: &'a FileManager,
        enums: &'a EnumManager,
        config: EngineConfig,
    ) -> Self {
        ExecutionContext {
            db,
            files,
            enums,
            config,
        }
    }
}
