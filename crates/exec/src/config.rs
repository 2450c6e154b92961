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

//! Engine-wide configuration (spec.md §6's `--backend`, `--reg_alloc`,
//! `--skinner`, `--budget_per_episode` flags), mirroring
//! `datafusion::config::ConfigOptions` in spirit: one plain struct with a
//! spec-matching `Default`, built programmatically rather than parsed from a
//! flag string (SPEC_FULL.md §B -- flag *parsing* is `kepler-cli`'s job, not
//! this crate's).

pub use kepler_plan::SkinnerMode;

/// Which native-codegen backend a real lowering would target. Neither
/// variant is implemented here -- `kepler-exec` always interprets -- this
/// only lets a caller express the choice and have it validated end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Asm,
    Llvm,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Llvm
    }
}

/// Register allocation strategy for the `asm` backend (spec.md §6). Only
/// meaningful alongside `Backend::Asm`; carried here so `EngineConfig` can
/// round-trip every flag in §6 even though this crate never lowers to
/// machine code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAlloc {
    StackSpill,
    LinearScan,
}

impl Default for RegAlloc {
    fn default() -> Self {
        RegAlloc::LinearScan
    }
}

/// Engine-wide knobs threaded through `ExecutionContext`. Only
/// `skinner_mode`, `budget_per_episode`, and `skinner_seed` affect this
/// crate's behavior; `backend`/`reg_alloc` are accepted and validated
/// end-to-end (matching `kepler-cli`'s contract) but otherwise inert since
/// the native backend is out of scope (spec.md §1).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub backend: Backend,
    pub reg_alloc: RegAlloc,
    pub skinner_mode: SkinnerMode,
    /// Tuples per `SkinnerJoin` episode (SPEC_FULL.md §E.2).
    pub budget_per_episode: u32,
    /// Seed for the adaptive join's bandit RNG (spec.md §9: "Bandit RNG must
    /// be seedable and deterministic"). Not itself a `--flag`; fixed here so
    /// two runs of the same plan against the same data are reproducible.
    pub skinner_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            backend: Backend::default(),
            reg_alloc: RegAlloc::default(),
            skinner_mode: SkinnerMode::default(),
            budget_per_episode: 10_000,
            skinner_seed: 0x5eed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = EngineConfig::default();
        assert_eq!(config.budget_per_episode, 10_000);
        assert_eq!(config.skinner_mode, SkinnerMode::Permute);
    }
}
