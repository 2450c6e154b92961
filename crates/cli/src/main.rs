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

//! `kepler`: a thin driver around `kepler-exec`'s reference executor, in the
//! spirit of `datafusion-cli` -- but since plans here are constructed
//! programmatically rather than parsed from SQL (spec.md §1 Non-goals), this
//! binary selects among a small registry of named operator-tree programs
//! ([`queries`]) instead of reading a query string. Every flag in spec.md
//! §6's "Process interface" is accepted and validated; only `--skinner` and
//! `--budget_per_episode` change this crate's (interpreted) behavior, since
//! the native `asm`/`llvm` backends are out of scope.

mod demo;
mod manifest;
mod queries;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use kepler_catalog::Database;
use kepler_exec::config::{Backend, RegAlloc};
use kepler_exec::{execute_to_string, EngineConfig, ExecutionContext};
use kepler_plan::SkinnerMode;
use kepler_runtime::{EnumManager, FileManager};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Asm,
    Llvm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegAllocArg {
    StackSpill,
    LinearScan,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SkinnerArg {
    Recompile,
    Permute,
}

/// spec.md §6: "Flags observed by the core: `--backend`, `--reg_alloc`,
/// `--skinner`, `--budget_per_episode`."
#[derive(Debug, Parser)]
#[command(name = "kepler", about = "Kepler adaptive columnar query engine driver")]
struct Args {
    /// Named operator-tree program to run; see `queries::NAMES`.
    #[arg(long, default_value = "scalar_agg")]
    query: String,

    /// Path to a JSON catalog manifest (see `manifest::load`). When absent,
    /// a small in-memory demo catalog covering spec.md §8's scenarios is
    /// generated instead.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "llvm")]
    backend: BackendArg,

    /// Only meaningful with `--backend asm`; accepted and validated
    /// regardless since the native backend itself is out of scope here.
    #[arg(long, value_enum, default_value = "linear-scan")]
    reg_alloc: RegAllocArg,

    #[arg(long, value_enum, default_value = "permute")]
    skinner: SkinnerArg,

    /// Tuples per `SkinnerJoin` episode (spec.md §4.6 default: 10_000).
    #[arg(long, default_value_t = 10_000)]
    budget_per_episode: u32,
}

fn run(args: Args) -> kepler_common::Result<String> {
    if matches!(args.backend, BackendArg::Llvm) && matches!(args.reg_alloc, RegAllocArg::StackSpill) {
        log::debug!("--reg_alloc is ignored outside --backend asm");
    }

    let config = EngineConfig {
        backend: match args.backend {
            BackendArg::Asm => Backend::Asm,
            BackendArg::Llvm => Backend::Llvm,
        },
        reg_alloc: match args.reg_alloc {
            RegAllocArg::StackSpill => RegAlloc::StackSpill,
            RegAllocArg::LinearScan => RegAlloc::LinearScan,
        },
        skinner_mode: match args.skinner {
            SkinnerArg::Recompile => SkinnerMode::Recompile,
            SkinnerArg::Permute => SkinnerMode::Permute,
        },
        budget_per_episode: args.budget_per_episode,
        ..EngineConfig::default()
    };

    let (db, _demo_dir): (Database, Option<tempfile::TempDir>) = match &args.catalog {
        Some(path) => (manifest::load(path)?, None),
        None => {
            let (db, dir) = demo::build()?;
            (db, Some(dir))
        }
    };

    let plan = queries::build(&args.query, &db, config.budget_per_episode, config.skinner_mode)?;

    let files = FileManager::new();
    let enums = EnumManager::new();
    let ctx = ExecutionContext::new(&db, &files, &enums, config);
    execute_to_string(&plan, &ctx)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("kepler: {e}");
            ExitCode::FAILURE
        }
    }
}
