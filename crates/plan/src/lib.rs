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

//! Operator schema, physical operator tree, and plan-assembly helpers
//! (spec.md §2 "Operator Schema" / "Operator Tree" rows, §3, §4.3-§4.9).

pub mod builder;
mod operator;
mod scan_select;
mod schema;

pub use operator::{
    AggregateOp, CrossProductOp, GroupByAggregateOp, HashJoinOp, Operator, OrderByOp, OutputOp,
    ScanOp, ScanSelectOp, SelectOp, SkinnerJoinOp, SkinnerMode, SkinnerScanSelectOp, SortOrder,
};
pub use scan_select::{
    rewrite_indexed_equalities, rewrite_indexed_equalities_skinner, IndexedEquality,
    ScanSelectPlan,
};
pub use schema::{OperatorSchema, SchemaColumn};
