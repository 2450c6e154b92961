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

//! Column-data runtime (spec.md §4.1, §6): opens column/index/enum files and
//! serializes them for loader programs.

mod aligned;
pub mod builder;
mod column_data;
mod column_index;
mod enum_dict;
mod file_manager;
mod null_bitmap;

pub use aligned::{AlignedBytes, COLUMN_ALIGNMENT};
pub use column_data::{ColumnData, ColumnValue};
pub use column_index::{ColumnIndex, IndexKey};
pub use enum_dict::{EnumDictionary, EnumManager};
pub use file_manager::FileManager;
pub use null_bitmap::NullBitmap;
