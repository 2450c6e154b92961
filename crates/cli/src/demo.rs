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

//! Builds the tiny in-process catalog backing `kepler --demo`, one table per
//! scenario in spec.md §8's "Concrete scenarios". Grounded on
//! `end_to_end_test/test_util.h`'s pattern of writing throwaway column files
//! per test rather than loading a real TPC-H scale factor (out of scope per
//! spec.md §1).

use kepler_catalog::{Column, Database, Type};
use kepler_common::Result;
use kepler_runtime::builder::{ColumnDataBuilder, Scalar};
use tempfile::TempDir;

fn fixed(dir: &TempDir, name: &str, values: &[Scalar]) -> Result<String> {
    let path = dir.path().join(name);
    ColumnDataBuilder::write_fixed(&path, values)?;
    Ok(path.to_string_lossy().into_owned())
}

fn text(dir: &TempDir, name: &str, values: &[&str]) -> Result<String> {
    let path = dir.path().join(name);
    ColumnDataBuilder::write_text(&path, values)?;
    Ok(path.to_string_lossy().into_owned())
}

fn null_bitmap(dir: &TempDir, name: &str, nulls: &[bool]) -> Result<String> {
    let path = dir.path().join(name);
    ColumnDataBuilder::write_null_bitmap(&path, nulls)?;
    Ok(path.to_string_lossy().into_owned())
}

/// Epoch-millis for a UTC calendar date, matching spec.md §3's "DATE
/// (stored as i64 Unix-ms)".
fn epoch_millis(year: i32, month: u32, day: u32) -> i64 {
    use chrono::{NaiveDate, TimeZone, Utc};
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date");
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()).timestamp_millis()
}

/// Returns a freshly populated [`Database`] plus the [`TempDir`] backing its
/// column files -- the caller must keep the `TempDir` alive for as long as
/// the `Database` is used, since dropping it deletes the files underneath.
pub fn build() -> Result<(Database, TempDir)> {
    let dir = tempfile::tempdir()?;
    let mut db = Database::new();

    // Scenario 1: scalar aggregation over lineitem.
    {
        let t = db.insert("lineitem");
        let qty = fixed(&dir, "l_quantity.kdb", &[Scalar::Real(10.0), Scalar::Real(20.0), Scalar::Real(30.0)])?;
        let price = fixed(&dir, "l_extendedprice.kdb", &[Scalar::Real(100.0), Scalar::Real(200.0), Scalar::Real(300.0)])?;
        let disc = fixed(&dir, "l_discount.kdb", &[Scalar::Real(0.05), Scalar::Real(0.10), Scalar::Real(0.00)])?;
        t.insert(Column::new("l_quantity", Type::real(false), qty));
        t.insert(Column::new("l_extendedprice", Type::real(false), price));
        t.insert(Column::new("l_discount", Type::real(false), disc));
    }

    // Scenario 2: group-by with ordering over orders' return flags.
    {
        let t = db.insert("returns");
        let flag = text(&dir, "returnflag.kdb", &["A", "A", "B"])?;
        let qty = fixed(&dir, "qty.kdb", &[Scalar::Int(5), Scalar::Int(7), Scalar::Int(2)])?;
        t.insert(Column::new("returnflag", Type::text(false), flag));
        t.insert(Column::new("qty", Type::int(false), qty));
    }

    // Scenario 3: hash join between two id relations.
    {
        let t = db.insert("left_ids");
        let id = fixed(&dir, "left_id.kdb", &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])?;
        t.insert(Column::new("id", Type::int(false), id));

        let t = db.insert("right_ids");
        let id = fixed(&dir, "right_id.kdb", &[Scalar::Int(2), Scalar::Int(3), Scalar::Int(4)])?;
        t.insert(Column::new("id", Type::int(false), id));
    }

    // Scenario 4: adaptive 4-way equi-join over four copies of info(id).
    for i in 0..4 {
        let t = db.insert(format!("info{i}"));
        let id = fixed(&dir, &format!("info{i}_id.kdb"), &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])?;
        t.insert(Column::new("id", Type::int(false), id));
    }

    // Scenario 5: date extraction / range predicate over orders.
    {
        let t = db.insert("orders_date");
        let date = fixed(&dir, "o_orderdate.kdb", &[Scalar::Date(epoch_millis(1993, 5, 28))])?;
        let disc = fixed(&dir, "o_discount.kdb", &[Scalar::Real(0.07)])?;
        let price = fixed(&dir, "o_extprice.kdb", &[Scalar::Real(100.0)])?;
        t.insert(Column::new("o_orderdate", Type::date(false), date));
        t.insert(Column::new("o_discount", Type::real(false), disc));
        t.insert(Column::new("o_extprice", Type::real(false), price));
    }

    // Scenario 6: null-skipping aggregates over a nullable zscore column.
    {
        let t = db.insert("scored");
        let nulls = [true, false, true, false];
        let zscore = fixed(
            &dir,
            "zscore.kdb",
            &[Scalar::Real(0.0), Scalar::Real(1.0), Scalar::Real(0.0), Scalar::Real(3.0)],
        )?;
        let null_path = null_bitmap(&dir, "zscore.kdbnulls", &nulls)?;
        t.insert(
            Column::new("zscore", Type::real(true), zscore).with_null_path(null_path),
        );
    }

    Ok((db, dir))
}
