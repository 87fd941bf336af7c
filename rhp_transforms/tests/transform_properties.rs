// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the row transform engine and ancestor aggregation.

use proptest::prelude::*;
use rhp_core::{GridError, RHealpixGrid};
use rhp_transforms::{AddressSource, AggregateSpec, Column, EncodeSpec, Rhp, Table, Value};

fn points(coords: &[(f64, f64, i64)]) -> Table {
    Table::from_columns(vec![
        Column::new("lat", coords.iter().map(|c| c.1.into()).collect()),
        Column::new("lng", coords.iter().map(|c| c.0.into()).collect()),
        Column::new("val", coords.iter().map(|c| c.2.into()).collect()),
        Column::new("w", coords.iter().map(|c| (c.2 as f64 * 0.1).into()).collect()),
    ])
    .unwrap()
}

fn coords() -> impl Strategy<Value = Vec<(f64, f64, i64)>> {
    prop::collection::vec(
        (-180.0_f64..180.0, -90.0_f64..=90.0, -1000_i64..1000),
        1..24,
    )
}

proptest! {
    #[test]
    fn explode_emits_one_row_per_element(
        lens in prop::collection::vec(0_usize..5, 0..16),
    ) {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let n = lens.len();
        let table = Table::from_columns(vec![
            Column::new("len", lens.iter().map(|&l| Value::Int(l as i64)).collect()),
            Column::new("tag", (0..n).map(|i| Value::from(format!("row{i}"))).collect()),
        ])
        .unwrap();
        let source = AddressSource::Column("len".into());
        let out = rhp
            .explode(&table, &source, "item", |v| {
                let Value::Int(l) = v else {
                    return Err(GridError::InvalidAddress(String::new()));
                };
                Ok((0..*l).map(Value::Int).collect())
            })
            .unwrap();

        prop_assert_eq!(out.row_count(), lens.iter().sum::<usize>());
        for (i, &key) in out.row_keys.iter().enumerate() {
            let src = usize::try_from(key).unwrap();
            prop_assert_eq!(out.value(i, "tag"), table.value(src, "tag"));
            prop_assert_eq!(out.value(i, "len"), table.value(src, "len"));
        }
        prop_assert!(out.row_keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn aggregation_ignores_row_order(
        coords in coords(),
        res in 0_u8..=4,
        seed in any::<u64>(),
    ) {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let mut shuffled = coords.clone();
        // Deterministic permutation from the seed.
        let mut s = seed;
        for i in (1..shuffled.len()).rev() {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = usize::try_from(s >> 33).unwrap() % (i + 1);
            shuffled.swap(i, j);
        }

        let spec = AggregateSpec::new(res).with_return_geometry(false);
        let run = |c: &[(f64, f64, i64)]| {
            let encoded = rhp.encode_lat_lng(points(c), &EncodeSpec::new(8)).unwrap();
            let encoded = encoded.without_columns(&["lat", "lng"]);
            rhp.aggregate_by_ancestor(&encoded, &spec).unwrap().into_table()
        };
        let a = run(&coords);
        let b = run(&shuffled);
        prop_assert_eq!(a.columns(), b.columns());
        let total: i64 = coords.iter().map(|c| c.2).sum();
        let summed: i64 = a
            .column("val")
            .unwrap()
            .iter()
            .map(|v| match v {
                Value::Int(x) => *x,
                _ => 0,
            })
            .sum();
        prop_assert_eq!(summed, total);
    }

    #[test]
    fn disks_nest_around_encoded_cells(
        lon in -180.0_f64..180.0,
        lat in -90.0_f64..=90.0,
        res in 1_u8..=6,
        k in 1_u32..=3,
    ) {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let t = rhp
            .encode_lat_lng(points(&[(lon, lat, 0)]), &EncodeSpec::new(res))
            .unwrap();
        let as_set = |t: &Table, col: &str| -> std::collections::BTreeSet<String> {
            t.value(0, col)
                .and_then(Value::as_list)
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_owned())
                .collect()
        };
        let disk = as_set(&rhp.k_ring(&t, k, false).unwrap(), "rhp_k_ring");
        let smaller = as_set(&rhp.k_ring(&t, k - 1, false).unwrap(), "rhp_k_ring");
        let ring = as_set(&rhp.cell_ring(&t, k, false).unwrap(), "rhp_cell_ring");
        prop_assert!(disk.is_superset(&smaller));
        prop_assert!(disk.is_superset(&ring));
    }
}
