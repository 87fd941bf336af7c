// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Example binary for `rhp_transforms`.
//!
//! Set `RUST_LOG=rhp_transforms=debug` to see the per-operation summaries.

use geo_types::Geometry;
use rhp_core::{AreaUnit, GridConfig, RHealpixGrid};
use rhp_transforms::{
    AggregateSpec, Column, EncodeAggregateSpec, EncodeSpec, Frame, Program, Rhp, RhpOptions,
    Table, Transform, Value,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let grid = RHealpixGrid::new(GridConfig::default());
    let rhp = Rhp::new(&grid).with_options(RhpOptions::default().with_max_output_rows(10_000));

    let stations = Table::from_columns(vec![
        Column::new("lat", vec![50.0.into(), 51.0.into(), (-33.9).into()]),
        Column::new("lng", vec![14.0.into(), 15.0.into(), 151.2.into()]),
        Column::new("count", vec![3_i64.into(), 4_i64.into(), 10_i64.into()]),
        Column::new("name", vec!["prague".into(), "liberec".into(), "sydney".into()]),
    ])
    .unwrap();

    // Encode at resolution 9 and look around each cell.
    let encoded = rhp
        .encode_lat_lng(stations.clone(), &EncodeSpec::new(9))
        .unwrap();
    println!("encoded:");
    print_table(&encoded);

    let navigated = Program::new()
        .with(Transform::Parent {
            resolution: Some(1),
        })
        .with(Transform::CenterChild { resolution: None })
        .with(Transform::CellArea {
            unit: AreaUnit::SquareKilometres,
        })
        .with(Transform::IsValid)
        .execute(&rhp, encoded.clone().into())
        .unwrap();
    println!("navigated:");
    print_table(navigated.table());

    let ring = rhp.cell_ring(&encoded, 1, true).unwrap();
    println!("hollow 1-ring, exploded: {} rows", ring.row_count());

    // Roll the points up to resolution 1, with boundary polygons.
    let rolled = rhp
        .aggregate_by_ancestor(&encoded, &AggregateSpec::new(1))
        .unwrap();
    println!("aggregated at resolution 1:");
    print_frame(&rolled);

    // The same in one step, encoding at the finest resolution first.
    let direct = rhp
        .geo_to_rhp_aggregate(stations.into(), &EncodeAggregateSpec::new(1))
        .unwrap();
    println!("encode + aggregate:");
    print_frame(&direct);
}

fn print_frame(frame: &Frame) {
    print_table(frame.table());
    if let Some(geo) = frame.as_geo() {
        println!("  ({} geometries, {})", geo.geometries().len(), geo.crs());
    }
}

fn print_table(table: &Table) {
    let names: Vec<&str> = table.column_names().collect();
    println!(
        "  index={} columns={}",
        table.index_name().unwrap_or("-"),
        names.join(",")
    );
    for row in 0..table.row_count() {
        let cells: Vec<String> = names
            .iter()
            .map(|n| table.value(row, n).map(render).unwrap_or_default())
            .collect();
        println!("  [{}] {}", table.row_keys[row], cells.join(" | "));
    }
}

fn render(v: &Value) -> String {
    match v {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{f:.3}"),
        Value::Str(s) => s.clone(),
        Value::Geometry(Geometry::Point(p)) => format!("POINT({:.5} {:.5})", p.x(), p.y()),
        Value::Geometry(Geometry::Polygon(p)) => {
            format!("POLYGON({} vertices)", p.exterior().0.len())
        }
        Value::Geometry(_) => "geometry".to_owned(),
        Value::List(items) => format!("[{} cells]", items.len()),
    }
}
