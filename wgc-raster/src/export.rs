use crate::crossmap::Crossmap;
use crate::error::RasterError;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value as GeoValue};
use serde_json::{json, Map as JsonMap};

/// Convert a rendered raster field back into geographic form.
///
/// Both shapes apply the exact inverse of the transform the grid was built
/// with, so a coordinate projected forward into the grid and back comes out
/// where it started. Values travel as a `value` property; no-data cells are
/// kept (sentinel and all) so downstream consumers can tell coverage gaps
/// from zeros.
fn cell_properties(crossmap: &Crossmap, row: usize, col: usize, value: f64) -> JsonMap<String, serde_json::Value> {
    let mut properties = JsonMap::new();
    properties.insert("value".to_string(), json!(value));
    properties.insert(
        "station_id".to_string(),
        match crossmap.station_for_cell(row, col) {
            Some(id) => json!(id),
            None => serde_json::Value::Null,
        },
    );
    properties.insert("row".to_string(), json!(row));
    properties.insert("col".to_string(), json!(col));
    properties
}

/// One point feature per raster cell, at the cell center in WGS84.
pub fn rendered_points(
    crossmap: &Crossmap,
    rendered: &[f64],
) -> Result<FeatureCollection, RasterError> {
    let grid = crossmap.grid();
    if rendered.len() != grid.len() {
        return Err(RasterError::AttributeLength {
            expected: grid.len(),
            actual: rendered.len(),
        });
    }
    let mut features = Vec::with_capacity(grid.len());
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let center = grid.cell_center_geo(row, col);
            let value = rendered[grid.cell_index(row, col)];
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(vec![center.lon, center.lat]))),
                id: None,
                properties: Some(cell_properties(crossmap, row, col, value)),
                foreign_members: None,
            });
        }
    }
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// One polygon feature per raster cell, with WGS84 cell corners.
pub fn rendered_cells(
    crossmap: &Crossmap,
    rendered: &[f64],
) -> Result<FeatureCollection, RasterError> {
    let grid = crossmap.grid();
    if rendered.len() != grid.len() {
        return Err(RasterError::AttributeLength {
            expected: grid.len(),
            actual: rendered.len(),
        });
    }
    let mut features = Vec::with_capacity(grid.len());
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let mut ring: Vec<Vec<f64>> = grid
                .cell_corners(row, col)
                .iter()
                .map(|corner| {
                    let geo = grid.projection.inverse(corner);
                    vec![geo.lon, geo.lat]
                })
                .collect();
            ring.push(ring[0].clone()); // close the ring
            let value = rendered[grid.cell_index(row, col)];
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Polygon(vec![ring]))),
                id: None,
                properties: Some(cell_properties(crossmap, row, col, value)),
                foreign_members: None,
            });
        }
    }
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Serialize a feature collection to GeoJSON text.
pub fn to_geojson_string(collection: FeatureCollection) -> String {
    GeoJson::from(collection).to_string()
}
