use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, Point};
use polars::{
    frame::DataFrame,
    io::SerWriter,
    prelude::{Column, CsvWriter, DataType, NamedFrom},
    series::Series,
};
use serde_json::{json, Map};
use wkt::{ToWkt, TryFromWkt};

use crate::common::{Attrs, Value};
use crate::network::{GraphKind, Network, NodeId};

/// Attribute names used when flattening a network into tables.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub x_key: String,
    pub y_key: String,
    pub geometry_key: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { x_key: "x".to_string(), y_key: "y".to_string(), geometry_key: "geometry".to_string() }
    }
}

/// Row-oriented attributes of nodes or edges, with one optional geometry per row.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Coordinate frame the geometries are expressed in.
    pub frame: String,
    pub data: DataFrame,
    pub geometry: Vec<Option<Geometry<f64>>>,
}

impl FeatureTable {
    #[inline] pub fn len(&self) -> usize { self.geometry.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geometry.is_empty() }

    /// Attribute frame with the geometries appended as a WKT `geometry` column.
    /// Rows without a geometry keep the text of an existing `geometry` column.
    pub fn to_frame_with_wkt(&self) -> Result<DataFrame> {
        let existing = match self.data.column("geometry") {
            Ok(column) => Some(column.cast(&DataType::String)
                .context("[network::export] Failed to read existing geometry column")?),
            Err(_) => None,
        };
        let existing = existing.as_ref().map(Column::str).transpose()?;

        let wkt = self.geometry.iter().enumerate()
            .map(|(row, geometry)| match geometry {
                Some(geometry) => Some(geometry.wkt_string()),
                None => existing.and_then(|column| column.get(row)).map(str::to_string),
            })
            .collect::<Vec<_>>();

        let mut df = self.data.clone();
        df.with_column(Series::new("geometry".into(), wkt))
            .context("[network::export] Failed to append geometry column")?;
        Ok(df)
    }

    /// CSV text of [`FeatureTable::to_frame_with_wkt`].
    pub fn to_csv_string(&self) -> Result<String> {
        let mut df = self.to_frame_with_wkt()?;
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .finish(&mut df)
            .context("[network::export] Failed to write CSV to string")?;
        String::from_utf8(buffer)
            .context("[network::export] CSV output is not valid UTF-8")
    }
}

/// Narrowest column type able to hold every value seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind { Bool, Int, Float, Text }

impl ColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ColumnKind::Bool,
            Value::Int(_) => ColumnKind::Int,
            Value::Float(_) => ColumnKind::Float,
            Value::Text(_) | Value::Geometry(_) => ColumnKind::Text,
        }
    }

    fn widen(self, other: Self) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Text,
        }
    }
}

/// Build a typed column from per-row optional values.
fn attribute_column(name: &str, values: &[Option<&Value>]) -> Column {
    let kind = values.iter().flatten()
        .map(|value| ColumnKind::of(value))
        .reduce(ColumnKind::widen)
        .unwrap_or(ColumnKind::Text);

    let series = match kind {
        ColumnKind::Bool => Series::new(name.into(), values.iter()
            .map(|value| match value { Some(Value::Bool(flag)) => Some(*flag), _ => None })
            .collect::<Vec<_>>()),
        ColumnKind::Int => Series::new(name.into(), values.iter()
            .map(|value| match value { Some(Value::Int(number)) => Some(*number), _ => None })
            .collect::<Vec<_>>()),
        ColumnKind::Float => Series::new(name.into(), values.iter()
            .map(|value| value.and_then(Value::as_f64))
            .collect::<Vec<_>>()),
        ColumnKind::Text => Series::new(name.into(), values.iter()
            .map(|value| value.map(Value::to_string))
            .collect::<Vec<_>>()),
    };
    series.into()
}

/// Attribute columns in first-seen key order, skipping `excluded` keys.
fn attribute_columns<'a>(rows: &[&'a Attrs], excluded: &[&str]) -> Vec<Column> {
    let mut keys = Vec::<&'a str>::new();
    for &attrs in rows {
        for key in attrs.keys() {
            if !excluded.contains(&key.as_str()) && !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    keys.into_iter()
        .map(|key| attribute_column(key, &rows.iter().map(|attrs| attrs.get(key)).collect::<Vec<_>>()))
        .collect()
}

/// Geometry stored under the geometry attribute, as a structure or as WKT text.
fn stored_geometry(value: &Value) -> Option<Geometry<f64>> {
    match value {
        Value::Geometry(geometry) => Some(geometry.clone()),
        Value::Text(text) => Geometry::try_from_wkt_str(text).ok(),
        _ => None,
    }
}

/// Values under `name` that do not read as geometry, as a column. `None` if every row parsed.
fn unparsed_column(name: &str, rows: &[&Attrs]) -> Option<Column> {
    let values = rows.iter()
        .map(|attrs| attrs.get(name).filter(|value| stored_geometry(value).is_none()))
        .collect::<Vec<_>>();

    let unparsed = values.iter().flatten().count();
    if unparsed == 0 { return None }

    log::warn!("[network::export] {unparsed} '{name}' value(s) are not valid geometry, kept as a column");
    Some(attribute_column(name, &values))
}

/// Read a frame column back into attribute values. Integer and float columns
/// are widened to 64 bits; anything else non-boolean is read as text.
fn column_values(column: &Column) -> Result<Vec<Option<Value>>> {
    let name = column.name().to_string();
    let context = || format!("[network::export] Failed to read column '{name}'");

    let dtype = column.dtype();
    let values: Vec<Option<Value>> = if dtype == &DataType::Boolean {
        column.bool().with_context(context)?.into_iter().map(|v| v.map(Value::Bool)).collect()
    } else if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64).with_context(context)?;
        cast.i64().with_context(context)?.into_iter().map(|v| v.map(Value::Int)).collect()
    } else if dtype.is_float() {
        let cast = column.cast(&DataType::Float64).with_context(context)?;
        cast.f64().with_context(context)?.into_iter().map(|v| v.map(Value::Float)).collect()
    } else {
        let cast = column.cast(&DataType::String).with_context(context)?;
        cast.str().with_context(context)?.into_iter().map(|v| v.map(Value::from)).collect()
    };

    Ok(values)
}

/// Required integer id column, as `NodeId`s.
fn id_column(df: &DataFrame, name: &str) -> Result<Vec<NodeId>> {
    let column = df.column(name)
        .with_context(|| format!("[network::export] Missing column '{name}'"))?
        .cast(&DataType::Int64)
        .with_context(|| format!("[network::export] Column '{name}' is not an integer column"))?;

    column.i64()?.into_iter()
        .enumerate()
        .map(|(row, id)| id.map(NodeId).ok_or_else(|| anyhow!("[network::export] Null '{name}' in row {row}")))
        .collect()
}

/// Attribute maps for every row of `df`, skipping `excluded` columns.
/// Text under `geometry_key` is parsed as WKT.
fn frame_attrs(df: &DataFrame, excluded: &[&str], geometry_key: &str) -> Result<Vec<Attrs>> {
    let mut rows = vec![Attrs::new(); df.height()];
    let mut unparsed = 0;

    for column in df.get_columns() {
        let name = column.name().as_str();
        if excluded.contains(&name) { continue }

        for (attrs, value) in rows.iter_mut().zip(column_values(column)?) {
            let Some(value) = value else { continue };
            let value = match value {
                Value::Text(text) if name == geometry_key => match Geometry::<f64>::try_from_wkt_str(&text) {
                    Ok(geometry) => Value::Geometry(geometry),
                    Err(_) => { unparsed += 1; Value::Text(text) }
                },
                other => other,
            };
            attrs.insert(name.to_string(), value);
        }
    }

    if unparsed > 0 {
        log::warn!("[network::export] {unparsed} '{geometry_key}' value(s) are not valid WKT, kept as text");
    }
    Ok(rows)
}

impl Network {
    /// Flatten the network into a node table and an edge table, both tagged with `frame`.
    ///
    /// Node rows carry an `id` column and a point geometry built from the
    /// `x`/`y` attributes, falling back to the geometry attribute. Edge rows
    /// carry `source`, `target` and `key` columns and the geometry stored
    /// under the geometry attribute. Geometry attributes may be structures or
    /// WKT text; values that parse as neither stay behind as a column.
    pub fn to_tables(&self, frame: &str, options: &ExportOptions) -> Result<(FeatureTable, FeatureTable)> {
        let geometry_key = options.geometry_key.as_str();

        // 1) Nodes.
        let node_attrs = self.nodes().iter().map(|node| &node.attrs).collect::<Vec<_>>();
        let mut columns: Vec<Column> = vec![
            Series::new("id".into(), self.nodes().iter().map(|node| node.id.0).collect::<Vec<_>>()).into(),
        ];
        columns.extend(attribute_columns(&node_attrs, &[geometry_key, "id"]));
        columns.extend(unparsed_column(geometry_key, &node_attrs));

        let nodes = FeatureTable {
            frame: frame.to_string(),
            data: DataFrame::new(columns).context("[network::export] Failed to build node table")?,
            geometry: self.nodes().iter()
                .map(|node| match node.coord(&options.x_key, &options.y_key) {
                    Some(coord) => Some(Point::from(coord).into()),
                    None => node.get(geometry_key).and_then(stored_geometry),
                })
                .collect(),
        };

        // 2) Edges.
        let edge_attrs = self.edges().iter().map(|edge| &edge.attrs).collect::<Vec<_>>();
        let mut columns: Vec<Column> = vec![
            Series::new("source".into(), self.edges().iter().map(|edge| edge.u.0).collect::<Vec<_>>()).into(),
            Series::new("target".into(), self.edges().iter().map(|edge| edge.v.0).collect::<Vec<_>>()).into(),
            Series::new("key".into(), self.edges().iter().map(|edge| edge.key).collect::<Vec<_>>()).into(),
        ];
        columns.extend(attribute_columns(&edge_attrs, &[geometry_key, "source", "target", "key"]));
        columns.extend(unparsed_column(geometry_key, &edge_attrs));

        let edges = FeatureTable {
            frame: frame.to_string(),
            data: DataFrame::new(columns).context("[network::export] Failed to build edge table")?,
            geometry: self.edges().iter()
                .map(|edge| edge.get(geometry_key).and_then(stored_geometry))
                .collect(),
        };

        log::debug!("[network::export] {} node row(s), {} edge row(s) in {frame}", nodes.len(), edges.len());

        Ok((nodes, edges))
    }

    /// Copy with every geometry-valued attribute replaced by its WKT text.
    pub fn geometry_to_text(&self) -> Network {
        let mut network = self.clone();
        let to_text = |attrs: &mut Attrs| {
            for value in attrs.values_mut() {
                if let Value::Geometry(geometry) = value { *value = Value::Text(geometry.wkt_string()) }
            }
        };
        network.nodes_mut().iter_mut().for_each(|node| to_text(&mut node.attrs));
        network.edges_mut().iter_mut().for_each(|edge| to_text(&mut edge.attrs));
        network
    }

    /// Node-link JSON (`directed`, `multigraph`, `graph`, `nodes`, `links`),
    /// with geometries as WKT text.
    pub fn to_node_link_json(&self) -> Result<serde_json::Value> {
        let record = |fields: Vec<(&str, serde_json::Value)>, attrs: &Attrs| -> Result<serde_json::Value> {
            let mut map = Map::new();
            for (key, value) in attrs {
                map.insert(key.clone(), serde_json::to_value(value)
                    .with_context(|| format!("[network::export] Failed to serialize attribute '{key}'"))?);
            }
            for (key, value) in fields {
                map.insert(key.to_string(), value);
            }
            Ok(serde_json::Value::Object(map))
        };

        let nodes = self.nodes().iter()
            .map(|node| record(vec![("id", json!(node.id.0))], &node.attrs))
            .collect::<Result<Vec<_>>>()?;
        let links = self.edges().iter()
            .map(|edge| record(vec![("source", json!(edge.u.0)), ("target", json!(edge.v.0)), ("key", json!(edge.key))], &edge.attrs))
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({
            "directed": self.is_directed(),
            "multigraph": self.kind().is_multigraph(),
            "graph": { "crs": self.crs() },
            "nodes": nodes,
            "links": links,
        }))
    }

    /// Rebuild a network from a node table and an edge table.
    ///
    /// `nodes` needs an integer `id` column, `edges` integer `source` and
    /// `target` columns and optionally `key`. Every other column becomes an
    /// attribute; nulls are skipped. WKT text under the edge geometry column
    /// is parsed back into geometry. A node `geometry` column is ignored, as
    /// node geometry follows from the coordinates.
    pub fn from_tables(kind: GraphKind, nodes: &DataFrame, edges: &DataFrame, options: &ExportOptions) -> Result<Network> {
        let geometry_key = options.geometry_key.as_str();
        let mut network = Network::new(kind);

        let ids = id_column(nodes, "id")?;
        let attrs = frame_attrs(nodes, &["id", geometry_key, "geometry"], geometry_key)?;
        for (id, attrs) in ids.into_iter().zip(attrs) {
            network.add_node(id, attrs);
        }

        let sources = id_column(edges, "source")?;
        let targets = id_column(edges, "target")?;
        let keys = match edges.column("key") {
            Ok(column) => {
                let column = column.cast(&DataType::Int64).context("[network::export] Column 'key' is not an integer column")?;
                column.i64()?.into_iter()
                    .map(|key| key.map(u32::try_from).transpose())
                    .collect::<Result<Vec<_>, _>>()
                    .context("[network::export] Edge key out of range")?
            }
            Err(_) => vec![None; edges.height()],
        };

        let attrs = frame_attrs(edges, &["source", "target", "key"], geometry_key)?;
        if sources.len() != attrs.len() || targets.len() != attrs.len() {
            bail!("[network::export] Edge columns have mismatched lengths");
        }

        for (((u, v), key), attrs) in sources.into_iter().zip(targets).zip(keys).zip(attrs) {
            match key {
                Some(key) => network.add_edge_with_key(u, v, key, attrs),
                None => network.add_edge(u, v, attrs),
            };
        }

        log::info!("[network::export] read {} node(s) and {} edge(s)", network.node_count(), network.edge_count());

        Ok(network)
    }
}
