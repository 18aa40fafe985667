//! Geofences ("areas") and point containment
//!
//! Areas arrive as raw [`AreaRecord`]s. [`Area::from_record`] turns a record
//! into one of the three geometric shapes the API knows about, dispatching on
//! the `t` discriminant.

use std::collections::BTreeMap;
use std::fmt;

use geo::{Contains, LineString, Polygon};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::client::Session;
use crate::error::{Result, WialonError};
use crate::flags::{join, AreaFlag, ResourceFlag};
use crate::geodesy::{distance, Point};
use crate::types::{AreaRecord, AreaStub, SearchItemsResponse, ZoneResource};

/// Area type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaType {
    Line = 1,
    Polygon = 2,
    Circle = 3,
}

impl TryFrom<i64> for AreaType {
    type Error = WialonError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Line),
            2 => Ok(Self::Polygon),
            3 => Ok(Self::Circle),
            other => Err(WialonError::UnsupportedAreaType(other)),
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "line"),
            Self::Polygon => write!(f, "polygon"),
            Self::Circle => write!(f, "circle"),
        }
    }
}

/// Geometry of an area
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line { points: Vec<Point>, width: f64 },
    Polygon { points: Vec<Point> },
    Circle { center: Point, radius: f64 },
}

/// Geofence owned by a resource
///
/// Two areas are equal when their type, id and resource id match; names and
/// geometry are not compared.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: i64,
    pub resource_id: i64,
    pub name: String,
    pub description: String,
    pub shape: Shape,
}

impl Area {
    /// Build an area from a raw record
    pub fn from_record(record: &AreaRecord) -> Result<Self> {
        let points = || -> Vec<Point> {
            record
                .points
                .iter()
                .map(|p| Point::new(p.y, p.x))
                .collect()
        };

        let shape = match AreaType::try_from(record.area_type)? {
            AreaType::Line => Shape::Line {
                points: points(),
                width: record.width.unwrap_or_default(),
            },
            AreaType::Polygon => Shape::Polygon { points: points() },
            AreaType::Circle => {
                let center = record.points.first().ok_or_else(|| {
                    WialonError::ParseError(format!("circle area {} has no center", record.id))
                })?;
                Shape::Circle {
                    center: Point::new(center.y, center.x),
                    radius: center.r.or(record.width).unwrap_or_default(),
                }
            }
        };

        Ok(Self {
            id: record.id,
            resource_id: record.resource_id,
            name: record.name.clone(),
            description: record.description.clone(),
            shape,
        })
    }

    pub fn area_type(&self) -> AreaType {
        match self.shape {
            Shape::Line { .. } => AreaType::Line,
            Shape::Polygon { .. } => AreaType::Polygon,
            Shape::Circle { .. } => AreaType::Circle,
        }
    }

    pub fn is_line(&self) -> bool {
        self.area_type() == AreaType::Line
    }

    pub fn is_polygon(&self) -> bool {
        self.area_type() == AreaType::Polygon
    }

    pub fn is_circle(&self) -> bool {
        self.area_type() == AreaType::Circle
    }

    /// Test whether the point lies inside the area
    ///
    /// Circles include their border. Polygons use the even-odd rule over
    /// (latitude, longitude) as planar coordinates and exclude their border.
    /// Lines have no interior and return [`WialonError::UnsupportedContainment`].
    pub fn contains(&self, latitude: f64, longitude: f64) -> Result<bool> {
        match &self.shape {
            Shape::Circle { center, radius } => {
                Ok(distance(latitude, longitude, center.latitude, center.longitude) <= *radius)
            }
            Shape::Polygon { points } => Ok(polygon_contains(points, latitude, longitude)),
            Shape::Line { .. } => Err(WialonError::UnsupportedContainment(AreaType::Line)),
        }
    }
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        self.area_type() == other.area_type()
            && self.id == other.id
            && self.resource_id == other.resource_id
    }
}

impl Eq for Area {}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// Even-odd containment over (longitude, latitude) as planar coordinates
///
/// The ring is closed implicitly and points on the boundary are outside.
fn polygon_contains(points: &[Point], latitude: f64, longitude: f64) -> bool {
    let ring: LineString<f64> = points
        .iter()
        .map(|p| (p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into();
    Polygon::new(ring, Vec::new()).contains(&geo::Point::new(longitude, latitude))
}

// =============================================================================
// Area queries
// =============================================================================

impl Session {
    /// List the geofences of every resource the user can see
    ///
    /// Without `detail` the lightweight records embedded in each resource are
    /// returned, tagged with their resource id. With `detail` the full records
    /// are fetched per resource instead.
    #[instrument(skip(self))]
    pub async fn list_areas(&self, detail: bool) -> Result<Vec<AreaRecord>> {
        let response: SearchItemsResponse<ZoneResource> = self
            .call_as(
                "core/search_items",
                json!({
                    "spec": {
                        "itemsType": "avl_resource",
                        "propName": "zone_library",
                        "propValueMask": "*",
                        "propType": "propitemname",
                        "sortType": "zone_library"
                    },
                    "force": 1,
                    "flags": join([ResourceFlag::Base, ResourceFlag::Geofences]),
                    "from": 0,
                    "to": 0
                }),
            )
            .await?;

        let mut result = Vec::new();
        for resource in response.items {
            let mut stubs: Vec<AreaRecord> = resource
                .zones
                .into_values()
                .map(|mut area| {
                    area.resource_id = resource.id;
                    area
                })
                .collect();
            stubs.sort_by_key(|area| area.id);

            if detail {
                let ids: Vec<i64> = stubs.iter().map(|area| area.id).collect();
                let records = self.get_areas_detail(&ids, Some(resource.id), None).await?;
                result.extend(records.into_values());
            } else {
                result.extend(stubs);
            }
        }

        debug!("Loaded {} areas", result.len());
        Ok(result)
    }

    /// Load every visible geofence with its geometry
    pub async fn load_areas(&self) -> Result<Vec<Area>> {
        self.list_areas(true)
            .await?
            .iter()
            .map(Area::from_record)
            .collect()
    }

    /// Find the areas of a resource that contain a point or lie within `radius`
    ///
    /// `resource` defaults to the user's account. Each match comes with its
    /// distance in meters; with `include_detail` the full record is attached.
    #[instrument(skip(self))]
    pub async fn search_areas_by_point(
        &self,
        latitude: f64,
        longitude: f64,
        resource: Option<i64>,
        radius: u32,
        include_detail: bool,
    ) -> Result<Vec<(AreaStub, f64)>> {
        let resource = match resource {
            Some(id) => id,
            None => self.require_account_id()?,
        };

        let response = self
            .call(
                "resource/get_zones_by_point",
                json!({
                    "spec": {
                        "zoneId": { resource.to_string(): [] },
                        "lat": latitude,
                        "lon": longitude,
                        "radius": radius
                    }
                }),
            )
            .await?;

        let mut matches = parse_point_matches(&response, resource)?;
        if matches.is_empty() || !include_detail {
            return Ok(matches);
        }

        let ids: Vec<i64> = matches.iter().map(|(stub, _)| stub.id).collect();
        let mut detail = self.get_areas_detail(&ids, Some(resource), None).await?;
        for (stub, _) in matches.iter_mut() {
            stub.detail = detail.remove(&stub.id);
        }
        Ok(matches)
    }

    /// Fetch full records for a batch of area ids under one resource
    ///
    /// `resource` defaults to the user's account, `flags` to
    /// [`AreaFlag::Base`]. An empty id list returns an empty map without a
    /// request, since the server reads an empty list as "all areas".
    #[instrument(skip(self, flags))]
    pub async fn get_areas_detail(
        &self,
        ids: &[i64],
        resource: Option<i64>,
        flags: Option<&[AreaFlag]>,
    ) -> Result<BTreeMap<i64, AreaRecord>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let resource = match resource {
            Some(id) => id,
            None => self.require_account_id()?,
        };
        let flags = flags.unwrap_or(&[AreaFlag::Base]);

        let records: Vec<AreaRecord> = self
            .call_as(
                "resource/get_zone_data",
                json!({ "itemId": resource, "col": ids, "flag": join(flags) }),
            )
            .await?;

        Ok(records
            .into_iter()
            .map(|mut area| {
                if area.resource_id == 0 {
                    area.resource_id = resource;
                }
                (area.id, area)
            })
            .collect())
    }

    /// Build [`Area`]s for a batch of ids
    pub async fn get_areas(
        &self,
        ids: &[i64],
        resource: Option<i64>,
        flags: Option<&[AreaFlag]>,
    ) -> Result<BTreeMap<i64, Area>> {
        self.get_areas_detail(ids, resource, flags)
            .await?
            .iter()
            .map(|(id, record)| Area::from_record(record).map(|area| (*id, area)))
            .collect()
    }

    /// Fetch the full record of a single area
    pub async fn get_area_detail(
        &self,
        resource: i64,
        area_id: i64,
        flags: Option<&[AreaFlag]>,
    ) -> Result<AreaRecord> {
        self.get_areas_detail(&[area_id], Some(resource), flags)
            .await?
            .remove(&area_id)
            .ok_or(WialonError::AreaNotFound {
                resource_id: resource,
                area_id,
            })
    }
}

/// Parse `{"<resource>": {"<area>": distance}}`
fn parse_point_matches(response: &Value, resource: i64) -> Result<Vec<(AreaStub, f64)>> {
    let Some(found) = response.get(resource.to_string()).and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut matches = found
        .iter()
        .map(|(id, dist)| -> Result<(AreaStub, f64)> {
            let id = id.parse::<i64>().map_err(|_| {
                WialonError::ParseError(format!("get_zones_by_point: bad area id {:?}", id))
            })?;
            let dist = dist.as_f64().ok_or_else(|| {
                WialonError::ParseError(format!("get_zones_by_point: bad distance for {}", id))
            })?;
            let stub = AreaStub {
                id,
                resource_id: resource,
                detail: None,
            };
            Ok((stub, dist))
        })
        .collect::<Result<Vec<_>>>()?;
    matches.sort_by_key(|(stub, _)| stub.id);
    Ok(matches)
}
