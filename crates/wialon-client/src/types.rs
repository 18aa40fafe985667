//! Response types for Wialon Remote API services
//!
//! Only the fields the client relies on are typed. Everything else the server
//! sends is kept in the flattened `extra` maps so no data is lost.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Login
// =============================================================================

/// `token/login` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session identifier
    pub eid: String,
    #[serde(default)]
    pub host: Option<String>,
    pub user: UserInfo,
}

/// Authenticated user description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "nm")]
    pub name: String,
    pub id: i64,
    /// Account (billing) id the user belongs to
    #[serde(rename = "bact")]
    pub account_id: i64,
}

// =============================================================================
// Item search
// =============================================================================

/// `core/search_items` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItemsResponse<T> {
    #[serde(rename = "totalItemsCount", default)]
    pub total_items_count: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Unit (`avl_unit`) as returned by an item search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    #[serde(rename = "nm", default)]
    pub name: String,
    /// Superclass id
    #[serde(rename = "cls", default)]
    pub class_id: Option<i64>,
    /// Measurement system
    #[serde(rename = "mu", default)]
    pub measure_units: Option<i64>,
    /// Current user's access rights to the unit
    #[serde(rename = "uacl", default)]
    pub access: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Geofences
// =============================================================================

/// Resource carrying a geofence library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneResource {
    pub id: i64,
    #[serde(rename = "nm", default)]
    pub name: String,
    /// Geofences keyed by their id
    #[serde(rename = "zl", default)]
    pub zones: BTreeMap<String, AreaRecord>,
}

/// Raw geofence record (lightweight from `zl` or full from `get_zone_data`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub id: i64,
    /// Owning resource id
    #[serde(rename = "rid", default)]
    pub resource_id: i64,
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "d", default)]
    pub description: String,
    /// Type discriminant: 1 line, 2 polygon, 3 circle
    #[serde(rename = "t", default)]
    pub area_type: i64,
    /// Line width in meters
    #[serde(rename = "w", default)]
    pub width: Option<f64>,
    #[serde(rename = "p", default)]
    pub points: Vec<AreaPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Geofence vertex; `r` is set for circle centers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaPoint {
    pub y: f64,
    pub x: f64,
    #[serde(default)]
    pub r: Option<f64>,
}

/// Result of a point search: the matching area and its distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStub {
    pub id: i64,
    pub resource_id: i64,
    /// Full record, when detail was requested
    pub detail: Option<AreaRecord>,
}

// =============================================================================
// Messages
// =============================================================================

/// `messages/load_interval` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadIntervalResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Unit message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// POSIX time of the message
    #[serde(rename = "t", default)]
    pub time: i64,
    #[serde(rename = "f", default)]
    pub flags: i64,
    /// Message type (`ud` data, `us` SMS, `ucr` command, `evt` event, ...)
    #[serde(rename = "tp", default)]
    pub kind: String,
    #[serde(rename = "pos", default)]
    pub position: Option<Position>,
    /// Device parameters
    #[serde(rename = "p", default)]
    pub params: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Calculated sensor values, attached when requested
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Value>,
}

/// Position block of a data message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "y")]
    pub latitude: f64,
    #[serde(rename = "x")]
    pub longitude: f64,
    #[serde(rename = "z", default)]
    pub altitude: f64,
    #[serde(rename = "s", default)]
    pub speed: f64,
    #[serde(rename = "c", default)]
    pub course: f64,
    #[serde(rename = "sc", default)]
    pub satellites: u32,
}

/// Messages loaded for an interval
#[derive(Debug, Clone, Serialize)]
pub struct MessageBatch {
    /// Number of messages the server holds for the interval
    pub count: u64,
    pub messages: Vec<Message>,
}
