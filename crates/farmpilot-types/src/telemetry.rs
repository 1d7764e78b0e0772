use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw readings pushed by the farm controller. Keys are sensor/actuator
/// names chosen by the firmware (temperature, humidity, water level, TDS,
/// ...); values are opaque JSON and stored verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPush {
    pub sensors: HashMap<String, Value>,
    pub controls: HashMap<String, Value>,
}

/// The last accepted push, stamped server-side. Process-lifetime only;
/// a restart forgets it.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: String,
    pub sensors: HashMap<String, Value>,
    pub controls: HashMap<String, Value>,
}
