//! Canned chart series the companion app renders before a device has
//! reported real telemetry.

use axum::Json;
use serde_json::{Value, json};

pub async fn temp_hum() -> Json<Value> {
    Json(json!([
        {"name": "10/1", "temp": 24, "hum": 65},
        {"name": "10/2", "temp": 25, "hum": 66},
        {"name": "10/3", "temp": 26, "hum": 64},
        {"name": "10/4", "temp": 27, "hum": 63},
        {"name": "10/5", "temp": 28, "hum": 62},
        {"name": "10/6", "temp": 29, "hum": 61},
        {"name": "10/7", "temp": 30, "hum": 60},
    ]))
}

pub async fn water_level() -> Json<Value> {
    Json(json!([
        {"name": "water level", "value": 60},
        {"name": "nutrient level", "value": 45},
        {"name": "recycle level", "value": 50},
        {"name": "smartfarm level", "value": 55},
    ]))
}

pub async fn illumination() -> Json<Value> {
    Json(json!([
        {"name": "10/1", "light": 400},
        {"name": "10/2", "light": 420},
        {"name": "10/3", "light": 440},
        {"name": "10/4", "light": 460},
        {"name": "10/5", "light": 480},
        {"name": "10/6", "light": 500},
        {"name": "10/7", "light": 520},
    ]))
}

pub async fn tds() -> Json<Value> {
    Json(json!([
        {"name": "1일", "tds": 700},
        {"name": "2일", "tds": 710},
        {"name": "3일", "tds": 720},
        {"name": "4일", "tds": 730},
        {"name": "5일", "tds": 740},
        {"name": "6일", "tds": 750},
        {"name": "7일", "tds": 760},
    ]))
}

pub async fn liquid_temp() -> Json<Value> {
    Json(json!([
        {"name": "10/1", "temp": 18},
        {"name": "10/2", "temp": 19},
        {"name": "10/3", "temp": 20},
        {"name": "10/4", "temp": 21},
        {"name": "10/5", "temp": 22},
        {"name": "10/6", "temp": 23},
        {"name": "10/7", "temp": 24},
    ]))
}

pub async fn prediction() -> Json<Value> {
    Json(json!([
        {"name": "1일", "water": 40, "nutrient": 30},
        {"name": "2일", "water": 45, "nutrient": 32},
        {"name": "3일", "water": 50, "nutrient": 34},
        {"name": "4일", "water": 55, "nutrient": 36},
        {"name": "5일", "water": 60, "nutrient": 38},
        {"name": "6일", "water": 65, "nutrient": 40},
        {"name": "7일", "water": 70, "nutrient": 42},
    ]))
}
