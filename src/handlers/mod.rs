pub mod checkin_handlers;
pub mod extract;
pub mod notification_handlers;
pub mod registration_handlers;
pub mod workshop_handlers;

pub use checkin_handlers::*;
pub use notification_handlers::*;
pub use registration_handlers::*;
pub use workshop_handlers::*;

use axum::Json;
use serde_json::{json, Value};

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
