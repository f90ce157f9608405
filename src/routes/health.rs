use rocket::get;
use rocket::serde::json::Json;

#[get("/api/health")]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok"
    }))
}
