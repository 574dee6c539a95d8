use std::{path::Path, sync::Arc};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path as UrlPath, Query, State},
    http::{Method, Request},
    middleware::{Next, from_fn},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ride_tracker_lib::error::RideError;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

use crate::{error::ApiError, server_state::ServerState};

#[derive(Deserialize, Default)]
pub struct StartRideRequest {
    pub vehicle: Option<String>,
    #[serde(alias = "fuel")]
    pub fuel_filled: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct UpdateLocationRequest {
    pub ride_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct EndRideRequest {
    pub ride_id: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct EstimateRequest {
    pub vehicle: Option<String>,
    pub fuel: Option<f64>,
    pub distance: Option<f64>,
}

#[derive(Deserialize)]
pub struct VehicleQuery {
    pub vehicle: Option<String>,
}

pub fn router(server_state: Arc<ServerState>, static_dir: Option<&Path>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/start_ride", post(start_ride))
        .route("/update_location", post(update_location))
        .route("/end_ride", post(end_ride))
        .route("/ride/{ride_id}", get(get_ride))
        .route("/rides", get(get_rides))
        .route("/estimate", post(estimate))
        .route("/get_vehicle_capacity", get(get_vehicle_capacity))
        .route("/vehicles", get(get_vehicles))
        .with_state(server_state);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))),
        None => app,
    };

    app.layer(from_fn(log_request)).layer(cors_layer)
}

async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    tracing::debug!("{} {} -> {}", method, path, response.status());

    response
}

/// Bodies are parsed by hand so that an empty body reads as a request with every field unset.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|err| ApiError::BadRequest(format!("Malformed request body: {err}")))
}

async fn start_ride(State(state): State<Arc<ServerState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: StartRideRequest = parse_body(&body)?;

    let (Some(vehicle), Some(fuel_filled)) = (request.vehicle, request.fuel_filled) else {
        tracing::warn!("Start ride without vehicle or fuel");
        return Err(ApiError::BadRequest("Vehicle and fuel required".into()));
    };

    // An unknown vehicle is a bad start request, not a missing resource
    let started = state.ride_manager.start_ride(&vehicle, fuel_filled).await.map_err(|err| match err {
        RideError::VehicleNotFound(_) => ApiError::BadRequest(err.to_string()),
        err => ApiError::from(err),
    })?;

    Ok(Json(started).into_response())
}

async fn update_location(State(state): State<Arc<ServerState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: UpdateLocationRequest = parse_body(&body)?;

    let Some(ride_id) = request.ride_id else {
        return Err(ApiError::NotFound("Ride id required".into()));
    };
    let (Some(latitude), Some(longitude), Some(speed)) = (request.latitude, request.longitude, request.speed) else {
        // An inactive ride is a 404 whatever else the request lacks
        state.ride_manager.ride_status(ride_id).await?;
        tracing::warn!("Location update for ride {} is missing fields", ride_id);
        return Err(ApiError::BadRequest("Latitude, longitude and speed required".into()));
    };

    let progress = state.ride_manager.update_location(ride_id, latitude, longitude, speed).await?;

    Ok(Json(progress).into_response())
}

async fn end_ride(State(state): State<Arc<ServerState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: EndRideRequest = parse_body(&body)?;

    let Some(ride_id) = request.ride_id else {
        return Err(ApiError::NotFound("No active ride found".into()));
    };

    let summary = state.ride_manager.end_ride(ride_id).await?;

    Ok(Json(summary).into_response())
}

async fn get_ride(State(state): State<Arc<ServerState>>, UrlPath(ride_id): UrlPath<i64>) -> Result<Response, ApiError> {
    let progress = state.ride_manager.ride_status(ride_id).await?;
    Ok(Json(progress).into_response())
}

async fn get_rides(State(state): State<Arc<ServerState>>) -> Response {
    let ride_ids = state.ride_manager.active_rides().await;
    Json(json!({ "ride_ids": ride_ids })).into_response()
}

async fn estimate(State(state): State<Arc<ServerState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: EstimateRequest = parse_body(&body)?;

    let (Some(vehicle), Some(fuel)) = (request.vehicle, request.fuel) else {
        return Err(ApiError::BadRequest("Vehicle and fuel required".into()));
    };

    let estimate = state.ride_manager.estimate(&vehicle, fuel, request.distance)?;

    Ok(Json(estimate).into_response())
}

async fn get_vehicle_capacity(State(state): State<Arc<ServerState>>, Query(query): Query<VehicleQuery>) -> Result<Response, ApiError> {
    let Some(vehicle) = query.vehicle else {
        return Err(ApiError::BadRequest("Vehicle required".into()));
    };

    let vehicle = state.ride_manager.vehicle(&vehicle)?;

    Ok(Json(json!({
        "vehicle": vehicle.name,
        "capacity": vehicle.tank_capacity,
        "mileage": vehicle.mileage,
    }))
    .into_response())
}

async fn get_vehicles(State(state): State<Arc<ServerState>>) -> Response {
    let vehicles: Vec<_> = state.ride_manager.catalog().vehicles().collect();
    Json(vehicles).into_response()
}

#[cfg(test)]
fn test_app() -> Router {
    let server_state = Arc::new(ServerState {
        ride_manager: ride_tracker_data_management::RideManager::default(),
    });
    router(server_state, None)
}

#[cfg(test)]
async fn send(app: &Router, method: Method, uri: &str, body: serde_json::Value) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let body = if body.is_null() { Body::empty() } else { Body::from(body.to_string()) };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, json)
}

#[tokio::test]
async fn test_ride_lifecycle() {
    use axum::http::StatusCode;

    let app = test_app();

    let (status, started) = send(&app, Method::POST, "/start_ride", json!({ "vehicle": "2018 Splendor", "fuel_filled": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["ride_id"], 1);
    assert_eq!(started["vehicle"], "2018 Splendor");
    assert_eq!(started["fuel_filled"], 5.);

    let (status, progress) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 1, "latitude": 28.70, "longitude": 77.10, "speed": 40 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["distance"], 0.);
    assert_eq!(progress["fuel_remaining"], 5.);

    let (status, progress) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 1, "latitude": 28.71, "longitude": 77.11, "speed": 50 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["distance"], 1.48);
    assert_eq!(progress["fuel_remaining"], 4.98);
    assert_eq!(progress["avg_speed"], 45.);

    let (status, ride) = send(&app, Method::GET, "/ride/1", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ride["points"], 2);

    let (status, summary) = send(&app, Method::POST, "/end_ride", json!({ "ride_id": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["distance"], 1.48);
    assert_eq!(summary["fuel_remaining"], 4.98);
    assert_eq!(summary["avg_speed"], 45.);
    assert_eq!(summary["fuel_filled"], 5.);
    assert_eq!(summary["vehicle"], "2018 Splendor");

    let (status, error) = send(&app, Method::POST, "/end_ride", json!({ "ride_id": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 1, "latitude": 28.72, "longitude": 77.12, "speed": 50 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_ride_rejections() {
    use axum::http::StatusCode;

    let app = test_app();

    let (status, _) = send(&app, Method::POST, "/start_ride", json!({ "vehicle": "unknown-bike", "fuel_filled": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, error) = send(&app, Method::POST, "/start_ride", json!({ "vehicle": "activa2020" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Vehicle and fuel required");

    let (status, _) = send(&app, Method::POST, "/start_ride", json!({ "fuel": 100 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/start_ride", json!({ "vehicle": "activa2020", "fuel": "lots" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, rides) = send(&app, Method::GET, "/rides", serde_json::Value::Null).await;
    assert_eq!(rides["ride_ids"], json!([]));

    // The `fuel` alias is accepted and the rejected starts consumed no id
    let (status, started) = send(&app, Method::POST, "/start_ride", json!({ "vehicle": "activa2020", "fuel": 2.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["ride_id"], 1);
}

#[tokio::test]
async fn test_update_and_end_rejections() {
    use axum::http::StatusCode;

    let app = test_app();
    send(&app, Method::POST, "/start_ride", json!({ "vehicle": "activa2020", "fuel": 2 })).await;

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 42, "latitude": 1, "longitude": 1, "speed": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 1, "latitude": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 1, "latitude": 95, "longitude": 1, "speed": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 42, "latitude": 95, "longitude": 1, "speed": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/update_location", json!({ "ride_id": 42, "latitude": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/end_ride", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/end_ride", json!({ "ride_id": 0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/ride/42", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, rides) = send(&app, Method::GET, "/rides", serde_json::Value::Null).await;
    assert_eq!(rides["ride_ids"], json!([1]));
}

#[tokio::test]
async fn test_estimate_and_vehicles() {
    use axum::http::StatusCode;

    let app = test_app();

    let (status, estimate) = send(&app, Method::POST, "/estimate", json!({ "vehicle": "splendor2018", "fuel": 100, "distance": 100 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(estimate["distance_travelled"], 60.);
    assert_eq!(estimate["fuel_left"], 0.);

    let (status, _) = send(&app, Method::POST, "/estimate", json!({ "vehicle": "unknown-bike", "fuel": 100 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/estimate", json!({ "vehicle": "splendor2018" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, capacity) = send(&app, Method::GET, "/get_vehicle_capacity?vehicle=activa2020", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(capacity["capacity"], 5.3);
    assert_eq!(capacity["vehicle"], "2020 Activa");

    let (status, _) = send(&app, Method::GET, "/get_vehicle_capacity?vehicle=unknown-bike", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, vehicles) = send(&app, Method::GET, "/vehicles", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicles.as_array().map(Vec::len), Some(2));
}
