use actix_web::{web, get, HttpResponse, Responder};
use humantime::format_duration;
use once_cell::sync::Lazy;
use chrono::Utc;
use std::{
    time::Duration,
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
};
use sysinfo::System;
use serde::Serialize;
use crate::{constants::START_TIME, entities::response::ApiResponse, AppState};

const STATUS_CACHE_SECS: i64 = 5;

#[derive(Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct SystemInfo {
    os: String,
    kernel: String,
    hostname: String,
    cpu_count: usize,
    memory_total: String,
}

#[derive(Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct HealthStatusResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    redis_status: String,
    blob_store: String,
    version: String,
    memory_usage: String,
    system: SystemInfo,
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthStatusResponse>> = Lazy::new(||
    RwLock::new(HealthStatusResponse::default())
);

fn uptime() -> String {
    let seconds = Utc::now().signed_duration_since(*START_TIME).num_seconds().max(0) as u64;
    format_duration(Duration::from_secs(seconds)).to_string()
}

async fn build_status_response(state: &web::Data<AppState>) -> HealthStatusResponse {
    let now_utc = Utc::now();

    let mut sys = System::new_all();
    sys.refresh_all();

    let system_info = SystemInfo {
        os: System::name().unwrap_or_else(|| "Unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        cpu_count: sys.cpus().len(),
        memory_total: format!("{:.2} GB", sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0),
    };

    let db_status = match state.auth_handler.user_repo.check_connection().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            "Unavailable"
        }
    };

    let blob_status = match state.media_handler.health().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::error!("Blob store health check failed: {}", e);
            "Unavailable"
        }
    };

    let memory_usage = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| sys.process(pid))
        .map_or("Unknown".to_string(), |p| {
            format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
        });

    let status = if db_status == "OK" { "healthy" } else { "degraded" };

    HealthStatusResponse {
        status: status.to_string(),
        uptime: uptime(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage,
        database: db_status.to_string(),
        redis_status: state.auth_handler.denylist.status().await.to_string(),
        blob_store: blob_status.to_string(),
        system: system_info,
    }
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok(
        serde_json::json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
            "uptime": uptime(),
        }),
        "Service is running",
    ))
}

/// Detailed status, recomputed at most every few seconds.
#[get("/health/status")]
pub async fn health_status(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    let response = if now - last > STATUS_CACHE_SECS {
        let response = build_status_response(&state).await;
        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }
        response
    } else {
        match CACHED_STATUS.read() {
            Ok(cached) => cached.clone(),
            Err(e) => {
                tracing::warn!("Health status cache lock poisoned: {}", e);
                build_status_response(&state).await
            }
        }
    };

    HttpResponse::Ok().json(ApiResponse::ok(response, "Service status"))
}
