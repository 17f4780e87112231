use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use dotenv::dotenv;
use ecosystem_directory::{
    db::postgres::create_pool,
    entities::user::NewAdminUser,
    graceful_shutdown::shutdown_signal,
    limiter::rate_limiter::RateLimiterStore,
    middlewares::{auth::AuthMiddleware, rate_limit::RateLimitMiddleware},
    repositories::memory::InMemoryStore,
    routes::configure_routes,
    settings::AppConfig,
    shared_repos::SharedRepositories,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let production = std::env::var("APP_ENV")
        .map(|env| env.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if production {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

async fn bootstrap_admin(config: &AppConfig, state: &AppState) {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return;
    };

    let admin = NewAdminUser {
        username: username.clone(),
        password: password.clone(),
    };
    match state.auth_handler.ensure_admin_user(admin).await {
        Ok(true) => tracing::info!(username = %username, "Bootstrap admin created"),
        Ok(false) => tracing::debug!(username = %username, "Bootstrap admin already present"),
        Err(e) => tracing::error!("Failed to bootstrap admin user: {}", e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let repos = if config.uses_in_memory_store() {
        tracing::warn!("Running against the in-memory store; data is lost on restart");
        SharedRepositories::in_memory(InMemoryStore::new())
    } else {
        let pool = create_pool(&config).await.map_err(|e| {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::io::Error::other(e.to_string())
        })?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Database migration failed: {}", e);
            std::io::Error::other(e.to_string())
        })?;

        SharedRepositories::postgres(pool)
    };

    let app_state = web::Data::new(AppState::new(&config, repos));
    bootstrap_admin(&config, &app_state).await;

    let rate_limiter = RateLimiterStore::new(config.rate_limit_window(), config.rate_limit_max_requests);
    let origins = config.cors_origins();
    let trust_proxy = config.trust_proxy;
    let max_upload_bytes = config.max_upload_bytes;

    tracing::info!(
        "Starting {} v{} on {}:{}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        config.host,
        config.port
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure_routes(max_upload_bytes))
            .wrap(AuthMiddleware)
            .wrap(RateLimitMiddleware::new(rate_limiter.clone(), trust_proxy))
            .wrap(build_cors(&origins))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
    })
    .workers(config.worker_count.max(1))
    .bind((config.host.as_str(), config.port))?
    .run();

    let handle = server.handle();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => {
            handle.stop(true).await;
            Ok(())
        }
    }
}
