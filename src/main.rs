use actix_web::{dev::Service, web, App, HttpServer};
use std::io;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use post_feed_service::config::Config;
use post_feed_service::handlers::{
    get_announcement_posts, get_label_posts, get_top_posts, get_trending_posts,
};
use post_feed_service::jobs::{start_refresh_scheduler, RefreshConfig};
use post_feed_service::services::{FilterPolicy, RankingService};
use post_feed_service::{db, metrics, RankingCache};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Structured logging with JSON format
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting post-feed-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    // Initialize database pool and run migrations
    let pool = match db::init_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    // Ranking cache is a single owned instance shared by request
    // handlers and the refresh scheduler
    let cache = RankingCache::new();
    let filter = FilterPolicy::from_env();
    let service = RankingService::new(pool, cache, config.ranking.clone(), filter);

    // Refresh scheduler keeps the hot rankings warm
    let refresh_config = RefreshConfig::from_env();
    let scheduler_service = service.clone();
    tokio::spawn(async move {
        start_refresh_scheduler(scheduler_service, refresh_config).await;
    });
    info!("Ranking refresh background job started");

    let service_data = web::Data::new(service);

    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/api/v1/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            metrics::observe_http_request(&method, &path, 500, start.elapsed());
                            Err(err)
                        }
                    }
                }
            })
            .service(
                web::scope("/api/v1/posts")
                    .service(get_label_posts)
                    .service(get_trending_posts)
                    .service(get_top_posts)
                    .service(get_announcement_posts),
            )
    })
    .bind(format!("0.0.0.0:{}", config.app.port))?
    .run()
    .await;

    http_server
}
