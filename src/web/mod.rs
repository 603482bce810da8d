use axum::http::header;
use axum::middleware::from_fn_with_state;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthState, auth_user_middleware};
use crate::config;
use crate::task::api::v1::{self as tasks_v1, TaskState};

#[derive(OpenApi)]
#[openapi(
    paths(
        tasks_v1::get_tasks_handler,
        tasks_v1::get_task_handler,
        tasks_v1::create_task_handler,
        tasks_v1::update_task_handler,
        tasks_v1::delete_task_handler,
        tasks_v1::complete_task_handler,
    ),
    tags((name = "Tasks", description = "Personal task management endpoints"))
)]
struct ApiDoc;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    use axum::Router;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let auth_state = Arc::new(AuthState::from_config(&config));
    let task_state = Arc::new(TaskState { db: Arc::new(db) });

    // Every task route resolves the caller through the auth middleware;
    // handlers surface Unauthenticated when no identity was established.
    let api_routes = tasks_v1::create_api_router(task_state)
        .layer(from_fn_with_state(auth_state, auth_user_middleware));

    let app = Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(
                    header::AUTHORIZATION,
                )))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
