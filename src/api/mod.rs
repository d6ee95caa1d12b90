pub mod in_process;
pub mod schema;
pub mod types;

pub use in_process::InProcessTransport;
pub use schema::{build_schema, CrmSchema};

use crate::utils::error::Result;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQL;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const GRAPHQL_PATH: &str = "/graphql";

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// `POST /graphql` 執行查詢，`GET /graphql` 回傳 GraphiQL 介面
pub fn router(schema: CrmSchema) -> Router {
    Router::new().route(
        GRAPHQL_PATH,
        get(graphiql).post_service(GraphQL::new(schema)),
    )
}

/// 等待 `signal` 完成後取消 `shutdown`；無法監聽訊號時只記錄錯誤，服務繼續執行
pub async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("❌ Unable to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown requested");
    shutdown.cancel();
}

pub async fn serve(listener: TcpListener, schema: CrmSchema, shutdown: CancellationToken) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🚀 GraphQL API listening on http://{}{}", addr, GRAPHQL_PATH);
    }

    axum::serve(listener, router(schema))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("GraphQL API stopped");
    Ok(())
}
