use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::application::usecases::order_view::OrderViewUseCase;
use crate::domain::repositories::orders::OrderRepository;
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, repositories::orders::OrderPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let order_view_usecase = OrderViewUseCase::new(order_repository);

    Router::new()
        .route("/api/view/:id", get(view_order).post(record_first_view))
        .with_state(Arc::new(order_view_usecase))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewBody {
    pub token: String,
}

pub async fn view_order<O>(
    State(order_view_usecase): State<Arc<OrderViewUseCase<O>>>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
{
    match order_view_usecase.view(order_id, &query.token).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn record_first_view<O>(
    State(order_view_usecase): State<Arc<OrderViewUseCase<O>>>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ViewBody>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
{
    match order_view_usecase
        .record_first_view(order_id, &body.token)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
