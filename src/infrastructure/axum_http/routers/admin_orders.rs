use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use uuid::Uuid;

use crate::application::usecases::admin_orders::AdminOrderUseCase;
use crate::auth::AuthUser;
use crate::domain::repositories::{orders::OrderRepository, profiles::ProfileRepository};
use crate::domain::value_objects::orders::{AdminCreateOrderRequest, AdminUpdateOrderRequest};
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{orders::OrderPostgres, profiles::ProfilePostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));

    let admin_order_usecase = AdminOrderUseCase::new(order_repository, profile_repository);

    Router::new()
        .route("/api/admin/orders", get(list_orders).post(create_order))
        .route(
            "/api/admin/orders/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .with_state(Arc::new(admin_order_usecase))
}

pub async fn list_orders<O, P>(
    State(admin_order_usecase): State<Arc<AdminOrderUseCase<O, P>>>,
    user: AuthUser,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match admin_order_usecase.list_orders(&user).await {
        Ok(orders) => (StatusCode::OK, Json(json!({ "orders": orders }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn get_order<O, P>(
    State(admin_order_usecase): State<Arc<AdminOrderUseCase<O, P>>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match admin_order_usecase.get_order(&user, order_id).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn create_order<O, P>(
    State(admin_order_usecase): State<Arc<AdminOrderUseCase<O, P>>>,
    user: AuthUser,
    Json(request): Json<AdminCreateOrderRequest>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match admin_order_usecase.create_order(&user, request).await {
        Ok(order) => (StatusCode::CREATED, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn update_order<O, P>(
    State(admin_order_usecase): State<Arc<AdminOrderUseCase<O, P>>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<AdminUpdateOrderRequest>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match admin_order_usecase
        .update_order(&user, order_id, request)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn delete_order<O, P>(
    State(admin_order_usecase): State<Arc<AdminOrderUseCase<O, P>>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match admin_order_usecase.soft_delete(&user, order_id).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
