use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use uuid::Uuid;

use crate::application::usecases::intake::IntakeUseCase;
use crate::auth::AuthUser;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    asset_storage::AssetStorageClient, orders::OrderRepository, payments::StripeGateway,
};
use crate::domain::value_objects::intake::{
    IntakeSubmission, MAX_AUDIO_BYTES, MAX_PHOTO_BYTES, MAX_REFERENCE_PHOTOS, UploadedFile,
    audio_extension, photo_extension,
};
use crate::infrastructure::axum_http::error_responses::{bad_request, usecase_error};
use crate::infrastructure::payments::stripe_client::StripeClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, repositories::orders::OrderPostgres,
};
use crate::infrastructure::storage::supabase_storage::SupabaseStorageClient;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    asset_storage: Arc<SupabaseStorageClient>,
    stripe_client: Arc<StripeClient>,
    config: &DotEnvyConfig,
) -> Router {
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let intake_usecase = IntakeUseCase::new(
        order_repository,
        asset_storage,
        stripe_client,
        config.stripe.clone(),
    );

    Router::new()
        .route("/api/intake", post(submit_intake))
        .with_state(Arc::new(intake_usecase))
}

pub async fn submit_intake<O, A, S>(
    State(intake_usecase): State<Arc<IntakeUseCase<O, A, S>>>,
    user: AuthUser,
    multipart: Multipart,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    A: AssetStorageClient + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let submission = match parse_submission(multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    match intake_usecase.submit(&user, submission).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

/// Some browsers omit the part content type; fall back to guessing from the
/// uploaded file name.
fn part_content_type(field: &axum::extract::multipart::Field<'_>) -> String {
    field
        .content_type()
        .map(str::to_string)
        .or_else(|| {
            field
                .file_name()
                .and_then(|name| mime_guess::from_path(name).first_raw())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Lifts the multipart stream into a validated [`IntakeSubmission`]. Field
/// names follow the upload form: `order_id`/`checkout_session_id`,
/// `quiz_data`, `interview_data`, `reference_photo_N`, `audio_note`.
async fn parse_submission(mut multipart: Multipart) -> Result<IntakeSubmission, Response> {
    let mut submission = IntakeSubmission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(bad_request(format!("invalid multipart body: {err}"))),
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "order_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| bad_request("order_id must be text"))?;
                let order_id = Uuid::parse_str(raw.trim())
                    .map_err(|_| bad_request("order_id is not a valid UUID"))?;
                submission.order_id = Some(order_id);
            }
            "checkout_session_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| bad_request("checkout_session_id must be text"))?;
                submission.checkout_session_id = Some(raw.trim().to_string());
            }
            "quiz_data" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| bad_request("quiz_data must be text"))?;
                let quiz_data = serde_json::from_str(&raw)
                    .map_err(|err| bad_request(format!("quiz_data is not valid JSON: {err}")))?;
                submission.quiz_data = Some(quiz_data);
            }
            "interview_data" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| bad_request("interview_data must be text"))?;
                let interview_data = serde_json::from_str(&raw).map_err(|err| {
                    bad_request(format!("interview_data is not valid JSON: {err}"))
                })?;
                submission.interview_data = Some(interview_data);
            }
            "audio_note" => {
                let content_type = part_content_type(&field);
                let Some(extension) = audio_extension(&content_type) else {
                    return Err(bad_request(format!(
                        "unsupported audio type: {content_type}"
                    )));
                };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("failed to read audio_note"))?;
                if bytes.len() > MAX_AUDIO_BYTES {
                    return Err(bad_request("audio_note exceeds the 25 MB limit"));
                }
                submission.audio_note = Some(UploadedFile {
                    bytes: bytes.to_vec(),
                    content_type,
                    extension,
                });
            }
            other if other.starts_with("reference_photo") => {
                if submission.reference_photos.len() >= MAX_REFERENCE_PHOTOS {
                    return Err(bad_request(format!(
                        "too many reference photos (limit {MAX_REFERENCE_PHOTOS})"
                    )));
                }
                let content_type = part_content_type(&field);
                let Some(extension) = photo_extension(&content_type) else {
                    return Err(bad_request(format!(
                        "unsupported photo type: {content_type}"
                    )));
                };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("failed to read reference photo"))?;
                if bytes.len() > MAX_PHOTO_BYTES {
                    return Err(bad_request("reference photo exceeds the 10 MB limit"));
                }
                submission.reference_photos.push(UploadedFile {
                    bytes: bytes.to_vec(),
                    content_type,
                    extension,
                });
            }
            _ => {}
        }
    }

    if submission.order_id.is_none() && submission.checkout_session_id.is_none() {
        return Err(bad_request("order_id or checkout_session_id is required"));
    }

    Ok(submission)
}
