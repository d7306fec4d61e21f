use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::CurrentUser,
    classifier::{ClassifyError, ImageUpload},
    error::AppError,
    nutrition::NutritionError,
    state::AppState,
};

use super::dto::PredictResponse;

pub fn predict_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/api/fruit-detection", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Pulls the `file` field out of the form and checks it is a non-empty image.
pub(crate) async fn read_image(mut mp: Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);

        let Some(content_type) = content_type.filter(|ct| ct.starts_with("image/")) else {
            return Err(AppError::bad_request("Invalid image upload"));
        };
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(AppError::bad_request("Empty image upload"));
        }
        return Ok(ImageUpload {
            filename,
            content_type,
            data,
        });
    }
    Err(AppError::bad_request("No image file provided"))
}

fn classify_error(e: ClassifyError) -> AppError {
    match e {
        ClassifyError::NotRecognized => {
            AppError::Unprocessable("Could not recognise a fruit in the image".into())
        }
        other => AppError::internal("Prediction failed", other),
    }
}

fn nutrition_error(e: NutritionError) -> AppError {
    match e {
        NutritionError::NotFound(food) => {
            AppError::NotFound(format!("No nutrition data found for {food}"))
        }
        NutritionError::Upstream(msg) => {
            error!(error = %msg, "nutrition lookup failed");
            AppError::BadGateway("Nutrition service unavailable".into())
        }
    }
}

#[instrument(skip_all)]
pub async fn predict(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let image = read_image(mp?).await.map_err(|e| {
        warn!(reason = %e, "upload rejected");
        e
    })?;

    let prediction = state
        .classifier
        .classify(&image)
        .await
        .map_err(classify_error)?;

    let nutrition = state
        .nutrition
        .lookup(&prediction.label)
        .await
        .map_err(nutrition_error)?;

    info!(
        user_id = user.id,
        food = %prediction.label,
        confidence = prediction.confidence,
        bytes = image.data.len(),
        "prediction served"
    );
    Ok(Json(PredictResponse {
        food: prediction.label,
        confidence: prediction.confidence,
        nutrition,
        note: prediction.note,
    }))
}
