//! Visitor feedback handler

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use gatepass_common::db::NewTestimonial;
use gatepass_common::ids::{parse_visit_id, VisitIdError};
use gatepass_common::validation::{is_filled, is_valid_email};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialRequest {
    #[serde(default)]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct TestimonialResponse {
    pub id: Uuid,
}

impl TestimonialRequest {
    fn validate(self) -> Result<NewTestimonial, ApiError> {
        let visit_id = parse_visit_id(self.visit_id.as_deref()).map_err(|e| match e {
            VisitIdError::Missing => ApiError::Unprocessable("A visit id is required".to_string()),
            malformed => ApiError::Unprocessable(malformed.to_string()),
        })?;

        if !is_filled(&self.comment) {
            return Err(ApiError::Unprocessable("Please share a comment".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::Unprocessable(
                "Please enter a valid email address".to_string(),
            ));
        }
        let rating = match self.rating {
            None => None,
            Some(value @ 1..=5) => Some(value as u8),
            Some(value) => {
                return Err(ApiError::Unprocessable(format!(
                    "Rating must be between 1 and 5, got {}",
                    value
                )))
            }
        };

        Ok(NewTestimonial {
            visit_id,
            email: self.email.trim().to_string(),
            rating,
            comment: self.comment.trim().to_string(),
        })
    }
}

/// POST /api/testimonials
pub async fn submit_testimonial(
    State(state): State<AppState>,
    Json(request): Json<TestimonialRequest>,
) -> ApiResult<(StatusCode, Json<TestimonialResponse>)> {
    let testimonial = request.validate()?;
    let id = state.store.insert_testimonial(&testimonial).await?;

    tracing::info!(
        testimonial_id = %id,
        visit_id = %testimonial.visit_id,
        rating = ?testimonial.rating,
        "Testimonial recorded"
    );
    Ok((StatusCode::CREATED, Json(TestimonialResponse { id })))
}

pub fn testimonial_routes() -> Router<AppState> {
    Router::new().route("/api/testimonials", post(submit_testimonial))
}
