use crate::api::{parse_address, AppState};
use crate::cast::CastContext;
use crate::domain::Spell;
use crate::error::AppError;
use crate::orchestration::CastOutcome;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRequest {
    pub account: String,
    /// Defaults to the account itself.
    pub origin: Option<String>,
    pub spells: Vec<Spell>,
}

pub async fn post_cast(
    State(state): State<AppState>,
    Json(request): Json<CastRequest>,
) -> Result<Json<CastOutcome>, AppError> {
    if request.spells.is_empty() {
        return Err(AppError::BadRequest("spells must not be empty".into()));
    }
    let account = parse_address(&request.account, "account")?;
    let origin = match request.origin.as_deref() {
        Some(raw) => parse_address(raw, "origin")?,
        None => account.clone(),
    };
    let context = CastContext::new(account, origin);

    let mut protocol = state.protocol.lock().await;
    let outcome = protocol.cast(&context, &request.spells)?;
    Ok(Json(outcome))
}
