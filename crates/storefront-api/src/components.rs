use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use storefront_types::Component;
use storefront_types::api::CreateComponentRequest;

use crate::convert;
use crate::error::ApiError;
use crate::state::{AppState, with_db};

fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn create_component(
    State(state): State<AppState>,
    Json(req): Json<CreateComponentRequest>,
) -> Result<(StatusCode, Json<Component>), ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Invalid("Name is required".into()));
    }
    if !valid_slug(&req.slug) {
        return Err(ApiError::Invalid(format!("Invalid slug: '{}'", req.slug)));
    }

    let id = Uuid::new_v4().to_string();
    let slug = req.slug;
    let taken = format!("Slug '{}' already taken", slug);

    let row = with_db(&state, move |db| match db.create_component(&id, &name, &slug) {
        Ok(()) => db.get_component(&id).map(Some),
        Err(e) if storefront_db::is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e),
    })
    .await?
    .ok_or(ApiError::Conflict(taken))?
    .ok_or(ApiError::NotFound("Component"))?;

    Ok((StatusCode::CREATED, Json(convert::component(row)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(valid_slug("hero-section-2"));
        assert!(!valid_slug(""));
        assert!(!valid_slug("Hero Section"));
        assert!(!valid_slug("hero_section"));
    }
}
