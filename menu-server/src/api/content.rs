//! Menu content routes
//!
//! One router per [`EntityKind`], mounted at `/api/{segment}`:
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | / | GET | list with filters (`lang`, `available`, `category`, `ingredient`, `search`, `ordering`) |
//! | / | POST | create; the caller becomes owner |
//! | /{id} | GET | one entity resolved to the requested locale |
//! | /{id} | PATCH | attribute update; `?version=` or `If-Match` for optimistic checks |
//! | /{id} | DELETE | delete entity and its translations |
//! | /{id}/translations | GET | locales present |
//! | /{id}/translations/{locale} | PUT, DELETE | upsert or remove one translation |
//!
//! The caller is optional everywhere; the mediator decides.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use shared::models::{AttributesPatch, EntityDraft, EntityKind, Translation};
use shared::types::EntityId;
use shared::{ApiResponse, AppError, AppResult, Locale};

use crate::api::run_blocking;
use crate::auth::MaybeUser;
use crate::core::ServerState;
use crate::i18n::requested_locale;
use crate::mediator::{ContentRequest, ContentResponse};
use crate::store::ListQuery;
use crate::utils::ok;

type ContentResult = AppResult<Json<ApiResponse<ContentResponse>>>;

pub fn router() -> Router<ServerState> {
    EntityKind::ALL.iter().fold(Router::new(), |router, kind| {
        let path = format!("/api/{}", kind.segment());
        router.nest(&path, routes().layer(Extension(*kind)))
    })
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).patch(update).delete(delete))
        .route("/{id}/translations", get(list_translations))
        .route(
            "/{id}/translations/{locale}",
            put(upsert_translation).delete(remove_translation),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub lang: Option<String>,
    pub available: Option<bool>,
    pub category: Option<EntityId>,
    pub ingredient: Option<EntityId>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl ListParams {
    fn into_parts(self) -> (Option<String>, ListQuery) {
        (
            self.lang,
            ListQuery {
                available: self.available,
                category: self.category,
                ingredient: self.ingredient,
                search: self.search,
                ordering: self.ordering,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LangParams {
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionParams {
    pub version: Option<u64>,
}

fn accept_language(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok())
}

/// `?version=` wins over `If-Match`; `"3"` and `W/"3"` are accepted
fn expected_version(params: &VersionParams, headers: &HeaderMap) -> AppResult<Option<u64>> {
    if params.version.is_some() {
        return Ok(params.version);
    }
    let Some(raw) = headers.get(http::header::IF_MATCH) else {
        return Ok(None);
    };
    let tag = raw
        .to_str()
        .map_err(|_| AppError::invalid_request("If-Match is not valid ASCII"))?
        .trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag).trim_matches('"');
    tag.parse().map(Some).map_err(|_| {
        AppError::invalid_request(format!("If-Match must carry an entity version, got {:?}", tag))
            .with_detail("field", "If-Match")
    })
}

async fn dispatch(state: &ServerState, caller: MaybeUser, request: ContentRequest) -> ContentResult {
    let mediator = state.mediator.clone();
    let response = run_blocking(state, move |cancel| {
        mediator.handle(caller.as_ref(), request, cancel)
    })
    .await?;
    Ok(ok(response))
}

/// GET /api/{kind}
async fn list(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ContentResult {
    let (lang, query) = params.into_parts();
    let locale = requested_locale(lang.as_deref(), accept_language(&headers));
    dispatch(&state, caller, ContentRequest::List { kind, query, locale }).await
}

/// POST /api/{kind}
async fn create(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Json(body): Json<Value>,
) -> ContentResult {
    let draft = EntityDraft::from_json(kind, body)?;
    dispatch(&state, caller, ContentRequest::Create { kind, draft }).await
}

/// GET /api/{kind}/{id}
async fn get_by_id(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path(id): Path<EntityId>,
    headers: HeaderMap,
    Query(params): Query<LangParams>,
) -> ContentResult {
    let locale = requested_locale(params.lang.as_deref(), accept_language(&headers));
    dispatch(&state, caller, ContentRequest::Get { kind, id, locale }).await
}

/// PATCH /api/{kind}/{id}
async fn update(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path(id): Path<EntityId>,
    Query(params): Query<VersionParams>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ContentResult {
    let expected_version = expected_version(&params, &headers)?;
    let patch = AttributesPatch::from_json(kind, body)?;
    dispatch(
        &state,
        caller,
        ContentRequest::Update {
            kind,
            id,
            patch,
            expected_version,
        },
    )
    .await
}

/// DELETE /api/{kind}/{id}
async fn delete(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path(id): Path<EntityId>,
) -> ContentResult {
    dispatch(&state, caller, ContentRequest::Delete { kind, id }).await
}

/// GET /api/{kind}/{id}/translations
async fn list_translations(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path(id): Path<EntityId>,
) -> ContentResult {
    dispatch(&state, caller, ContentRequest::ListTranslations { kind, id }).await
}

/// PUT /api/{kind}/{id}/translations/{locale}
async fn upsert_translation(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path((id, locale)): Path<(EntityId, String)>,
    Json(translation): Json<Translation>,
) -> ContentResult {
    let locale = Locale::parse(&locale)?;
    dispatch(
        &state,
        caller,
        ContentRequest::UpsertTranslation {
            kind,
            id,
            locale,
            translation,
        },
    )
    .await
}

/// DELETE /api/{kind}/{id}/translations/{locale}
async fn remove_translation(
    State(state): State<ServerState>,
    Extension(kind): Extension<EntityKind>,
    caller: MaybeUser,
    Path((id, locale)): Path<(EntityId, String)>,
) -> ContentResult {
    let locale = Locale::parse(&locale)?;
    dispatch(
        &state,
        caller,
        ContentRequest::RemoveTranslation { kind, id, locale },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_expected_version_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            expected_version(&VersionParams::default(), &headers).unwrap(),
            None
        );

        headers.insert(http::header::IF_MATCH, HeaderValue::from_static("W/\"4\""));
        assert_eq!(
            expected_version(&VersionParams::default(), &headers).unwrap(),
            Some(4)
        );

        let params = VersionParams { version: Some(7) };
        assert_eq!(expected_version(&params, &headers).unwrap(), Some(7));

        headers.insert(http::header::IF_MATCH, HeaderValue::from_static("*"));
        assert!(expected_version(&VersionParams::default(), &headers).is_err());
    }

    #[test]
    fn test_list_params_split() {
        let params = ListParams {
            lang: Some("es".into()),
            available: Some(true),
            ordering: Some("-price".into()),
            ..Default::default()
        };
        let (lang, query) = params.into_parts();
        assert_eq!(lang.as_deref(), Some("es"));
        assert_eq!(query.available, Some(true));
        assert_eq!(query.ordering.as_deref(), Some("-price"));
    }
}
