use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::categories::dtos::{
    CategoryResponseDto, CategoryTreeQuery, CategoryTreeResponseDto, CreateCategoryDto,
    ListCategoriesQuery, MenuItemDto, UpdateCategoryDto,
};
use crate::features::categories::graph::CategoryQuery;
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

/// List categories as a flat list
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let category_type = query
        .category_type
        .as_deref()
        .filter(|t| !t.trim().is_empty());

    let categories = service.list(category_type).await?;
    let total = categories.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta { total }),
    )))
}

/// Get the category hierarchy
///
/// - `slugOrUrl`: the single category whose slug (or, failing that, url) matches, with its
///   subtree. `data` is `null` when nothing matches.
/// - `categoryType`: every category of that type whose parent is missing or of another type.
/// - neither: the full forest across all types.
#[utoipa::path(
    get,
    path = "/api/categories/tree",
    params(CategoryTreeQuery),
    responses(
        (status = 200, description = "Category forest or subtree", body = ApiResponse<CategoryTreeResponseDto>),
    ),
    tag = "categories"
)]
pub async fn get_category_tree(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<CategoryTreeQuery>,
) -> Result<Json<ApiResponse<CategoryTreeResponseDto>>> {
    let query = CategoryQuery::new(query.slug_or_url, query.category_type);

    let tree = service.tree(&query).await?;
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// Get the header navigation menu
#[utoipa::path(
    get,
    path = "/api/categories/header-menu",
    responses(
        (status = 200, description = "Header menu", body = ApiResponse<Vec<MenuItemDto>>),
    ),
    tag = "categories"
)]
pub async fn get_header_menu(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<MenuItemDto>>>> {
    let menu = service.header_menu().await?;
    Ok(Json(ApiResponse::success(Some(menu), None, None)))
}

/// Get category by id
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Create a category (admin only)
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or unknown parent"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Slug already in use")
    ),
    tag = "categories",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

/// Update a category (admin only)
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error, unknown parent or parent cycle"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already in use")
    ),
    tag = "categories",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Delete a category (admin only)
///
/// Child categories are moved to the top level.
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(
        ("basic_auth" = [])
    )
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::routes;
    use crate::shared::test_helpers::lazy_pool;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server() -> TestServer {
        let service = Arc::new(CategoryService::new(lazy_pool()));
        let app = routes::routes(Arc::clone(&service)).merge(routes::admin_routes(service));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_slug() {
        let response = server()
            .post("/api/admin/categories")
            .json(&json!({
                "name": "IELTS",
                "slug": "IELTS Course",
                "categoryType": "COURSE"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_create_rejects_lowercase_type() {
        let response = server()
            .post("/api/admin/categories")
            .json(&json!({ "name": "Menu", "categoryType": "header_menu" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let response = server()
            .post("/api/admin/categories")
            .json(&json!({ "slug": "ielts" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Invalid JSON data")));
    }

    #[tokio::test]
    async fn test_update_rejects_negative_level() {
        let response = server()
            .put("/api/admin/categories/1")
            .json(&json!({ "level": -2 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_rejects_non_numeric_id() {
        let response = server().get("/api/categories/not-a-number").await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
