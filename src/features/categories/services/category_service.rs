use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryResponseDto, CategoryTreeResponseDto, CreateCategoryDto, MenuItemDto,
    UpdateCategoryDto,
};
use crate::features::categories::graph::{build_header_menu, CategoryGraph, CategoryQuery};
use crate::features::categories::models::Category;
use crate::shared::validation::slugify;

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            if db_err.constraint() == Some("categories_slug_unique") {
                return AppError::Conflict("A category with this slug already exists".to_string());
            }
            return AppError::Conflict("Category already exists".to_string());
        }

        // Foreign key violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::BadRequest("Referenced parent category does not exist".to_string());
        }
    }

    tracing::error!("Category query failed: {:?}", e);
    AppError::Database(e)
}

/// Level of a new category: explicit value, else one below its parent, else 1
fn resolve_level(level: Option<i32>, parent: Option<&Category>) -> Result<i32> {
    match (level, parent) {
        (Some(level), _) => Ok(level),
        (None, Some(parent)) => parent
            .level
            .unwrap_or(1)
            .checked_add(1)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Parent category {} is already at the deepest level",
                    parent.id
                ))
            }),
        (None, None) => Ok(1),
    }
}

/// Check that `parent_id` may become the parent of `id` without creating a cycle
fn validate_reparent(rows: &[Category], id: i32, parent_id: i32) -> Result<()> {
    if parent_id == id {
        return Err(AppError::BadRequest(
            "A category cannot be its own parent".to_string(),
        ));
    }

    if !rows.iter().any(|c| c.id == parent_id) {
        return Err(AppError::BadRequest(format!(
            "Parent category {} not found",
            parent_id
        )));
    }

    if CategoryGraph::new(rows).descendant_ids(id).contains(&parent_id) {
        return Err(AppError::BadRequest(format!(
            "Category {} is a descendant of category {}",
            parent_id, id
        )));
    }

    Ok(())
}

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every category row, ordered by id. The tree builder needs the full set.
    async fn fetch_all(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, parent_id, name, slug, url, category_type, icon, description, level,
                   is_featured, is_disable, created_at, updated_at
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, parent_id, name, slug, url, category_type, icon, description, level,
                   is_featured, is_disable, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get category {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    async fn ensure_slug_available(&self, slug: &str, exclude_id: Option<i32>) -> Result<()> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE slug = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if taken {
            return Err(AppError::Conflict(format!(
                "Category with slug '{}' already exists",
                slug
            )));
        }

        Ok(())
    }

    /// List categories (flat), optionally restricted to one type
    pub async fn list(&self, category_type: Option<&str>) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.fetch_all().await?;

        Ok(categories
            .into_iter()
            .filter(|c| category_type.map_or(true, |t| c.category_type == t))
            .map(CategoryResponseDto::from)
            .collect())
    }

    /// Full forest, type roots or a single subtree depending on the query
    pub async fn tree(&self, query: &CategoryQuery) -> Result<CategoryTreeResponseDto> {
        let categories = self.fetch_all().await?;
        let tree = CategoryGraph::new(&categories).query(query);

        Ok(tree.into())
    }

    /// Navigation menu built from `HEADER_MENU` categories only
    pub async fn header_menu(&self) -> Result<Vec<MenuItemDto>> {
        let categories = self.fetch_all().await?;

        Ok(build_header_menu(&categories)
            .into_iter()
            .map(MenuItemDto::from)
            .collect())
    }

    /// Get category by id
    pub async fn get_by_id(&self, id: i32) -> Result<CategoryResponseDto> {
        self.find_by_id(id)
            .await?
            .map(CategoryResponseDto::from)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Create a category. The slug is derived from the name when not given.
    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let slug = dto.slug.clone().or_else(|| slugify(&dto.name));
        if let Some(ref slug) = slug {
            self.ensure_slug_available(slug, None).await?;
        }

        let parent = match dto.parent_id {
            Some(parent_id) => Some(self.find_by_id(parent_id).await?.ok_or_else(|| {
                AppError::BadRequest(format!("Parent category {} not found", parent_id))
            })?),
            None => None,
        };
        let level = resolve_level(dto.level, parent.as_ref())?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories
                (parent_id, name, slug, url, category_type, icon, description, level,
                 is_featured, is_disable)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, parent_id, name, slug, url, category_type, icon, description, level,
                      is_featured, is_disable, created_at, updated_at
            "#,
        )
        .bind(dto.parent_id)
        .bind(&dto.name)
        .bind(&slug)
        .bind(&dto.url)
        .bind(&dto.category_type)
        .bind(&dto.icon)
        .bind(&dto.description)
        .bind(level)
        .bind(dto.is_featured)
        .bind(dto.is_disable)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)?;

        tracing::info!(
            "Category created: id={}, type={}, slug={:?}",
            category.id,
            category.category_type,
            category.slug
        );

        Ok(category.into())
    }

    /// Update a category. Fields left out of the request keep their value.
    pub async fn update(&self, id: i32, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        if let Some(ref slug) = dto.slug {
            if existing.slug.as_deref() != Some(slug.as_str()) {
                self.ensure_slug_available(slug, Some(id)).await?;
            }
        }

        if dto.detach_parent && dto.parent_id.is_some() {
            return Err(AppError::BadRequest(
                "parentId and detachParent cannot be combined".to_string(),
            ));
        }

        if let Some(parent_id) = dto.parent_id {
            if existing.parent_id != Some(parent_id) {
                let categories = self.fetch_all().await?;
                validate_reparent(&categories, id, parent_id)?;
            }
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                url = COALESCE($3, url),
                parent_id = CASE WHEN $4 THEN NULL ELSE COALESCE($5, parent_id) END,
                category_type = COALESCE($6, category_type),
                icon = COALESCE($7, icon),
                description = COALESCE($8, description),
                level = COALESCE($9, level),
                is_featured = COALESCE($10, is_featured),
                is_disable = COALESCE($11, is_disable),
                updated_at = NOW()
            WHERE id = $12
            RETURNING id, parent_id, name, slug, url, category_type, icon, description, level,
                      is_featured, is_disable, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.slug)
        .bind(&dto.url)
        .bind(dto.detach_parent)
        .bind(dto.parent_id)
        .bind(&dto.category_type)
        .bind(&dto.icon)
        .bind(&dto.description)
        .bind(dto.level)
        .bind(dto.is_featured)
        .bind(dto.is_disable)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(handle_db_error)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        tracing::info!("Category updated: id={}", category.id);

        Ok(category.into())
    }

    /// Delete a category. Its children move to the top level.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(handle_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tracing::info!("Category deleted: id={}", id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::category_row;

    fn with_level(mut row: Category, level: i32) -> Category {
        row.level = Some(level);
        row
    }

    #[test]
    fn test_resolve_level() {
        let parent = with_level(category_row(1, None, "COURSE"), 2);
        let parent_without_level = category_row(2, None, "COURSE");

        assert_eq!(resolve_level(Some(5), Some(&parent)).unwrap(), 5);
        assert_eq!(resolve_level(None, Some(&parent)).unwrap(), 3);
        assert_eq!(resolve_level(None, Some(&parent_without_level)).unwrap(), 2);
        assert_eq!(resolve_level(None, None).unwrap(), 1);
    }

    #[test]
    fn test_resolve_level_rejects_overflow() {
        let deepest = with_level(category_row(1, None, "COURSE"), i32::MAX);

        assert!(matches!(
            resolve_level(None, Some(&deepest)),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            resolve_level(Some(i32::MAX), Some(&deepest)).unwrap(),
            i32::MAX
        );
    }

    #[test]
    fn test_validate_reparent() {
        let rows = vec![
            category_row(1, None, "COURSE"),
            category_row(2, Some(1), "COURSE"),
            category_row(3, Some(2), "COURSE"),
            category_row(4, None, "NEWS"),
        ];

        assert!(validate_reparent(&rows, 3, 4).is_ok());
        assert!(validate_reparent(&rows, 4, 3).is_ok());
        assert!(matches!(
            validate_reparent(&rows, 2, 2),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_reparent(&rows, 1, 3),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_reparent(&rows, 1, 99),
            Err(AppError::BadRequest(_))
        ));
    }
}
