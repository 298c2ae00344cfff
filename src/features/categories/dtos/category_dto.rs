use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::categories::graph::{CategoryNode, CategoryTree};
use crate::features::categories::models::Category;
use crate::shared::validation::{CATEGORY_TYPE_REGEX, SLUG_REGEX};

/// Query params for the flat category list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListCategoriesQuery {
    /// Only return categories of this type
    pub category_type: Option<String>,
}

/// Query params for the category tree
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CategoryTreeQuery {
    /// Return the single subtree whose slug (or, failing that, url) matches
    pub slug_or_url: Option<String>,
    /// Return the type roots of this category type. Ignored when `slugOrUrl` is set
    pub category_type: Option<String>,
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponseDto {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub category_type: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub is_featured: bool,
    pub is_disable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
            url: c.url,
            category_type: c.category_type,
            icon: c.icon,
            description: c.description,
            level: c.level,
            is_featured: c.is_featured,
            is_disable: c.is_disable,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub category_id: i32,
    pub name: String,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub parent_id: Option<i32>,
    pub icon: Option<String>,
    pub is_featured: bool,
    pub is_disable: bool,
    pub category_type: String,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub children: Vec<CategoryTreeDto>,
}

impl From<CategoryNode> for CategoryTreeDto {
    fn from(node: CategoryNode) -> Self {
        let c = node.category;
        Self {
            category_id: c.id,
            name: c.name,
            slug: c.slug,
            url: c.url,
            parent_id: c.parent_id,
            icon: c.icon,
            is_featured: c.is_featured,
            is_disable: c.is_disable,
            category_type: c.category_type,
            description: c.description,
            level: c.level,
            children: node.children.into_iter().map(Self::from).collect(),
        }
    }
}

/// Tree endpoint payload: a forest, or one node (or null) for slug lookups
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CategoryTreeResponseDto {
    Forest(Vec<CategoryTreeDto>),
    Subtree(Option<CategoryTreeDto>),
}

impl From<CategoryTree> for CategoryTreeResponseDto {
    fn from(tree: CategoryTree) -> Self {
        match tree {
            CategoryTree::Forest(nodes) => {
                Self::Forest(nodes.into_iter().map(CategoryTreeDto::from).collect())
            }
            CategoryTree::Subtree(node) => Self::Subtree(node.map(CategoryTreeDto::from)),
        }
    }
}

/// Header menu item (navigation shape, no description or level)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct MenuItemDto {
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub is_featured: bool,
    pub is_disable: bool,
    pub category_type: String,
    pub children: Vec<MenuItemDto>,
}

impl From<CategoryNode> for MenuItemDto {
    fn from(node: CategoryNode) -> Self {
        let c = node.category;
        Self {
            id: c.id,
            name: c.name,
            url: c.url,
            slug: c.slug,
            icon: c.icon,
            is_featured: c.is_featured,
            is_disable: c.is_disable,
            category_type: c.category_type,
            children: node.children.into_iter().map(Self::from).collect(),
        }
    }
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Generated from the name when omitted
    #[validate(
        length(max = 255),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase alphanumeric segments separated by single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 500))]
    pub url: Option<String>,

    pub parent_id: Option<i32>,

    #[validate(
        length(min = 1, max = 50),
        regex(path = *CATEGORY_TYPE_REGEX, message = "Category type must be upper snake case (e.g. HEADER_MENU)")
    )]
    pub category_type: String,

    #[validate(length(max = 500))]
    pub icon: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub level: Option<i32>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default)]
    pub is_disable: bool,
}

/// Request DTO for updating a category. Absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(
        length(max = 255),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase alphanumeric segments separated by single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 500))]
    pub url: Option<String>,

    pub parent_id: Option<i32>,

    /// Move the category to the top level (clears `parentId`)
    #[serde(default)]
    pub detach_parent: bool,

    #[validate(
        length(min = 1, max = 50),
        regex(path = *CATEGORY_TYPE_REGEX, message = "Category type must be upper snake case (e.g. HEADER_MENU)")
    )]
    pub category_type: Option<String>,

    #[validate(length(max = 500))]
    pub icon: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub level: Option<i32>,

    pub is_featured: Option<bool>,

    pub is_disable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::graph::build_header_menu;
    use crate::shared::test_helpers::category_row;
    use serde_json::json;

    fn node(id: i32, children: Vec<CategoryNode>) -> CategoryNode {
        CategoryNode {
            category: category_row(id, None, "COURSE"),
            children,
        }
    }

    #[test]
    fn test_tree_dto_uses_camel_case_keys() {
        let dto = CategoryTreeDto::from(node(1, vec![node(2, vec![])]));
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["categoryId"], json!(1));
        assert_eq!(value["categoryType"], json!("COURSE"));
        assert_eq!(value["isFeatured"], json!(false));
        assert_eq!(value["children"][0]["categoryId"], json!(2));
        assert!(value["children"][0]["children"].as_array().unwrap().is_empty());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_menu_item_shape() {
        let rows = vec![
            category_row(1, None, "HEADER_MENU"),
            category_row(2, Some(1), "HEADER_MENU"),
        ];
        let menu: Vec<MenuItemDto> = build_header_menu(&rows)
            .into_iter()
            .map(MenuItemDto::from)
            .collect();
        let value = serde_json::to_value(&menu).unwrap();

        assert_eq!(value[0]["id"], json!(1));
        assert_eq!(value[0]["children"][0]["id"], json!(2));
        assert!(value[0].get("description").is_none());
        assert!(value[0].get("level").is_none());
    }

    #[test]
    fn test_tree_response_serialization() {
        let missing = CategoryTreeResponseDto::from(CategoryTree::Subtree(None));
        assert_eq!(serde_json::to_value(&missing).unwrap(), json!(null));

        let single = CategoryTreeResponseDto::from(CategoryTree::Subtree(Some(node(3, vec![]))));
        assert_eq!(serde_json::to_value(&single).unwrap()["categoryId"], json!(3));

        let forest = CategoryTreeResponseDto::from(CategoryTree::Forest(vec![
            node(1, vec![]),
            node(2, vec![]),
        ]));
        assert_eq!(serde_json::to_value(&forest).unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_create_dto_validation() {
        let valid: CreateCategoryDto = serde_json::from_value(json!({
            "name": "IELTS",
            "slug": "ielts",
            "categoryType": "COURSE"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());
        assert!(!valid.is_featured);

        let bad_slug = CreateCategoryDto {
            slug: Some("IELTS Course".to_string()),
            ..valid.clone()
        };
        assert!(bad_slug.validate().is_err());

        let bad_type = CreateCategoryDto {
            category_type: "course".to_string(),
            ..valid.clone()
        };
        assert!(bad_type.validate().is_err());

        let empty_name = CreateCategoryDto {
            name: String::new(),
            ..valid
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_update_dto_allows_empty_body() {
        let dto: UpdateCategoryDto = serde_json::from_value(json!({})).unwrap();
        assert!(dto.validate().is_ok());

        let dto = UpdateCategoryDto {
            level: Some(-1),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
