/// Category type whose rows make up the site's primary navigation
pub const HEADER_MENU_CATEGORY_TYPE: &str = "HEADER_MENU";

/// Maximum length of a generated slug
pub const MAX_SLUG_LENGTH: usize = 255;
