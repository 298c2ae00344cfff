use deunicode::deunicode;
use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::MAX_SLUG_LENGTH;

lazy_static! {
    /// Regex for validating slugs
    /// Must be lowercase alphanumeric with single hyphens between segments
    /// - Valid: "khoa-hoc-ielts", "news", "toeic-450"
    /// - Invalid: "-news", "news-", "khoa--hoc", "News", "khoa_hoc"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Regex for validating category types
    /// Upper snake case starting with a letter
    /// - Valid: "HEADER_MENU", "COURSE", "NEWS_2024"
    /// - Invalid: "header_menu", "_MENU", "HEADER-MENU"
    pub static ref CATEGORY_TYPE_REGEX: Regex = Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
}

/// Derive a slug from free text.
///
/// Accented letters are folded to ASCII first ("Khóa học" becomes
/// "khoa-hoc"). ASCII letters and digits are kept (lowercased), every other
/// run of characters becomes a single hyphen. Returns `None` when nothing
/// usable is left.
pub fn slugify(text: &str) -> Option<String> {
    let folded = deunicode(text);
    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;

    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("khoa-hoc-ielts"));
        assert!(SLUG_REGEX.is_match("news"));
        assert!(SLUG_REGEX.is_match("toeic-450"));
        assert!(SLUG_REGEX.is_match("a"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-news")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("news-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("khoa--hoc")); // double hyphen
        assert!(!SLUG_REGEX.is_match("News")); // uppercase
        assert!(!SLUG_REGEX.is_match("khoa_hoc")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_category_type_regex() {
        assert!(CATEGORY_TYPE_REGEX.is_match("HEADER_MENU"));
        assert!(CATEGORY_TYPE_REGEX.is_match("COURSE"));
        assert!(CATEGORY_TYPE_REGEX.is_match("NEWS_2024"));
        assert!(!CATEGORY_TYPE_REGEX.is_match("header_menu"));
        assert!(!CATEGORY_TYPE_REGEX.is_match("_MENU"));
        assert!(!CATEGORY_TYPE_REGEX.is_match("HEADER-MENU"));
        assert!(!CATEGORY_TYPE_REGEX.is_match(""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("IELTS Foundation").as_deref(), Some("ielts-foundation"));
        assert_eq!(slugify("  Tin tuc -- Su kien!  ").as_deref(), Some("tin-tuc-su-kien"));
        assert_eq!(slugify("TOEIC 450+").as_deref(), Some("toeic-450"));
        assert_eq!(slugify("Khóa học").as_deref(), Some("khoa-hoc"));
        assert_eq!(slugify("***"), None);
        assert_eq!(slugify(""), None);
    }

    #[test]
    fn test_slugify_folds_vietnamese_diacritics() {
        assert_eq!(slugify("Đào tạo 2024").as_deref(), Some("dao-tao-2024"));
        assert_eq!(slugify("Tiếng Anh giao tiếp").as_deref(), Some("tieng-anh-giao-tiep"));
        assert_eq!(slugify("Luyện thi IELTS").as_deref(), Some("luyen-thi-ielts"));
    }

    #[test]
    fn test_slugify_output_matches_regex() {
        for text in ["A  B", "--x--", "Đào tạo 2024", "c++ / rust"] {
            let slug = slugify(text).unwrap();
            assert!(SLUG_REGEX.is_match(&slug), "{}", slug);
        }
    }

    #[test]
    fn test_slugify_truncates_long_input() {
        let text = "ab ".repeat(200);
        let slug = slugify(&text).unwrap();

        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(SLUG_REGEX.is_match(&slug));
    }
}
