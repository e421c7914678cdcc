//! Naming rules for generated items
//!
//! Directive tokens are written in UpperCamelCase (`TagIds`, `UserId`) while
//! the emitted Rust items are snake_case. Everything that turns one into the
//! other lives here so the output stays byte-for-byte reproducible.

use cruet::Inflector;

/// A struct name paired with its collection-type name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Entity {
    pub name: String,
    pub list: String,
}

impl Entity {
    /// Computes the collection-type name for `name`.
    ///
    /// Prefers the pluralized struct name (`News` stays `News`, `Tag`
    /// becomes `Tags`); falls back to the `List` suffix when pluralization
    /// is a no-op or list-suffix mode is forced.
    pub fn new(name: &str, use_list_suffix: bool) -> Entity {
        let mut list = format!("{name}List");
        if !use_list_suffix {
            let pl = name.to_plural();
            if pl != name {
                list = pl;
            }
        }

        Entity {
            name: name.to_string(),
            list,
        }
    }

    /// snake_case form of the collection-type name, used in converter
    /// function names (`NewsList` => `new_news_list`).
    pub fn list_snake(&self) -> String {
        self.list.to_snake_case()
    }
}

/// Derives a collector method name from a directive field token:
/// pluralize, fix an all-caps tail (`IDS` => `IDs`), then snake_case.
pub fn plural_method_name(field: &str) -> String {
    last_char_lower(&field.to_plural()).to_snake_case()
}

/// snake_case form of a directive field token, used for field lookup
/// (`TagIds` => `tag_ids`).
pub fn field_ident(field: &str) -> String {
    field.to_snake_case()
}

/// Returns `s` with its last character lowercased. Useful for converting
/// `IDS`-shaped plurals into `IDs`.
pub fn last_char_lower(s: &str) -> String {
    let Some(last) = s.chars().last() else {
        return s.to_string();
    };

    let lower = last.to_lowercase().to_string();
    if lower == last.to_string() {
        return s.to_string();
    }

    format!("{}{}", &s[..s.len() - last.len_utf8()], lower)
}

/// Returns `s` with its first character lowercased.
pub fn first_char_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_lowercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_pluralizes_name() {
        assert_eq!(
            Entity::new("Tag", false),
            Entity {
                name: "Tag".into(),
                list: "Tags".into()
            }
        );
        assert_eq!(Entity::new("Category", false).list, "Categories");
    }

    #[test]
    fn entity_falls_back_to_list_suffix() {
        // "News" pluralizes to itself
        assert_eq!(Entity::new("News", false).list, "NewsList");
    }

    #[test]
    fn entity_forced_list_suffix() {
        assert_eq!(Entity::new("Tag", true).list, "TagList");
    }

    #[test]
    fn list_snake() {
        assert_eq!(Entity::new("Tag", false).list_snake(), "tags");
        assert_eq!(Entity::new("News", false).list_snake(), "news_list");
    }

    #[test]
    fn plural_method_names() {
        assert_eq!(plural_method_name("Title"), "titles");
        assert_eq!(plural_method_name("TagId"), "tag_ids");
        assert_eq!(plural_method_name("Id"), "ids");
    }

    #[test]
    fn field_idents() {
        assert_eq!(field_ident("TagIds"), "tag_ids");
        assert_eq!(field_ident("Id"), "id");
        assert_eq!(field_ident("Title"), "title");
    }

    #[test]
    fn last_char_lower_cases() {
        assert_eq!(last_char_lower("IDS"), "IDs");
        assert_eq!(last_char_lower("IDs"), "IDs");
        assert_eq!(last_char_lower(""), "");
    }

    #[test]
    fn first_char_lower_cases() {
        assert_eq!(first_char_lower("UserSummaryId"), "userSummaryId");
        assert_eq!(first_char_lower(""), "");
    }
}
