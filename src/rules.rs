//! Directive grammar and rule model
//!
//! A directive body (the text after `//colgen:`) is either an entity list
//! (`News,Tag`) or a custom-rule line (`News:TagIds,UniqueTagIds,Map(db)`).
//! Parsing produces one [`Rule`] per entity mention; duplicates across lines
//! are merged afterwards and the merged set is validated as a whole.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Custom rule kind: unique-value collector.
pub const CUSTOM_RULE_UNIQUE: &str = "Unique";
/// Custom rule kind: converter over owned values.
pub const CUSTOM_RULE_MAP: &str = "Map";
/// Custom rule kind: converter over pointer-shaped values.
pub const CUSTOM_RULE_MAP_P: &str = "MapP";
/// Custom rule kind: index keyed by an arbitrary field.
pub const CUSTOM_RULE_INDEX: &str = "Index";
/// Canonical ID field on source structs.
pub const FIELD_ID: &str = "id";

/// Generation-rule directive prefix.
pub const COLGEN_PREFIX: &str = "//colgen:";
/// Injection directive prefix, handled by the replacement engine.
pub const INJECTION_PREFIX: &str = "//colgen@";

/// One entity's generation plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Source struct name.
    pub entity_name: String,
    /// Base generation: collection type plus `ids()`/`index()` methods.
    pub base_gen: bool,
    /// Always use the `List` suffix for the collection-type name.
    pub use_list_suffix: bool,
    /// Custom generation rules, in declaration order.
    pub custom_rules: Vec<CustomRule>,
}

/// One derived-method request within an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomRule {
    /// Rule kind; empty for a plain field collector.
    pub kind: String,
    /// Directive field token the rule operates over.
    pub field: String,
    /// Optional argument in parentheses.
    pub arg: String,
}

/// Parses all directive bodies into one merged, validated rule per entity,
/// sorted ascending by entity name.
pub fn parse_rules(lines: &[String], use_list_suffix: bool) -> Result<Vec<Rule>> {
    let mut result = Vec::new();
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = if line.contains(':') {
            // custom generators: News:UniqueTagIds,Map(db)
            parse_custom_rule(line)
        } else if line.contains(',') || !line.contains(' ') {
            // main entities: News,Tag or News
            parse_entities(line)
        } else {
            Err(Error::UnknownLine(line.to_string()))
        };

        match parsed {
            Ok(rr) => result.extend(rr),
            Err(e) => return Err(line_err(e, line)),
        }
    }

    let merged = merge_rules(result, use_list_suffix);
    validate_rules(&merged)?;

    Ok(merged)
}

// Re-wrap the error so the full offending line is part of the message.
fn line_err(e: Error, line: &str) -> Error {
    match e {
        Error::UnknownLine(_) => Error::UnknownLine(line.to_string()),
        Error::MissingArg(spec) => Error::MissingArg(format!("{spec} in {line:?}")),
        other => other,
    }
}

/// Merges base and custom rules. The first rule seen for an entity seeds the
/// entry; a later custom-only rule appends its custom rules, a later base
/// declaration flips `base_gen` on. Idempotent over its own output.
pub fn merge_rules(rules: Vec<Rule>, use_list_suffix: bool) -> Vec<Rule> {
    let mut idx: BTreeMap<String, Rule> = BTreeMap::new();
    for mut r in rules {
        r.use_list_suffix = use_list_suffix;

        match idx.get_mut(&r.entity_name) {
            None => {
                idx.insert(r.entity_name.clone(), r);
            }
            Some(existing) => {
                if r.custom_rules.is_empty() {
                    existing.base_gen = true;
                } else {
                    existing.custom_rules.extend(r.custom_rules);
                }
            }
        }
    }

    idx.into_values().collect()
}

/// Validates the merged set: a non-base entity may only declare converter
/// (Map/MapP) rules, since every other method needs the collection type that
/// base generation provides.
pub fn validate_rules(rules: &[Rule]) -> Result<()> {
    for r in rules {
        if r.base_gen {
            continue;
        }

        for cr in &r.custom_rules {
            if !is_map_rule(&cr.kind) {
                return Err(Error::MissingEntity {
                    entity: r.entity_name.clone(),
                    rule: cr.kind.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Checks a rule name for Map/MapP in any casing.
pub fn is_map_rule(s: &str) -> bool {
    let s = s.to_lowercase();
    s == CUSTOM_RULE_MAP.to_lowercase() || s == CUSTOM_RULE_MAP_P.to_lowercase()
}

// Matches `Index(UserId)` lookalike rule specs.
fn re_name_arg() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^(\w+)\(([\w.:]+)\)$").expect("rule spec regex"))
}

// Parses a custom-rule line like `News:UniqueTagIds,Map(db)`.
fn parse_custom_rule(line: &str) -> Result<Vec<Rule>> {
    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() != 2 {
        return Err(Error::UnknownLine(line.to_string()));
    }

    let mut rule = Rule {
        entity_name: parts[0].to_string(),
        ..Rule::default()
    };

    for spec in parts[1].split(',') {
        let (mut name, mut arg) = (spec, "");
        if let Some(caps) = re_name_arg().captures(spec) {
            name = caps.get(1).map_or(spec, |m| m.as_str());
            arg = caps.get(2).map_or("", |m| m.as_str());
        }

        let mut cr = CustomRule::default();
        if let Some(field) = name.strip_prefix(CUSTOM_RULE_UNIQUE) {
            // UniqueTagIds, UniqueEpisodeId; empty remainder is rejected
            // later, at field resolution
            cr.kind = CUSTOM_RULE_UNIQUE.to_string();
            cr.field = field.to_string();
        } else if is_map_rule(name) {
            // MapP(db), Map(db.User), mapp(db), map(db)
            if arg.is_empty() {
                return Err(Error::MissingArg(spec.to_string()));
            }

            cr.kind = name.to_string();
            cr.arg = arg.to_string();
        } else if name == CUSTOM_RULE_INDEX {
            // Index(UserId)
            if arg.is_empty() {
                return Err(Error::MissingArg(spec.to_string()));
            }

            cr.kind = name.to_string();
            cr.field = arg.to_string();
        } else {
            // plain field collector, like Id => ids()
            cr.field = name.to_string();
        }

        rule.custom_rules.push(cr);
    }

    Ok(vec![rule])
}

// Parses a main-entity line like `News,Tag`.
fn parse_entities(line: &str) -> Result<Vec<Rule>> {
    Ok(line
        .split(',')
        .map(|name| Rule {
            entity_name: name.to_string(),
            base_gen: true,
            ..Rule::default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(ll: &[&str]) -> Vec<String> {
        ll.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn entity_list_yields_base_rules_in_order() {
        let rules = parse_rules(&lines(&["News,Tag"]), false).unwrap();
        assert_eq!(rules.len(), 2);
        // merged output is sorted by entity name
        assert_eq!(rules[0].entity_name, "News");
        assert!(rules[0].base_gen);
        assert!(rules[0].custom_rules.is_empty());
        assert_eq!(rules[1].entity_name, "Tag");
        assert!(rules[1].base_gen);
    }

    #[test]
    fn single_entity_line() {
        let rules = parse_rules(&lines(&["News"]), false).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].base_gen);
    }

    #[test]
    fn custom_rule_kinds() {
        let rules = parse_rules(
            &lines(&["News", "News:TagIds,UniqueTagIds,Map(db),Index(UserId)"]),
            false,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);

        let crs = &rules[0].custom_rules;
        assert_eq!(
            crs[0],
            CustomRule {
                kind: String::new(),
                field: "TagIds".into(),
                arg: String::new()
            }
        );
        assert_eq!(crs[1].kind, CUSTOM_RULE_UNIQUE);
        assert_eq!(crs[1].field, "TagIds");
        assert_eq!(crs[2].kind, "Map");
        assert_eq!(crs[2].arg, "db");
        assert_eq!(crs[3].kind, "Index");
        assert_eq!(crs[3].field, "UserId");
    }

    #[test]
    fn map_casing_is_preserved() {
        let rules = parse_rules(&lines(&["Season:mapp(db)"]), false).unwrap();
        assert_eq!(rules[0].custom_rules[0].kind, "mapp");
        assert_eq!(rules[0].custom_rules[0].arg, "db");
    }

    #[test]
    fn map_without_arg_fails() {
        let err = parse_rules(&lines(&["News", "News:Map"]), false).unwrap_err();
        assert!(matches!(err, Error::MissingArg(_)), "got {err}");
    }

    #[test]
    fn index_without_arg_fails() {
        let err = parse_rules(&lines(&["News", "News:Index"]), false).unwrap_err();
        assert!(matches!(err, Error::MissingArg(_)), "got {err}");
    }

    #[test]
    fn lowercase_index_is_a_plain_field() {
        // Index is matched case-sensitively, unlike Map/MapP
        let rules = parse_rules(&lines(&["News", "News:index(UserId)"]), false).unwrap();
        let cr = &rules[0].custom_rules[0];
        assert_eq!(cr.kind, "");
        assert_eq!(cr.field, "index");
    }

    #[test]
    fn unknown_line_fails() {
        let err = parse_rules(&lines(&["some odd line"]), false).unwrap_err();
        assert!(matches!(err, Error::UnknownLine(_)));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let rules = parse_rules(&lines(&["", "  ", "News"]), false).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn merge_appends_custom_rules() {
        let first = Rule {
            entity_name: "News".into(),
            base_gen: true,
            ..Rule::default()
        };
        let second = Rule {
            entity_name: "News".into(),
            custom_rules: vec![CustomRule {
                field: "Title".into(),
                ..CustomRule::default()
            }],
            ..Rule::default()
        };

        let merged = merge_rules(vec![first, second], false);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].base_gen, "custom-only rule must not clear base_gen");
        assert_eq!(merged[0].custom_rules.len(), 1);
    }

    #[test]
    fn merge_base_only_marks_existing() {
        let first = Rule {
            entity_name: "News".into(),
            custom_rules: vec![CustomRule {
                kind: "Map".into(),
                arg: "db".into(),
                ..CustomRule::default()
            }],
            ..Rule::default()
        };
        let second = Rule {
            entity_name: "News".into(),
            base_gen: true,
            ..Rule::default()
        };

        let merged = merge_rules(vec![first, second], false);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].base_gen);
        assert_eq!(merged[0].custom_rules.len(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let rules = parse_rules(
            &lines(&["News,Tag", "News:UniqueTagIds", "Tag:Map(db)"]),
            true,
        )
        .unwrap();
        let again = merge_rules(rules.clone(), true);
        assert_eq!(rules, again);
    }

    #[test]
    fn non_base_entity_allows_only_converters() {
        // converter-only exemption
        parse_rules(&lines(&["Show:MapP(db)"]), false).unwrap();

        let err = parse_rules(&lines(&["Show:Index(Foo)"]), false).unwrap_err();
        match err {
            Error::MissingEntity { entity, rule } => {
                assert_eq!(entity, "Show");
                assert_eq!(rule, "Index");
            }
            other => panic!("expected MissingEntity, got {other}"),
        }
    }

    #[test]
    fn unique_with_empty_remainder_parses() {
        // deferred rejection: parsing keeps the empty field
        let rules = parse_rules(&lines(&["News", "News:Unique"]), false).unwrap();
        let cr = &rules[0].custom_rules[0];
        assert_eq!(cr.kind, CUSTOM_RULE_UNIQUE);
        assert_eq!(cr.field, "");
    }
}
