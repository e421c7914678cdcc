//! Inline injection engine
//!
//! A separate, single-line directive class:
//!
//! ```text
//! //colgen@NewCall(db)
//! //colgen@newUserSummary(dating.User,full,json)
//! ```
//!
//! Each directive becomes a literal find/replace pair: the directive line
//! itself is the search key, the rendered struct + constructor block the
//! replacement. Pairs are applied against the original buffer, so rules
//! never observe each other's output.

use std::path::Path;
use std::sync::OnceLock;

use cruet::Inflector;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::naming::{field_ident, first_char_lower, last_char_lower};
use crate::resolve::TypeResolver;
use crate::rules::FIELD_ID;
use crate::templates;

/// One field of a synthesized struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceField {
    pub name: String,
    pub ty: String,
    /// serde rename value; empty when `json` was not requested.
    pub tag: String,
}

/// One parsed injection directive and its rendered replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceRule {
    /// Original directive line, used verbatim as the literal search key.
    pub find: String,
    pub replace: String,

    /// Constructor casing token: `New` or `new`.
    pub cmd: String,
    pub entity: String,
    /// Source type reference, auto-qualified to `<pkg>.<Entity>` when the
    /// argument carried no qualifier.
    pub arg: String,
    pub is_full: bool,
    pub with_json: bool,

    /// Populated only in full mode.
    pub fields: Vec<ReplaceField>,
}

// Matches `//colgen@NewUserSummary(dating.User,full,json)` lookalikes.
fn re_injection() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^//colgen@(New|new)(\w+)\(([\w.:,]+)\)$").expect("injection regex")
    })
}

/// Parses one injection directive line.
pub fn parse_replace_rule(line: &str) -> Result<ReplaceRule> {
    let mut r = ReplaceRule {
        find: line.to_string(),
        ..ReplaceRule::default()
    };

    let caps = re_injection()
        .captures(line)
        .ok_or_else(|| Error::UnknownLine(line.to_string()))?;

    r.cmd = caps[1].to_string();
    r.entity = caps[2].to_string();

    for (i, arg) in caps[3].split(',').enumerate() {
        if i == 0 {
            r.arg = arg.to_string();
            continue;
        }

        match arg {
            "full" => r.is_full = true,
            "json" => r.with_json = true,
            other => return Err(Error::UnknownLine(other.to_string())),
        }
    }

    // validate conflicts
    if r.with_json && !r.is_full {
        return Err(Error::MissingArg("full".to_string()));
    }

    // convert db => db.Entity if needed
    if !r.arg.contains('.') && !r.arg.contains("::") {
        r.arg = format!("{}.{}", r.arg, r.entity);
    }

    r.fields.clear();

    Ok(r)
}

/// Parses a batch of injection lines, failing on the first bad one.
pub fn parse_replace_rules(lines: &[String]) -> Result<Vec<ReplaceRule>> {
    lines.iter().map(|l| parse_replace_rule(l)).collect()
}

#[derive(Serialize)]
struct ReplaceData<'a> {
    entity: &'a str,
    vis: &'a str,
    func_name: String,
    arg: String,
    member: String,
    is_full: bool,
    with_json: bool,
    fields: &'a [ReplaceField],
}

/// Injection generator. Point it at a package directory, then feed it the
/// raw `//colgen@` lines.
pub struct Replacer {
    resolver: Option<TypeResolver>,
}

impl Replacer {
    pub fn new() -> Replacer {
        Replacer { resolver: None }
    }

    /// Parses `path` for struct definitions, used by full mode.
    pub fn use_package_dir(&mut self, path: &Path) -> Result<()> {
        self.resolver = Some(TypeResolver::load(path)?);
        Ok(())
    }

    /// Parses and renders all injection rules.
    pub fn generate(&self, lines: &[String]) -> Result<Vec<ReplaceRule>> {
        let mut rules = parse_replace_rules(lines)?;

        for r in &mut rules {
            // full mode needs the resolved field model; plain mode only
            // wraps the referenced type
            if r.is_full {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| Error::Other("package dir not loaded".into()))?;
                let model = resolver.field_model(resolver.resolve_qualified(&r.arg));
                if model.is_empty() {
                    return Err(Error::MissingType(r.arg.clone()));
                }

                r.fields = model
                    .iter()
                    .filter(|f| f.is_pub)
                    .map(|f| ReplaceField {
                        name: f.name.clone(),
                        ty: f.ty.clone(),
                        tag: if r.with_json {
                            json_tag(&r.entity, &f.name)
                        } else {
                            String::new()
                        },
                    })
                    .collect();
            }

            r.replace = render_rule(r)?;
        }

        Ok(rules)
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Replacer::new()
    }
}

fn render_rule(rule: &ReplaceRule) -> Result<String> {
    templates::render(
        "replace",
        &ReplaceData {
            entity: &rule.entity,
            vis: if rule.cmd == "new" { "" } else { "pub " },
            func_name: format!("new_{}", field_ident(&rule.entity)),
            arg: rule.arg.replace('.', "::"),
            member: field_ident(&rule.entity),
            is_full: rule.is_full,
            with_json: rule.with_json,
            fields: &rule.fields,
        },
    )
}

/// Applies rendered rules as literal substring replacements over the
/// original content. Find keys are distinct directive lines, so ordering
/// cannot make rules interfere.
pub fn apply(content: &str, rules: &[ReplaceRule]) -> String {
    let mut out = content.to_string();
    for r in rules {
        out = out.replace(&r.find, &r.replace);
    }
    out
}

// Serialization key for a field: the ID field becomes `<entityCamel>Id`,
// then the whole name is lower-camel cased and a trailing `ID` pair is
// lowercased. The double rewrite is part of the output contract.
fn json_tag(entity: &str, field: &str) -> String {
    let mut t = field.to_string();
    if t == FIELD_ID {
        t = format!("{entity}Id");
    }

    t = first_char_lower(&t.to_camel_case());
    if t.ends_with("ID") {
        t = last_char_lower(&t);
    }

    t
}
