//! Template code generator
//!
//! Consumes the merged, validated rule list plus resolved field models and
//! renders one output unit: a generated sibling module with collection
//! newtypes and derived methods. Emission order follows rule order, so the
//! output is deterministic for a given source tree.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::naming::{field_ident, plural_method_name, Entity};
use crate::resolve::{FieldModel, TypeResolver};
use crate::rules::{is_map_rule, CustomRule, Rule, CUSTOM_RULE_INDEX, CUSTOM_RULE_UNIQUE, FIELD_ID};
use crate::templates;

#[derive(Serialize)]
struct MethodData<'a> {
    entity: &'a Entity,
    field_type: &'a str,
    field_name: &'a str,
    func_name: &'a str,
}

#[derive(Serialize)]
struct MapData<'a> {
    entity: &'a Entity,
    vis: &'a str,
    func_name: String,
    input_type: String,
    return_type: String,
    helper: String,
    ctor: String,
    wrap: bool,
}

/// Code generator for `//colgen:` rules. Construct, point at a package
/// directory with [`Generator::use_package_dir`], then call
/// [`Generator::generate`] once.
pub struct Generator {
    module_name: String,
    func_pkg: String,
    imports: Vec<String>,
    resolver: Option<TypeResolver>,
}

impl Generator {
    /// `imports` is a comma-separated list of extra `use` paths for the
    /// generated file; `func_pkg` qualifies the external `map`/`map_p`
    /// converter helpers.
    pub fn new(module_name: &str, imports: &str, func_pkg: &str) -> Generator {
        let mut ii: Vec<String> = imports
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        ii.sort();

        Generator {
            module_name: module_name.to_string(),
            func_pkg: func_pkg.to_string(),
            imports: ii,
            resolver: None,
        }
    }

    /// Parses `path` for struct definitions. Must be called before
    /// [`Generator::generate`].
    pub fn use_package_dir(&mut self, path: &Path) -> Result<()> {
        self.resolver = Some(TypeResolver::load(path)?);
        Ok(())
    }

    /// Generates the full output unit for the given rules.
    pub fn generate(&self, rules: &[Rule]) -> Result<String> {
        let mut out = String::new();
        self.gen_head(&mut out);

        for rule in rules {
            self.generate_by_rule(&mut out, rule).map_err(|e| match e {
                Error::MissingField(f) => {
                    Error::MissingField(format!("{f} for {}", rule.entity_name))
                }
                other => other,
            })?;
        }

        Ok(out)
    }

    fn resolver(&self) -> Result<&TypeResolver> {
        self.resolver
            .as_ref()
            .ok_or_else(|| Error::Other("package dir not loaded".into()))
    }

    // Header: provenance line, imports, and the glob that pulls the entity
    // types from the annotated module.
    fn gen_head(&self, out: &mut String) {
        out.push_str(&format!(
            "//! Code generated by colgen for `{}`; DO NOT EDIT.\n\n",
            self.module_name
        ));
        out.push_str("#![allow(unused_imports)]\n\n");
        out.push_str("use std::collections::{HashMap, HashSet};\n\n");
        out.push_str("use super::*;\n");

        for import in &self.imports {
            out.push_str(&format!("use {import};\n"));
        }
        out.push('\n');
    }

    fn generate_by_rule(&self, out: &mut String, rule: &Rule) -> Result<()> {
        let resolver = self.resolver()?;
        let fields = resolver.field_model(resolver.resolve_in(&self.module_name, &rule.entity_name));
        if fields.is_empty() {
            return Err(Error::MissingType(rule.entity_name.clone()));
        }

        let entity = Entity::new(&rule.entity_name, rule.use_list_suffix);

        if rule.base_gen {
            self.push(out, templates::render("collection", &minijinja::context! { entity })?);

            if let Some(id) = fields.get(FIELD_ID) {
                self.push(
                    out,
                    templates::render(
                        "field",
                        &MethodData {
                            entity: &entity,
                            field_type: &id.ty,
                            field_name: FIELD_ID,
                            func_name: &plural_method_name(FIELD_ID),
                        },
                    )?,
                );
                self.push(
                    out,
                    templates::render(
                        "index",
                        &MethodData {
                            entity: &entity,
                            field_type: &id.ty,
                            field_name: FIELD_ID,
                            func_name: "index",
                        },
                    )?,
                );
            }
        }

        for cr in &rule.custom_rules {
            self.gen_custom(out, &entity, rule, cr, &fields)?;
        }

        Ok(())
    }

    fn gen_custom(
        &self,
        out: &mut String,
        entity: &Entity,
        rule: &Rule,
        cr: &CustomRule,
        fields: &FieldModel,
    ) -> Result<()> {
        if is_map_rule(&cr.kind) {
            let rendered = self.gen_map(entity, cr, rule.base_gen)?;
            self.push(out, rendered);
            return Ok(());
        }

        let field_name = field_ident(&cr.field);
        let Some(field) = fields.get(&field_name) else {
            return Err(Error::MissingField(cr.field.clone()));
        };

        let rendered = match cr.kind.as_str() {
            CUSTOM_RULE_UNIQUE => {
                let func_name = format!("unique_{}", plural_method_name(&cr.field));
                match vec_elem(&field.ty) {
                    // Vec-typed field: flatten all element sequences
                    Some(elem) => templates::render(
                        "unique_flat",
                        &MethodData {
                            entity,
                            field_type: elem,
                            field_name: &field_name,
                            func_name: &func_name,
                        },
                    )?,
                    None => templates::render(
                        "unique",
                        &MethodData {
                            entity,
                            field_type: &field.ty,
                            field_name: &field_name,
                            func_name: &func_name,
                        },
                    )?,
                }
            }
            CUSTOM_RULE_INDEX => templates::render(
                "index",
                &MethodData {
                    entity,
                    field_type: &field.ty,
                    field_name: &field_name,
                    func_name: &format!("index_by_{field_name}"),
                },
            )?,
            _ => templates::render(
                "field",
                &MethodData {
                    entity,
                    field_type: &field.ty,
                    field_name: &field_name,
                    func_name: &plural_method_name(&cr.field),
                },
            )?,
        };

        self.push(out, rendered);
        Ok(())
    }

    // Converter: delegates per-element construction to an external
    // `new_<entity>` and the external `map`/`map_p` helper. Lowercase
    // declared casing drops `pub`.
    fn gen_map(&self, entity: &Entity, cr: &CustomRule, has_type: bool) -> Result<String> {
        let is_lower = cr.kind.starts_with(|c: char| c.is_lowercase());

        let mut input = cr.arg.clone();
        if !input.contains('.') && !input.contains("::") {
            input = format!("{input}.{}", entity.name);
        }

        let helper_name = if cr.kind.eq_ignore_ascii_case("mapp") {
            "map_p"
        } else {
            "map"
        };
        let helper = if self.func_pkg.is_empty() {
            helper_name.to_string()
        } else {
            format!("{}::{helper_name}", self.func_pkg)
        };

        let (return_type, wrap) = if has_type {
            (entity.list.clone(), true)
        } else {
            (format!("Vec<{}>", entity.name), false)
        };

        templates::render(
            "map",
            &MapData {
                entity,
                vis: if is_lower { "" } else { "pub " },
                func_name: format!("new_{}", entity.list_snake()),
                input_type: input.replace('.', "::"),
                return_type,
                helper,
                ctor: format!("new_{}", field_ident(&entity.name)),
                wrap,
            },
        )
    }

    fn push(&self, out: &mut String, block: String) {
        out.push_str(&block);
        out.push('\n');
    }
}

// `Vec<T>` display types mark sequence fields; returns the element type.
fn vec_elem(ty: &str) -> Option<&str> {
    ty.strip_prefix("Vec<")?.strip_suffix(">")
}
