//! Struct introspection over a source directory
//!
//! [`TypeResolver`] stands in for compiler-grade type information: it parses
//! every `.rs` file under a root directory with `syn` and indexes the struct
//! definitions it finds by module path. The generator asks it for a flat
//! [`FieldModel`] per entity; the replacement engine resolves qualified
//! references like `db.User` by module-path suffix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quote::ToTokens;

use crate::error::{Error, Result};

/// One resolved struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityField {
    pub name: String,
    /// Display type: path collapsed to at most its last two segments.
    /// This is what generated signatures use.
    pub ty: String,
    /// Type exactly as written in the source.
    pub full_ty: String,
    pub is_pub: bool,
}

/// Flat name => type mapping for an entity, with flatten-marked fields
/// recursively expanded in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FieldModel {
    fields: Vec<EntityField>,
}

impl FieldModel {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up the display type for a field name. Duplicate names resolve
    /// to the last occurrence (final-write-wins).
    pub fn get(&self, name: &str) -> Option<&EntityField> {
        self.fields.iter().rev().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityField> {
        self.fields.iter()
    }
}

// Structs per module, keyed by struct name.
type ModuleStructs = BTreeMap<String, syn::ItemStruct>;

/// Parsed source-tree index. Built once per run and threaded as a
/// collaborator handle, never global state.
pub struct TypeResolver {
    // module path segments (relative to the root) => structs
    modules: BTreeMap<Vec<String>, ModuleStructs>,
}

impl TypeResolver {
    /// Parses all `.rs` files under `root`. A file that fails to parse
    /// aborts the run, naming the file.
    pub fn load(root: &Path) -> Result<TypeResolver> {
        let mut files = Vec::new();
        collect_rs_files(root, &mut files)?;
        files.sort();

        let mut modules: BTreeMap<Vec<String>, ModuleStructs> = BTreeMap::new();
        for file in files {
            let content = fs::read_to_string(&file)?;
            let ast = syn::parse_file(&content)
                .map_err(|e| Error::Other(format!("parse {}: {e}", file.display())))?;

            let path = module_path(root, &file);
            index_items(&ast.items, &path, &mut modules);
        }

        Ok(TypeResolver { modules })
    }

    /// Resolves a struct by bare name, searching all modules in
    /// deterministic order.
    pub fn resolve(&self, name: &str) -> Option<&syn::ItemStruct> {
        self.modules.values().find_map(|m| m.get(name))
    }

    /// Resolves a struct by bare name, preferring the module named `module`.
    /// Entities live next to their directives, so the annotated module wins
    /// over same-named structs elsewhere in the tree.
    pub fn resolve_in(&self, module: &str, name: &str) -> Option<&syn::ItemStruct> {
        self.modules
            .iter()
            .filter(|(path, _)| path.last().is_some_and(|p| p == module))
            .find_map(|(_, m)| m.get(name))
            .or_else(|| self.resolve(name))
    }

    /// Resolves a `pkg.Type` (or `pkg::Type`) reference by module-path
    /// suffix match on the qualifier.
    pub fn resolve_qualified(&self, reference: &str) -> Option<&syn::ItemStruct> {
        let norm = reference.replace("::", ".");
        let mut parts: Vec<&str> = norm.split('.').collect();
        let name = parts.pop()?;
        if parts.is_empty() {
            return self.resolve(name);
        }

        self.modules
            .iter()
            .filter(|(path, _)| path.ends_with(&parts.iter().map(|s| s.to_string()).collect::<Vec<_>>()))
            .find_map(|(_, m)| m.get(name))
    }

    /// Builds the flat field model for a struct, recursing into
    /// flatten-marked fields. `None` from the lookup yields an empty model,
    /// which callers treat as a fatal missing-type condition.
    pub fn field_model(&self, item: Option<&syn::ItemStruct>) -> FieldModel {
        let mut model = FieldModel::default();
        if let Some(item) = item {
            self.fill_fields(item, 0, &mut model);
        }
        model
    }

    fn fill_fields(&self, item: &syn::ItemStruct, depth: usize, model: &mut FieldModel) {
        // guard against flatten cycles
        if depth > 8 {
            return;
        }

        let syn::Fields::Named(named) = &item.fields else {
            return;
        };

        for field in &named.named {
            let Some(ident) = &field.ident else { continue };

            if is_flatten(&field.attrs) {
                if let Some(inner) = self.resolve_field_type(&field.ty) {
                    self.fill_fields(inner, depth + 1, model);
                    continue;
                }
                // unresolvable flatten target degrades to a plain field
            }

            let full_ty = render_type(&field.ty);
            model.fields.push(EntityField {
                name: ident.to_string(),
                ty: display_type(&field.ty),
                full_ty,
                is_pub: matches!(field.vis, syn::Visibility::Public(_)),
            });
        }
    }

    // Resolves a field's type to a struct definition, trying the qualified
    // form first when the path has more than one segment.
    fn resolve_field_type(&self, ty: &syn::Type) -> Option<&syn::ItemStruct> {
        let syn::Type::Path(tp) = ty else { return None };
        let segments: Vec<String> = tp.path.segments.iter().map(|s| s.ident.to_string()).collect();
        if segments.len() > 1 {
            self.resolve_qualified(&segments.join("::"))
        } else {
            self.resolve(segments.last()?)
        }
    }
}

// Recursively lists `.rs` files under `dir`.
fn collect_rs_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }

    Ok(())
}

// Derives module path segments from a file path relative to the root.
// `mod.rs`, `lib.rs` and `main.rs` take their parent directory's path.
fn module_path(root: &Path, file: &Path) -> Vec<String> {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let mut parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if let Some(last) = parts.pop() {
        let stem = last.trim_end_matches(".rs");
        if !matches!(stem, "mod" | "lib" | "main") {
            parts.push(stem.to_string());
        }
    }

    parts
}

// Indexes top-level and inline-module structs.
fn index_items(
    items: &[syn::Item],
    path: &[String],
    modules: &mut BTreeMap<Vec<String>, ModuleStructs>,
) {
    for item in items {
        match item {
            syn::Item::Struct(s) => {
                modules
                    .entry(path.to_vec())
                    .or_default()
                    .insert(s.ident.to_string(), s.clone());
            }
            syn::Item::Mod(m) => {
                if let Some((_, inner)) = &m.content {
                    let mut sub = path.to_vec();
                    sub.push(m.ident.to_string());
                    index_items(inner, &sub, modules);
                }
            }
            _ => {}
        }
    }
}

// True for `#[serde(flatten)]` or `#[colgen(flatten)]`, the embedded-field
// markers this tool understands.
fn is_flatten(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        let path = attr.path();
        if !(path.is_ident("serde") || path.is_ident("colgen")) {
            return false;
        }

        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("flatten") {
                found = true;
            }
            // skip `name = value` arguments so later markers still parse
            if let Ok(value) = meta.value() {
                let _: syn::Expr = value.parse()?;
            }
            Ok(())
        });
        found
    })
}

/// Renders a type exactly as written, with token spacing normalized away.
pub fn render_type(ty: &syn::Type) -> String {
    compact(&ty.to_token_stream().to_string())
}

/// Renders the display form of a type: a bare path keeps at most its last
/// two segments (`crate::db::User` => `db::User`), everything else is kept
/// as written.
pub fn display_type(ty: &syn::Type) -> String {
    if let syn::Type::Path(tp) = ty {
        if tp.qself.is_none() && tp.path.segments.len() > 2 {
            let kept: Vec<String> = tp
                .path
                .segments
                .iter()
                .rev()
                .take(2)
                .map(|s| compact(&s.to_token_stream().to_string()))
                .collect();
            return kept.into_iter().rev().collect::<Vec<_>>().join("::");
        }
    }

    render_type(ty)
}

// Collapses the whitespace `TokenStream` printing inserts between tokens,
// keeping the spaces Rust syntax needs (`&'a str`, `[u8; 4]`).
fn compact(s: &str) -> String {
    s.replace(" :: ", "::")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace("> ", ">")
        .replace(" , ", ", ")
        .replace(" ,", ",")
        .replace("& ", "&")
        .replace("( ", "(")
        .replace(" )", ")")
        .replace(" ;", ";")
}
