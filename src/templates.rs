//! Template-based code emission
//!
//! All generated method bodies and injection blocks are MiniJinja templates
//! embedded into the binary. The environment is built once per process.

use std::sync::OnceLock;

use minijinja::Environment;
use serde::Serialize;

use crate::error::Result;

// Embedded templates (compiled into binary)
mod embedded {
    pub const COLLECTION: &str = include_str!("../templates/collection.jinja");
    pub const FIELD: &str = include_str!("../templates/field.jinja");
    pub const INDEX: &str = include_str!("../templates/index.jinja");
    pub const UNIQUE: &str = include_str!("../templates/unique.jinja");
    pub const UNIQUE_FLAT: &str = include_str!("../templates/unique_flat.jinja");
    pub const MAP: &str = include_str!("../templates/map.jinja");
    pub const REPLACE: &str = include_str!("../templates/replace.jinja");
}

/// Template engine singleton
static ENGINE: OnceLock<Environment<'static>> = OnceLock::new();

fn init_engine() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in [
        ("collection", embedded::COLLECTION),
        ("field", embedded::FIELD),
        ("index", embedded::INDEX),
        ("unique", embedded::UNIQUE),
        ("unique_flat", embedded::UNIQUE_FLAT),
        ("map", embedded::MAP),
        ("replace", embedded::REPLACE),
    ] {
        env.add_template(name, source)
            .unwrap_or_else(|e| panic!("failed to load template {name}: {e}"));
    }

    env
}

/// Get the global template engine
pub fn engine() -> &'static Environment<'static> {
    ENGINE.get_or_init(init_engine)
}

/// Renders one embedded template with the given context.
pub fn render<S: Serialize>(name: &str, ctx: &S) -> Result<String> {
    let tmpl = engine().get_template(name)?;
    Ok(tmpl.render(ctx)?)
}
