//! File scaffolding for `quarry migration <name>` and `quarry model <name>`.
//! Generates a starting point a developer edits by hand; it does not wire
//! the new file into any build-time migration registry.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn write_migration(directory: &str, name: &str) -> io::Result<()> {
    fs::create_dir_all(directory)?;
    let slug = to_snake_case(name);
    let file_name = format!("{}_{slug}.rs", timestamp_prefix());
    let path = Path::new(directory).join(file_name);
    let struct_name = to_pascal_case(&slug);
    fs::write(&path, migration_template(&struct_name, &slug))?;
    println!("created {}", path.display());
    Ok(())
}

pub(crate) fn write_model(directory: &str, name: &str) -> io::Result<()> {
    fs::create_dir_all(directory)?;
    let slug = to_snake_case(name);
    let struct_name = to_pascal_case(&slug);
    let path = Path::new(directory).join(format!("{slug}.rs"));
    fs::write(&path, model_template(&struct_name, &slug))?;
    println!("created {}", path.display());
    Ok(())
}

fn timestamp_prefix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn migration_template(struct_name: &str, slug: &str) -> String {
    format!(
        r#"use quarry_core::migration::{{Migration, Schema}};

pub struct {struct_name};

impl Migration for {struct_name} {{
    fn name(&self) -> &str {{
        "{slug}"
    }}

    fn up(&self, schema: &mut Schema<'_>) {{
        schema.create("{slug}", |bp| {{
            bp.increments("id");
            bp.timestamps();
        }});
    }}

    fn down(&self, schema: &mut Schema<'_>) {{
        schema.drop_table("{slug}");
    }}
}}
"#
    )
}

fn model_template(struct_name: &str, slug: &str) -> String {
    format!(
        r#"use std::sync::OnceLock;

use quarry_core::model::meta::{{ModelMeta, ModelMetaBuilder}};
use quarry_core::model::Model;

pub struct {struct_name};

impl Model for {struct_name} {{
    fn meta() -> &'static ModelMeta {{
        static META: OnceLock<ModelMeta> = OnceLock::new();
        META.get_or_init(|| ModelMetaBuilder::new("{slug}").build())
    }}

    fn model_name() -> &'static str {{
        "{struct_name}"
    }}
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_handles_pascal_and_kebab_input() {
        assert_eq!(to_snake_case("CreateUsers"), "create_users");
        assert_eq!(to_snake_case("create-users"), "create_users");
    }

    #[test]
    fn pascal_case_round_trips_snake_input() {
        assert_eq!(to_pascal_case("create_users"), "CreateUsers");
    }

    #[test]
    fn write_migration_creates_a_file_under_directory() {
        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("migrations");
        write_migration(directory.to_str().unwrap(), "CreateUsers").unwrap();
        let entries: Vec<_> = fs::read_dir(&directory).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
