//! English pluralization and class-name → snake_case conversion used to
//! derive default table names and default pivot-table names. Covers
//! irregular forms explicitly (`company → companies`, `person → people`)
//! plus the common regular-plural suffixes a model layer actually
//! encounters.

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "series", "species", "fish", "sheep", "data"];

/// Pluralizes a singular, lower-case English noun.
#[must_use]
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return plural.to_string();
    }

    if let Some(stem) = lower.strip_suffix("y") {
        if !ends_with_vowel_before_y(&lower) {
            return format!("{stem}ies");
        }
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{lower}es");
    }
    if let Some(stem) = lower.strip_suffix("fe") {
        return format!("{stem}ves");
    }
    if let Some(stem) = lower.strip_suffix('f') {
        return format!("{stem}ves");
    }
    format!("{lower}s")
}

fn ends_with_vowel_before_y(word: &str) -> bool {
    word.len() >= 2
        && matches!(
            word.as_bytes()[word.len() - 2],
            b'a' | b'e' | b'i' | b'o' | b'u'
        )
}

/// Reverses [`pluralize`] for the common suffix rules, used to derive a
/// singular stem for default pivot-table naming: `pivot name ==
/// sorted(singular(T1), singular(T2)).join("_")`.
#[must_use]
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == lower) {
        return singular.to_string();
    }
    if let Some(stem) = lower.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = lower.strip_suffix("ves") {
        return format!("{stem}fe");
    }
    for suffix in ["ches", "shes", "xes", "zes", "ses"] {
        if let Some(stem) = lower.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if let Some(stem) = lower.strip_suffix('s') {
        return stem.to_string();
    }
    lower
}

/// Converts an identifier like `UserProfile` or `userProfile` into
/// `user_profile`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Default table name for a model class: pluralize the snake-cased class
/// name.
#[must_use]
pub fn table_name_for(class_name: &str) -> String {
    pluralize(&snake_case(class_name))
}

/// Default pivot-table name for a `BelongsToMany` relationship between two
/// tables: `sorted(singular(T1), singular(T2)).join("_")`.
#[must_use]
pub fn default_pivot_table(table_a: &str, table_b: &str) -> String {
    let mut names = [singularize(table_a), singularize(table_b)];
    names.sort();
    names.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_regular_and_irregular_nouns() {
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("leaf"), "leaves");
    }

    #[test]
    fn converts_class_names_to_snake_case() {
        assert_eq!(snake_case("UserProfile"), "user_profile");
        assert_eq!(snake_case("HTTPClient"), "h_t_t_p_client");
        assert_eq!(snake_case("user"), "user");
    }

    #[test]
    fn derives_default_table_name() {
        assert_eq!(table_name_for("UserProfile"), "user_profiles");
        assert_eq!(table_name_for("Company"), "companies");
    }

    #[test]
    fn pivot_table_name_is_sorted_singular_join() {
        assert_eq!(default_pivot_table("roles", "users"), "role_user");
        assert_eq!(default_pivot_table("users", "roles"), "role_user");
    }
}
