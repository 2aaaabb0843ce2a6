//! String and placeholder helpers shared by the domain modules.

use std::collections::BTreeMap;

/// Lower-cased, trimmed email used for every lookup and cache key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Prefix of an organization code: the initials of the name's words, or the
/// first three characters of a single-word name, upper-cased, at most four
/// characters. Falls back to `ORG` when the name has no alphanumerics.
pub fn organization_code_prefix(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase())
        .collect();

    let prefix: String = match words.as_slice() {
        [] => return "ORG".to_string(),
        [single] => single.chars().take(3).collect(),
        many => many.iter().filter_map(|w| w.chars().next()).take(4).collect(),
    };
    prefix
}

/// `PREFIX-NNNNNN` from a name and a numeric suffix.
pub fn organization_code(name: &str, suffix: u32) -> String {
    format!("{}-{:06}", organization_code_prefix(name), suffix % 1_000_000)
}

/// URL slug: lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Replaces every `{{name}}` placeholder with its value. Unknown placeholders
/// are left untouched.
pub fn render_placeholders(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(&after[..end]);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes text for inclusion in an HTML body.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_prefix_from_initials() {
        assert_eq!(organization_code_prefix("Bali Trans Tour"), "BTT");
        assert_eq!(organization_code_prefix("pt. sinar jaya abadi raya"), "PSJA");
        assert_eq!(organization_code_prefix("Komodo"), "KOM");
        assert_eq!(organization_code_prefix("  !!  "), "ORG");
    }

    #[test]
    fn test_code_is_deterministic_for_suffix() {
        assert_eq!(organization_code("Bali Trans Tour", 42), "BTT-000042");
        assert_eq!(organization_code("Bali Trans Tour", 42), organization_code("Bali Trans Tour", 42));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello, World! 2026 "), "hello-world-2026");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_render_placeholders() {
        let mut values = BTreeMap::new();
        values.insert("username".to_string(), "alice".to_string());
        values.insert("code".to_string(), "12345678".to_string());
        let rendered = render_placeholders("Hi {{username}}, code {{ code }} {{missing}} {{", &values);
        assert_eq!(rendered, "Hi alice, code 12345678 {{missing}} {{");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
