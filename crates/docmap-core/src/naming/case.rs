/// camelCase or PascalCase to snake_case.
///
/// An underscore goes before every uppercase character except the first, and
/// everything is lowercased, so `HTTPServer` becomes `h_t_t_p_server`.
#[must_use]
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// snake_case to lowerCamelCase, or UpperCamelCase when `upper_first`.
/// Reverses [`camel_to_snake`] for lowercase snake names.
#[must_use]
pub fn snake_to_camel(name: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = upper_first;

    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

///
/// TESTS
///
