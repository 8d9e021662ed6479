use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template references unknown placeholder {{{name}}} (available: {available})")]
    MissingPlaceholder { name: String, available: String },
    #[error("malformed template at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}

/// Substitutes `{name}` placeholders with values from `fields`.
///
/// `{{` and `}}` produce literal braces. Any placeholder absent from `fields`
/// is an error rather than being left in place.
pub fn fill(template: &str, fields: &IndexMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0usize;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let at = offset + pos;

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            offset = at + 2;
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            offset = at + 2;
            rest = after;
            continue;
        }
        if tail.starts_with('}') {
            return Err(TemplateError::Malformed {
                offset: at,
                reason: "single '}' (use '}}' for a literal brace)",
            });
        }

        let Some(close) = tail.find('}') else {
            return Err(TemplateError::Malformed {
                offset: at,
                reason: "unclosed '{'",
            });
        };
        let name = tail[1..close].trim();
        if !is_placeholder_name(name) {
            return Err(TemplateError::Malformed {
                offset: at,
                reason: "placeholder name must be [A-Za-z_][A-Za-z0-9_]*",
            });
        }

        let Some(value) = fields.get(name) else {
            return Err(TemplateError::MissingPlaceholder {
                name: name.to_owned(),
                available: fields.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        };
        out.push_str(value);

        offset = at + close + 1;
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Placeholder names referenced by `template`, in order of first use.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{") {
            rest = after;
            continue;
        }
        let Some(close) = tail.find('}') else {
            break;
        };
        let name = tail[1..close].trim();
        if is_placeholder_name(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
        rest = &tail[close + 1..];
    }

    names
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
