//! Translation of call-style actions into rhai expressions.
//!
//! Stored scenarios use the `Name arg1 arg2` call form, e.g.
//! `{{RandIntMinMax 1 10}}` or `{{VariableContains "status" .expected}}`.
//! Such actions are rewritten to `Name(arg1, arg2)`; a `.dotted.path`
//! argument becomes a `FindVariable` lookup. Anything that is not in call
//! form is handed to rhai unchanged.

/// Rewrite `action` into a rhai expression.
pub fn to_expression(action: &str) -> String {
    let action = action.trim();
    call_form(action).unwrap_or_else(|| action.to_string())
}

fn call_form(action: &str) -> Option<String> {
    if action.starts_with('.') && !action.contains(char::is_whitespace) {
        return Some(data_ref(action));
    }

    let name_len = action
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(action.len());
    let name = &action[..name_len];
    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }

    let rest = &action[name_len..];
    if rest.is_empty() {
        return Some(format!("{name}()"));
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut args = Vec::new();
    let mut rest = rest.trim_start();
    while !rest.is_empty() {
        let (arg, tail) = next_arg(rest)?;
        args.push(arg);
        rest = tail.trim_start();
    }
    Some(format!("{name}({})", args.join(", ")))
}

fn next_arg(s: &str) -> Option<(String, &str)> {
    match s.chars().next()? {
        '"' => {
            let end = closing_quote(s)?;
            Some((requote(&s[1..end]), &s[end + 1..]))
        }
        '`' => {
            let end = s[1..].find('`')? + 1;
            Some((quote(&s[1..end]), &s[end + 1..]))
        }
        '(' => {
            let end = matching_paren(s)?;
            Some((format!("({})", to_expression(&s[1..end])), &s[end + 1..]))
        }
        _ => {
            let end = s
                .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                .unwrap_or(s.len());
            let token = &s[..end];
            let arg = if token.starts_with('.') {
                data_ref(token)
            } else if token == "true" || token == "false" || token.parse::<f64>().is_ok() {
                token.to_string()
            } else if token.starts_with(|c: char| c.is_ascii_uppercase())
                && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                format!("{token}()")
            } else {
                return None;
            };
            Some((arg, &s[end..]))
        }
    }
}

/// `.` is the whole data context, `.a.b` a path into it.
fn data_ref(token: &str) -> String {
    match token.strip_prefix('.') {
        Some("") | None => "Data()".to_string(),
        Some(path) => format!("FindVariable({})", quote(path)),
    }
}

/// Double-quoted rhai string literal for `raw`.
pub(crate) fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Re-quote the body of a double-quoted argument. Standard escapes are
/// kept; any other backslash is taken literally, so `"2\d"` stays a regex.
fn requote(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    out.push('"');
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(e @ ('\\' | '"' | 'n' | 'r' | 't')) => {
                out.push('\\');
                out.push(e);
            }
            Some(other) => {
                out.push_str(r"\\");
                out.push(other);
            }
            None => out.push_str(r"\\"),
        }
    }
    out.push('"');
    out
}

/// Byte index of the quote closing the string that opens at 0.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(i);
        }
    }
    None
}

/// Byte index of the `)` matching the `(` at 0, skipping quoted text.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < s.len() {
        let c = s[i..].chars().next()?;
        match c {
            '"' => i += closing_quote(&s[i..])?,
            '`' => i += s[i + 1..].find('`')? + 1,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += c.len_utf8();
    }
    None
}
