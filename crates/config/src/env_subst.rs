//! `${ENV_VAR}` substitution in raw config text.

/// Replace `${ENV_VAR}` placeholders with the variable's value.
///
/// Unresolvable or malformed placeholders are left as-is.
pub fn substitute_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('}') {
            Some(end) if end > 0 => {
                let name = &tail[..end];
                match std::env::var(name) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &tail[end + 1..];
            },
            _ => {
                // Unclosed or empty placeholder: emit the opener literally
                // and keep scanning after it.
                out.push_str("${");
                rest = tail;
            },
        }
    }

    out.push_str(rest);
    out
}
