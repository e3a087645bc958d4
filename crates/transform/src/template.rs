//! `{name}` placeholder interpolation
//!
//! The contract, fixed engine-wide: a placeholder whose key is missing from
//! the context renders as the literal placeholder text, never as an error.
//! [`render_strict`] exists for the opt-in `strict_format` mode, where a
//! missing key fails the render instead.
//!
//! `{{` and `}}` escape to literal braces. An unterminated `{...` is copied
//! through verbatim.

use courier_protocol::TransformContext;
use thiserror::Error;

/// Error from [`render_strict`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// One or more placeholder keys were absent from the context
    #[error("template references missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Render a template, substituting missing keys with their literal
/// placeholder
pub fn render(template: &str, context: &TransformContext) -> String {
    let mut missing = Vec::new();
    render_inner(template, context, &mut missing)
}

/// Render a template, failing when any placeholder key is missing
///
/// # Errors
///
/// Returns [`TemplateError::MissingKeys`] listing every absent key.
pub fn render_strict(template: &str, context: &TransformContext) -> Result<String, TemplateError> {
    let mut missing = Vec::new();
    let out = render_inner(template, context, &mut missing);
    if missing.is_empty() {
        Ok(out)
    } else {
        Err(TemplateError::MissingKeys(missing))
    }
}

fn render_inner(template: &str, context: &TransformContext, missing: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    out.push('{');
                    continue;
                }

                // Scan for the closing brace.
                let mut key_end = None;
                for (i, c) in chars.by_ref() {
                    if c == '}' {
                        key_end = Some(i);
                        break;
                    }
                }

                match key_end {
                    Some(end) => {
                        let key = &template[start + 1..end];
                        match context.get(key) {
                            Some(value) if !key.is_empty() => {
                                out.push_str(&TransformContext::render_value(value));
                            }
                            _ => {
                                missing.push(key.to_string());
                                out.push('{');
                                out.push_str(key);
                                out.push('}');
                            }
                        }
                    }
                    None => {
                        // Unterminated placeholder: copy the rest verbatim.
                        out.push_str(&template[start..]);
                        return out;
                    }
                }
            }
            '}' => {
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                }
                out.push('}');
            }
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
