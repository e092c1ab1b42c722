//! Template rendering for manifest fields
//!
//! Manifest strings may reference the package's own fields with Go-style
//! actions such as `{{.Version}}`. Rendering never touches the filesystem and
//! never mutates the context, so a field can be rendered any number of times.

use crate::error::{HammerError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("action pattern compiles"));

static FIELD_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*)$").expect("field reference pattern compiles")
});

/// Read-only view of the values a template may reference
pub trait TemplateContext {
    /// Look up a field by name, or `None` if no such field exists
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Render `input` against `context`.
///
/// `label` names the field being rendered and appears in error messages.
pub fn render<C>(label: &str, input: &str, context: &C) -> Result<String>
where
    C: TemplateContext + ?Sized,
{
    let mut rendered = String::with_capacity(input.len());
    let mut last = 0;

    for cap in ACTION.captures_iter(input) {
        let Some(whole) = cap.get(0) else { continue };
        push_literal(label, &input[last..whole.start()], &mut rendered)?;

        let action = cap.get(1).map_or("", |m| m.as_str()).trim();
        rendered.push_str(&evaluate(label, action, context)?);
        last = whole.end();
    }
    push_literal(label, &input[last..], &mut rendered)?;

    Ok(rendered)
}

fn push_literal(label: &str, literal: &str, rendered: &mut String) -> Result<()> {
    if literal.contains("{{") {
        return Err(HammerError::template(label, "unclosed action"));
    }
    rendered.push_str(literal);
    Ok(())
}

fn evaluate<'a, C>(label: &str, action: &str, context: &'a C) -> Result<Cow<'a, str>>
where
    C: TemplateContext + ?Sized,
{
    if action.is_empty() {
        return Err(HammerError::template(label, "missing value for command"));
    }

    if action.starts_with("/*") && action.ends_with("*/") {
        return Ok(Cow::Borrowed(""));
    }

    let Some(name) = FIELD_REF.captures(action).and_then(|c| c.get(1)) else {
        return Err(HammerError::template(
            label,
            format!("unsupported action `{action}`"),
        ));
    };

    context.field(name.as_str()).ok_or_else(|| {
        HammerError::template(label, format!("can't evaluate field {}", name.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fields(HashMap<&'static str, &'static str>);

    impl TemplateContext for Fields {
        fn field(&self, name: &str) -> Option<Cow<'_, str>> {
            self.0.get(name).map(|v| Cow::Borrowed(*v))
        }
    }

    fn fields() -> Fields {
        Fields(HashMap::from([
            ("Name", "foo"),
            ("Version", "1.0"),
            ("Description", "{{.Name}}"),
        ]))
    }

    #[test]
    fn test_render_plain_string() {
        assert_eq!(render("name", "foo", &fields()).unwrap(), "foo");
        assert_eq!(render("name", "", &fields()).unwrap(), "");
    }

    #[test]
    fn test_render_field_references() {
        let out = render("url", "https://x/{{.Name}}-{{ .Version }}.tgz", &fields()).unwrap();
        assert_eq!(out, "https://x/foo-1.0.tgz");
    }

    #[test]
    fn test_substituted_values_are_not_rendered_again() {
        let out = render("desc", "{{.Description}}", &fields()).unwrap();
        assert_eq!(out, "{{.Name}}");
    }

    #[test]
    fn test_comment_renders_empty() {
        let out = render("x", "a{{/* note */}}b", &fields()).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_unclosed_action_is_an_error() {
        let err = render("version", "{{.Version", &fields()).unwrap_err();
        assert!(matches!(err, HammerError::Template { ref field, .. } if field == "version"));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = render("name", "{{.Missing}}", &fields()).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_unsupported_and_empty_actions() {
        assert!(render("x", "{{ }}", &fields()).is_err());
        assert!(render("x", "{{ printf \"%s\" .Name }}", &fields()).is_err());
    }

    #[test]
    fn test_render_is_idempotent() {
        let ctx = fields();
        let input = "{{.Name}}-{{.Version}}";
        let first = render("x", input, &ctx).unwrap();
        let second = render("x", input, &ctx).unwrap();
        assert_eq!(first, second);
    }
}
