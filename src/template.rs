//! `${field}` label templates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^{}]*)\}").unwrap());

/// Replace every `${field}` in `template` with the matching field of `object`.
///
/// Fields missing from the object (or a non-object) become the empty string.
pub fn render(template: &str, object: &Value) -> String {
  PLACEHOLDER
    .replace_all(template, |caps: &Captures| {
      object
        .get(&caps[1])
        .map(display_value)
        .unwrap_or_default()
    })
    .into_owned()
}

/// Text of a JSON value as it appears inside a label.
fn display_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Label used when a schema declares no template.
///
/// A single id like `config/Table/Orders` yields its last component
/// (`Orders`); several ids are joined with `/`.
pub fn default_label<S: AsRef<str>>(ids: &[S]) -> String {
  match ids {
    [single] => {
      let key = single.as_ref();
      key.rsplit('/').next().unwrap_or(key).to_string()
    }
    _ => ids
      .iter()
      .map(AsRef::as_ref)
      .collect::<Vec<_>>()
      .join("/"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_render_substitutes_fields() {
    let object = json!({"name": "Widget A", "id": 7});
    assert_eq!(render("${name} (${id})", &object), "Widget A (7)");
  }

  #[test]
  fn test_render_missing_field_is_empty() {
    let object = json!({"name": "Widget A"});
    assert_eq!(render("${name}: ${missing}", &object), "Widget A: ");
    assert_eq!(render("${name}", &json!("not an object")), "");
  }

  #[test]
  fn test_render_non_string_values() {
    let object = json!({"flag": true, "none": null, "tags": ["a", "b"]});
    assert_eq!(
      render("${flag} ${none} ${tags}", &object),
      r#"true null ["a","b"]"#
    );
  }

  #[test]
  fn test_render_without_placeholders() {
    assert_eq!(render("plain", &json!({})), "plain");
    assert_eq!(render("${a{b}", &json!({"a{b": 1})), "${a{b}");
  }

  #[test]
  fn test_default_label_single_slash_id() {
    assert_eq!(default_label(&["config/Table/Orders"]), "Orders");
  }

  #[test]
  fn test_default_label_single_plain_id() {
    assert_eq!(default_label(&["42"]), "42");
  }

  #[test]
  fn test_default_label_multiple_ids() {
    assert_eq!(default_label(&["x", "y"]), "x/y");
    assert_eq!(default_label::<&str>(&[]), "");
  }
}
