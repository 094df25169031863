//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_every_placeholder() {
    let out = fill_template("q={query} share={blank_share}", &[("query", "a"), ("blank_share", "b")]);
    assert_eq!(out, "q=a share=b");
  }

  #[test]
  fn truncation_is_char_safe() {
    assert_eq!(trunc_for_log("ngắn", 10), "ngắn");
    let long = trunc_for_log("Đức Chúa Trời yêu thương", 3);
    assert!(long.starts_with("Đức"));
    assert!(long.contains("bytes total"));
  }
}
