use serde::{Deserialize, Serialize};

/// A container image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
  pub name: String,
  pub tag: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pull_policy: Option<String>,
}

impl Image {
  pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      tag: tag.into(),
      pull_policy: None,
    }
  }

  /// Full image reference in `name:tag` form.
  pub fn reference(&self) -> String {
    format!("{}:{}", self.name, self.tag)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reference_joins_name_and_tag() {
    let image = Image::new("nginx", "latest");
    assert_eq!(image.reference(), "nginx:latest");
  }

  #[test]
  fn pull_policy_omitted_when_unset() {
    let image = Image::new("nginx", "1.25");
    let json = serde_json::to_value(&image).unwrap();
    assert!(json.get("pullPolicy").is_none());
  }
}
