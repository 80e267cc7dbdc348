use serde::{Deserialize, Serialize};

/// Transport protocol for a published port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
  #[default]
  Tcp,
  Udp,
}

impl Protocol {
  pub fn as_str(&self) -> &'static str {
    match self {
      Protocol::Tcp => "tcp",
      Protocol::Udp => "udp",
    }
  }
}

/// A container-to-host port mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
  pub container_port: u16,
  pub host_port: u16,
  pub protocol: Protocol,
}
