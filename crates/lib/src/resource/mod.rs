//! Resource types describing what the agent manages.
//!
//! An [`Application`] describes everything needed to translate a workload to
//! a container management system: image, port mappings, instance count and
//! an optional logging configuration.

mod application;
mod image;
mod log_config;
mod port;

pub use application::Application;
pub use image::Image;
pub use log_config::{FLUENTD_LOG_DRIVER, LogConfig};
pub use port::{Port, Protocol};
