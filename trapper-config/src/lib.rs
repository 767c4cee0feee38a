//! Configuration for the trapper command line sender.
//!
//! The configuration is read from a YAML file and can be adjusted with overrides from command
//! line arguments or `TRAPPER_*` environment variables:
//!
//! ```
//! use trapper_config::{Config, OverridableConfig};
//!
//! let mut config = Config::from_yaml_str("sender: {server_address: zabbix.example.com}").unwrap();
//! config
//!     .apply_override(OverridableConfig {
//!         port: Some("10052".to_owned()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let registry = config.registry().unwrap();
//! assert_eq!(registry.default_instance().config().server_port, 10052);
//! ```

#![warn(missing_docs)]

mod config;

pub use self::config::*;
