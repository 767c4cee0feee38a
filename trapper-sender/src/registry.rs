use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Sender, SenderConfig};

/// Name of the instance used when no name is given.
pub const DEFAULT_INSTANCE: &str = "default";

/// A set of named, shared [`Sender`] instances.
///
/// Instances are created on first access, either from a configuration registered for their name
/// or from the template configuration. Every caller asking for the same name receives the same
/// instance.
///
/// ```
/// use trapper_sender::{SenderConfig, SenderOptions, SenderRegistry};
///
/// let registry = SenderRegistry::new(SenderConfig::new("zabbix.example.com"));
///
/// let backup = registry.instance("backup");
/// backup.configure(SenderOptions::new().server_address("backup.example.com"));
///
/// assert_eq!(registry.instance("backup").config().server_address, "backup.example.com");
/// assert_eq!(registry.default_instance().config().server_address, "zabbix.example.com");
/// ```
#[derive(Debug)]
pub struct SenderRegistry {
    template: SenderConfig,
    configs: HashMap<String, SenderConfig>,
    instances: Mutex<HashMap<String, Arc<Sender>>>,
}

impl SenderRegistry {
    /// Creates an empty registry.
    pub fn new(template: SenderConfig) -> Self {
        Self {
            template,
            configs: HashMap::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the configuration used when the instance `name` is first created.
    ///
    /// Instances that already exist are not changed.
    pub fn with_config(mut self, name: impl Into<String>, config: SenderConfig) -> Self {
        self.configs.insert(name.into(), config);
        self
    }

    /// Returns the instance `name`, creating it if necessary.
    pub fn instance(&self, name: &str) -> Arc<Sender> {
        let mut instances = self.instances.lock();

        if let Some(sender) = instances.get(name) {
            return sender.clone();
        }

        let config = self.configs.get(name).unwrap_or(&self.template).clone();
        trapper_log::debug!("creating sender instance {name}");

        let sender = Arc::new(Sender::from_config(config));
        instances.insert(name.to_owned(), sender.clone());
        sender
    }

    /// Returns the instance named [`DEFAULT_INSTANCE`].
    pub fn default_instance(&self) -> Arc<Sender> {
        self.instance(DEFAULT_INSTANCE)
    }

    /// Returns the instance `name` if it has been created.
    pub fn get(&self, name: &str) -> Option<Arc<Sender>> {
        self.instances.lock().get(name).cloned()
    }

    /// Forgets the instance `name`.
    ///
    /// Holders of the instance may continue to use it. The next [`instance`](Self::instance) call
    /// creates a fresh one.
    pub fn remove(&self, name: &str) -> Option<Arc<Sender>> {
        self.instances.lock().remove(name)
    }

    /// Returns the names of all created instances in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.instances.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::new(SenderConfig::default())
    }
}
