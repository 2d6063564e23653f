//! Composing a client with plugins.
//!
//! A plugin is any value produced by a factory function that receives the
//! `Client` it is attached to. `CoreBuilder` accumulates factories, and
//! `Core` instantiates each one once and keeps the results for typed lookup.

use std::any::Any;
use std::sync::Arc;

use crate::client::Client;
use crate::config::RequestConfig;

/// A plugin instance. Retrieved by concrete type with `Core::plugin`.
pub type Plugin = Arc<dyn Any + Send + Sync>;

/// Builds a plugin for the given client.
pub type PluginFactory = fn(&Client) -> Plugin;

/// Plugin list to instantiate into a `Core`.
#[derive(Clone, Default)]
pub struct CoreBuilder {
    factories: Vec<PluginFactory>,
}

impl CoreBuilder {
    /// Append `plugins`, skipping factories already registered. Returns a new
    /// builder; `self` is unchanged.
    pub fn with_plugins(&self, plugins: impl IntoIterator<Item = PluginFactory>) -> Self {
        let mut factories = self.factories.clone();
        for plugin in plugins {
            if !factories.iter().any(|f| *f as usize == plugin as usize) {
                factories.push(plugin);
            }
        }
        Self { factories }
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate every plugin against a client derived from `client` with
    /// `config` merged into its defaults.
    pub fn build(&self, client: &Client, config: RequestConfig) -> Core {
        let request = client.create(config);
        let plugins = self.factories.iter().map(|factory| factory(&request)).collect();
        Core { request, plugins }
    }
}

/// A client plus the plugins assembled for it.
pub struct Core {
    request: Client,
    plugins: Vec<Plugin>,
}

impl Core {
    pub fn builder() -> CoreBuilder {
        CoreBuilder::default()
    }

    /// A core with no plugins over the default client.
    pub fn new(config: RequestConfig) -> Self {
        Self::builder().build(&Client::new(), config)
    }

    pub fn request(&self) -> &Client {
        &self.request
    }

    /// The first plugin of type `T`.
    pub fn plugin<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.plugins.iter().find_map(|p| p.downcast_ref::<T>())
    }

    pub fn plugins(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }
}
