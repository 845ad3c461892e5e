//! Controller registry and model catalog.
//!
//! # Responsibilities
//! - Map controller names to factories, populated once at startup
//! - Know which data models exist and their type category
//! - Resolve a controller name through the fallback chain
//!
//! # Design Decisions
//! - Keys are dasherized, so `OrderItem`, `order_item` and `order-item`
//!   reach the same factory
//! - A model without a dedicated controller uses the controller registered
//!   for its type category (`data` unless configured otherwise)
//! - Anything else gets the base controller, whose default action renders
//!   a view

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::mvc::controller::Controller;
use crate::mvc::naming::dasherize;

/// Type category used for models that declare none.
pub const DEFAULT_MODEL_TYPE: &str = "data";

pub type ControllerFactory = Arc<dyn Fn() -> Controller + Send + Sync>;

/// How a controller name was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A factory registered under the controller's own name.
    Named(String),
    /// A factory registered under the model's type category.
    ModelType(String),
    /// The base controller.
    Base,
}

#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_list().entries(names).finish()
    }
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Controller + Send + Sync + 'static,
    {
        let key = dasherize(name);
        if self.factories.insert(key.clone(), Arc::new(factory)).is_some() {
            tracing::warn!(controller = %key, "Controller registered twice; last one wins");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&dasherize(name))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the controller for `name`.
    pub fn resolve(&self, name: &str, models: &ModelCatalog) -> (Resolution, Controller) {
        let key = dasherize(name);
        if let Some(factory) = self.factories.get(&key) {
            return (Resolution::Named(key), factory());
        }

        if let Some(model_type) = models.type_of(name) {
            let type_key = dasherize(model_type);
            if let Some(factory) = self.factories.get(&type_key) {
                return (Resolution::ModelType(type_key), factory());
            }
        }

        (Resolution::Base, Controller::new())
    }
}

/// A model known to the external data layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_type: String,
}

/// Case-insensitive catalog of configured models.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelInfo>,
}

impl ModelCatalog {
    pub fn from_config(models: &[ModelConfig]) -> Self {
        let models = models
            .iter()
            .map(|m| {
                let info = ModelInfo {
                    name: m.name.clone(),
                    model_type: m
                        .model_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MODEL_TYPE.to_string()),
                };
                (m.name.to_lowercase(), info)
            })
            .collect();
        Self { models }
    }

    pub fn get(&self, name: &str) -> Option<&ModelInfo> {
        self.models.get(&name.to_lowercase())
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|m| m.model_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
