//! Formatter registry: ids to formatter factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::object::{DefaultObjectFormatter, ObjectFormatter};
use super::property::{AccountNumberFormatter, DefaultPropertyFormatter, PropertyFormatter};

/// Creates a fresh whole-object formatter for one `to_string` call.
pub type ObjectFormatterFactory = Arc<dyn Fn() -> Box<dyn ObjectFormatter> + Send + Sync>;

/// Creates the property formatter shared by one type's operations.
pub type PropertyFormatterFactory = Arc<dyn Fn() -> Arc<dyn PropertyFormatter> + Send + Sync>;

/// FormatterRegistry maps formatter ids to factories.
///
/// A new registry carries the built-in `default` object and property
/// formatters and the `account-number` property formatter.
#[derive(Clone)]
pub struct FormatterRegistry {
    objects: HashMap<String, ObjectFormatterFactory>,
    properties: HashMap<String, PropertyFormatterFactory>,
}

impl FormatterRegistry {
    pub const DEFAULT: &'static str = "default";

    pub fn new() -> Self {
        let mut registry = FormatterRegistry {
            objects: HashMap::new(),
            properties: HashMap::new(),
        };
        registry.register_object(Self::DEFAULT, || Box::new(DefaultObjectFormatter::new()));
        registry.register_property(Self::DEFAULT, || Arc::new(DefaultPropertyFormatter));
        registry.register_property(AccountNumberFormatter::ID, || Arc::new(AccountNumberFormatter));
        registry
    }

    /// Registers an object formatter factory, replacing any with the same id.
    pub fn register_object<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn ObjectFormatter> + Send + Sync + 'static,
    {
        self.objects.insert(id.into(), Arc::new(factory));
        self
    }

    /// Registers a property formatter factory, replacing any with the same id.
    pub fn register_property<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn PropertyFormatter> + Send + Sync + 'static,
    {
        self.properties.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn object_factory(&self, id: &str) -> Option<ObjectFormatterFactory> {
        self.objects.get(id).cloned()
    }

    pub fn property_formatter(&self, id: &str) -> Option<Arc<dyn PropertyFormatter>> {
        self.properties.get(id).map(|factory| factory())
    }

    pub fn default_object_factory(&self) -> ObjectFormatterFactory {
        self.object_factory(Self::DEFAULT)
            .unwrap_or_else(|| {
                Arc::new(|| -> Box<dyn ObjectFormatter> { Box::new(DefaultObjectFormatter::new()) })
            })
    }

    pub fn default_property_formatter(&self) -> Arc<dyn PropertyFormatter> {
        self.property_formatter(Self::DEFAULT)
            .unwrap_or_else(|| Arc::new(DefaultPropertyFormatter))
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        FormatterRegistry::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut objects: Vec<&String> = self.objects.keys().collect();
        let mut properties: Vec<&String> = self.properties.keys().collect();
        objects.sort();
        properties.sort();
        f.debug_struct("FormatterRegistry")
            .field("objects", &objects)
            .field("properties", &properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = FormatterRegistry::new();
        assert!(registry.object_factory("default").is_some());
        assert!(registry.property_formatter("default").is_some());
        assert!(registry.property_formatter("account-number").is_some());
        assert!(registry.object_factory("account-number").is_none());
        assert!(registry.property_formatter("missing").is_none());
    }
}
