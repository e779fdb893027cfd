//! AdapterRegistry — register, look up by name, enable/disable.

use std::collections::HashSet;

use super::ToolAdapter;

/// Registry of all adapters with enable/disable.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn ToolAdapter>>,
    disabled: HashSet<String>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            disabled: HashSet::new(),
        }
    }

    /// Register an adapter.
    pub fn register(&mut self, adapter: Box<dyn ToolAdapter>) {
        self.adapters.push(adapter);
    }

    /// Disable a specific adapter by tool name.
    pub fn disable(&mut self, name: &str) {
        self.disabled.insert(name.to_string());
    }

    /// Enable a previously disabled adapter.
    pub fn enable(&mut self, name: &str) {
        self.disabled.remove(name);
    }

    /// Look up an enabled adapter by name.
    pub fn get(&self, name: &str) -> Option<&dyn ToolAdapter> {
        if self.disabled.contains(name) {
            return None;
        }
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// All enabled adapters, in registration order.
    pub fn iter_enabled(&self) -> impl Iterator<Item = &dyn ToolAdapter> {
        self.adapters
            .iter()
            .filter(|a| !self.disabled.contains(a.name()))
            .map(|a| a.as_ref())
    }

    /// Total number of registered adapters.
    pub fn count(&self) -> usize {
        self.adapters.len()
    }

    /// Number of enabled adapters.
    pub fn enabled_count(&self) -> usize {
        self.iter_enabled().count()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every supported adapter.
pub fn create_default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();

    registry.register(Box::new(super::npm_audit::NpmAuditAdapter));
    registry.register(Box::new(super::osv_scanner::OsvScannerAdapter));
    registry.register(Box::new(super::pylint::PylintAdapter));
    registry.register(Box::new(super::mypy::MypyAdapter));
    registry.register(Box::new(super::eslint::EslintAdapter));
    registry.register(Box::new(super::cbmc::CbmcAdapter));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_six_adapters() {
        let registry = create_default_registry();
        assert_eq!(registry.count(), 6);
        assert_eq!(registry.enabled_count(), 6);
    }

    #[test]
    fn disable_hides_adapter() {
        let mut registry = create_default_registry();
        registry.disable("cbmc");
        assert!(registry.get("cbmc").is_none());
        assert_eq!(registry.enabled_count(), 5);
        registry.enable("cbmc");
        assert!(registry.get("cbmc").is_some());
    }
}
