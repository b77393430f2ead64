//! The read-only environment of one synthesis request.

use kea_types::{DataTypeRegistry, Name, Type};

/// What the host knows about the surrounding module. Built once per request
/// and shared by every branch of the search.
#[derive(Debug, Clone, Default)]
pub struct Context {
    defining_funcs: Vec<(Name, Type)>,
    module_funcs: Vec<(Name, Type)>,
    data_types: DataTypeRegistry,
}

impl Context {
    pub fn new(
        defining_funcs: Vec<(Name, Type)>,
        module_funcs: Vec<(Name, Type)>,
        data_types: DataTypeRegistry,
    ) -> Self {
        Self {
            defining_funcs,
            module_funcs,
            data_types,
        }
    }

    /// The functions whose bodies are being synthesized. Calls to these are
    /// recursive and go through the termination guard.
    pub fn defining_funcs(&self) -> &[(Name, Type)] {
        &self.defining_funcs
    }

    pub fn module_funcs(&self) -> &[(Name, Type)] {
        &self.module_funcs
    }

    pub fn data_types(&self) -> &DataTypeRegistry {
        &self.data_types
    }

    pub fn defining_func(&self, name: &Name) -> Option<&Type> {
        self.defining_funcs
            .iter()
            .find(|(defined, _)| defined == name)
            .map(|(_, ty)| ty)
    }

    pub fn is_defining(&self, name: &Name) -> bool {
        self.defining_func(name).is_some()
    }

    /// Module functions, excluding those being defined, as bindings for a
    /// root judgment's ambient hypothesis.
    pub fn ambient_hypothesis(&self) -> Vec<(Name, Type)> {
        self.module_funcs
            .iter()
            .filter(|(name, _)| !self.is_defining(name))
            .cloned()
            .collect()
    }
}
