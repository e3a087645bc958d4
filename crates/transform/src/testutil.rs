//! Shared test fixtures for the transform crate

use std::collections::BTreeMap;

use crate::expander::TargetCatalog;

/// In-memory catalog of declared services and targets
#[derive(Debug, Default)]
pub(crate) struct MapCatalog {
    services: BTreeMap<String, Vec<String>>,
}

impl MapCatalog {
    pub(crate) fn new(entries: &[(&str, &[&str])]) -> Self {
        let mut services = BTreeMap::new();
        for (service, targets) in entries {
            services.insert(
                (*service).to_string(),
                targets.iter().map(|t| (*t).to_string()).collect(),
            );
        }
        Self { services }
    }
}

impl TargetCatalog for MapCatalog {
    fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    fn has_target(&self, service: &str, target: &str) -> bool {
        self.services
            .get(service)
            .is_some_and(|targets| targets.iter().any(|t| t == target))
    }

    fn service_targets(&self, service: &str) -> Vec<String> {
        self.services.get(service).cloned().unwrap_or_default()
    }

    fn all_addresses(&self) -> Vec<String> {
        self.services
            .iter()
            .flat_map(|(service, targets)| {
                targets.iter().map(move |t| format!("{service}:{t}"))
            })
            .collect()
    }
}
