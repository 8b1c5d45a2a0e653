//! Job registry.

use std::sync::Arc;

use cadence_runloop::JobDescriptor;
use dashmap::DashMap;

use crate::error::SupervisorError;
use crate::settings::Settings;

/// Thread-safe table of registered job descriptors keyed by name.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<String, Arc<JobDescriptor>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Names are unique.
    pub fn register(&self, descriptor: JobDescriptor) -> Result<(), SupervisorError> {
        let name = descriptor.name().to_string();
        if self.jobs.contains_key(&name) {
            return Err(SupervisorError::AlreadyRegistered(name));
        }
        self.jobs.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Look up a descriptor, failing with `NotFound` for unknown names.
    pub fn lookup(&self, name: &str) -> Result<Arc<JobDescriptor>, SupervisorError> {
        self.get(name)
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<JobDescriptor>> {
        self.jobs.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Compiled-in enabled flag of every registered job.
    pub fn default_settings(&self) -> Settings {
        self.jobs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().default_enabled()))
            .collect()
    }
}
