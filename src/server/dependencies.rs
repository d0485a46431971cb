// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Dependency graph consumed by the database server

use std::sync::Arc;

use super::actions::ActionsProvider;
use crate::monitoring::LogSink;

/// Collaborators the server does not create itself.
///
/// The actions slot may be left empty by callers; construction strategies
/// fill it with their edition's default before building the server.
#[derive(Clone, Default)]
pub struct Dependencies {
    pub log_sink: LogSink,
    pub actions_provider: Option<Arc<dyn ActionsProvider>>,
}

impl Dependencies {
    pub fn new(log_sink: LogSink) -> Self {
        Self {
            log_sink,
            actions_provider: None,
        }
    }

    pub fn with_actions_provider(mut self, provider: Arc<dyn ActionsProvider>) -> Self {
        self.actions_provider = Some(provider);
        self
    }

    /// Fill the actions slot unless an override is already present
    pub fn with_default_actions_provider(
        mut self,
        default: impl FnOnce() -> Arc<dyn ActionsProvider>,
    ) -> Self {
        if self.actions_provider.is_none() {
            self.actions_provider = Some(default());
        }
        self
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("log_sink", &self.log_sink)
            .field("actions_provider", &self.actions_provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::actions::{CommunityActionsProvider, EnterpriseActionsProvider};

    #[test]
    fn test_default_does_not_replace_override() {
        let override_provider: Arc<dyn ActionsProvider> = Arc::new(EnterpriseActionsProvider);
        let deps = Dependencies::default()
            .with_actions_provider(override_provider.clone())
            .with_default_actions_provider(|| Arc::new(CommunityActionsProvider));

        let provider = deps.actions_provider.unwrap();
        assert!(Arc::ptr_eq(&provider, &override_provider));
    }

    #[test]
    fn test_default_fills_empty_slot() {
        let deps = Dependencies::new(LogSink::null())
            .with_default_actions_provider(|| Arc::new(CommunityActionsProvider));
        assert!(deps.actions_provider.is_some());
    }
}
