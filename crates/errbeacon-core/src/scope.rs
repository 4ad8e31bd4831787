//! Capture scope
//!
//! A [`ScopeContext`] accumulates trail state between captures: a bounded
//! breadcrumb ring, named context blocks and (when PII delivery is allowed)
//! the acting user's identity. Reports carry an immutable [`ScopeSnapshot`]
//! taken at capture time, so later mutations never leak into an
//! already-captured report.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DeliveryConfig;
use crate::severity::Severity;

/// One entry in the activity trail attached to reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Breadcrumb {
    pub fn new(level: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Breadcrumb {
            timestamp: Utc::now(),
            level,
            category: category.into(),
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }
}

/// Identity of the acting user. Only attached to reports when the delivery
/// configuration allows personally identifiable data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Mutable per-session trail state.
#[derive(Debug)]
pub struct ScopeContext {
    max_breadcrumbs: usize,
    pii_enabled: bool,
    breadcrumbs: VecDeque<Breadcrumb>,
    contexts: BTreeMap<String, Map<String, Value>>,
    user: Option<UserIdentity>,
}

impl ScopeContext {
    pub fn new(max_breadcrumbs: usize, pii_enabled: bool) -> Self {
        ScopeContext {
            max_breadcrumbs,
            pii_enabled,
            breadcrumbs: VecDeque::new(),
            contexts: BTreeMap::new(),
            user: None,
        }
    }

    /// Builds a scope sized and gated per the delivery configuration.
    pub fn for_config(config: &DeliveryConfig) -> Self {
        ScopeContext::new(config.breadcrumb_limit(), config.send_default_pii)
    }

    /// Appends a breadcrumb, evicting the oldest one when the ring is full.
    pub fn add_breadcrumb(&mut self, crumb: Breadcrumb) {
        if self.max_breadcrumbs == 0 {
            return;
        }
        if self.breadcrumbs.len() == self.max_breadcrumbs {
            self.breadcrumbs.pop_front();
        }
        self.breadcrumbs.push_back(crumb);
    }

    /// Sets a named context block. Setting the same name again replaces the
    /// previous block.
    pub fn set_context(&mut self, name: impl Into<String>, data: Map<String, Value>) {
        self.contexts.insert(name.into(), data);
    }

    /// Records the acting user. Ignored when PII delivery is disabled, so
    /// identity can never reach a snapshot by accident.
    pub fn set_identity(&mut self, user: UserIdentity) {
        if self.pii_enabled {
            self.user = Some(user);
        }
    }

    pub fn pii_enabled(&self) -> bool {
        self.pii_enabled
    }

    /// Immutable copy of the current trail state for attachment to a report.
    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            breadcrumbs: self.breadcrumbs.iter().cloned().collect(),
            contexts: self.contexts.clone(),
            user: self.user.clone(),
        }
    }
}

/// Frozen scope state captured alongside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScopeSnapshot {
    pub breadcrumbs: Vec<Breadcrumb>,
    pub contexts: BTreeMap<String, Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}
