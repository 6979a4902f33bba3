//! Profile inspection.

use serde::Serialize;

use crate::context::AppContext;
use crate::profile::ProfileStore;
use crate::types::EndpointKind;

/// Endpoint metadata safe to display. Material is reduced to flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub kind: EndpointKind,
    pub host: String,
    pub skip_tls_verify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub has_tls: bool,
    pub has_token: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub endpoints: Vec<EndpointSummary>,
}

/// Profile command orchestrator
#[derive(Debug)]
pub struct ProfileCommand {
    app: AppContext,
}

impl ProfileCommand {
    pub fn new(app: AppContext) -> Self {
        Self { app }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Describe the stored profile `name` without its credential material.
    pub fn show(&self, name: &str) -> anyhow::Result<ProfileSummary> {
        let profile = self.app.profile_store().lookup(name)?;

        let endpoints = profile
            .endpoints
            .iter()
            .map(|(kind, endpoint)| {
                let material = endpoint.material.as_ref();
                EndpointSummary {
                    kind: *kind,
                    host: endpoint.host.clone(),
                    skip_tls_verify: endpoint.skip_tls_verify,
                    namespace: endpoint.namespace.clone(),
                    has_tls: material
                        .and_then(|m| m.tls.as_ref())
                        .is_some_and(|tls| !tls.is_empty()),
                    has_token: material.is_some_and(|m| m.token.is_some()),
                }
            })
            .collect();

        Ok(ProfileSummary {
            name: profile.name,
            description: profile.description,
            endpoints,
        })
    }
}
