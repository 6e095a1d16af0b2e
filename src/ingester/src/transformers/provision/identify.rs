use std::sync::Arc;

use async_trait::async_trait;
use common::types::Settings;
use identity::generator;
use identity::identities;
use identity::identities::CreateIdentityRequest;
use identity::identities::Lookup;
use identity::identities::Provider;
use serde_json::Value;
use tracing::info;
use tracing::warn;

use crate::error::IngesterError;
use crate::error::Result;
use crate::event::Identify;
use crate::transformer::Transformer;
use crate::transformers::provision::Scope;

/// Source-stage identify transform: make sure the identity service knows
/// this user, creating the record when it does not. The event itself is
/// forwarded unchanged; the user id is rewritten later, at the destination
/// stage.
pub struct Provision {
    provider: Arc<dyn Provider>,
    scope: Scope,
}

impl Provision {
    pub fn new(provider: Arc<dyn Provider>, scope: Scope) -> Self {
        Self { provider, scope }
    }

    fn lookup_endpoint(&self, settings: &Settings, event: &Identify) -> String {
        match self.scope {
            Scope::Brand => identities::brand_endpoint(
                &settings.api_host,
                &settings.brand,
                &event.user_id,
            ),
            Scope::Canonical => {
                identities::canonical_endpoint(&settings.api_host, &event.user_id)
            }
        }
    }

    fn create_request(&self, settings: &Settings, event: &Identify) -> Option<CreateIdentityRequest> {
        match self.scope {
            Scope::Brand => {
                let email = event.traits.as_ref()?.get("email")?.as_str()?;
                Some(CreateIdentityRequest::brand(
                    &settings.brand,
                    &event.user_id,
                    &generator::generate_user_id(email),
                ))
            }
            Scope::Canonical => Some(CreateIdentityRequest::canonical(&event.user_id)),
        }
    }
}

#[async_trait]
impl Transformer<Identify> for Provision {
    async fn process(&self, settings: &Settings, event: Identify) -> Result<Identify> {
        let token = settings.timeshift_api_bearer_token.as_str();
        let endpoint = self.lookup_endpoint(settings, &event);

        match self.provider.lookup(token, &endpoint).await? {
            Lookup::Found(_) => {}
            Lookup::Unavailable(status) => {
                return Err(IngesterError::Retry(format!(
                    "identity lookup failed with {status}"
                )));
            }
            Lookup::NotFound => {
                // best effort: the record continues downstream whether or
                // not the write landed
                if let Some(request) = self.create_request(settings, &event) {
                    let create = identities::create_endpoint(&settings.api_host);
                    match self.provider.create(token, &create, &request).await {
                        Ok(status) => {
                            info!("posted identity for {} ({status})", event.user_id);
                        }
                        Err(err) => {
                            warn!("identity create failed for {}: {err}", event.user_id);
                        }
                    }
                } else {
                    warn!(
                        "identity not found for {} and no email trait to derive one from",
                        event.user_id
                    );
                }
            }
        }

        Ok(event)
    }
}
