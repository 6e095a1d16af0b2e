use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use common::types::Settings;
use identity::error::IdentityError;
use identity::identities::CreateIdentityRequest;
use identity::identities::Identity;
use identity::identities::Lookup;
use identity::identities::Provider;
use identity::identities::StatusCode;
use serde_json::Value;

pub fn settings() -> Settings {
    Settings {
        api_host: "https://api.example.com".to_string(),
        brand: "pilatesAnytime".to_string(),
        timeshift_api_bearer_token: "test-token".to_string(),
    }
}

pub fn identity(brand: &str, local_id: &str, timeshift: Option<&str>) -> Identity {
    Identity {
        timeshift: timeshift.map(str::to_string),
        brands: [(brand.to_string(), Value::String(local_id.to_string()))]
            .into_iter()
            .collect(),
    }
}

/// Identity service stub scripted with one response per expected lookup.
pub struct StubProvider {
    lookups: Mutex<VecDeque<identity::Result<Lookup>>>,
    lookup_calls: AtomicUsize,
    created: Mutex<Vec<(String, CreateIdentityRequest)>>,
    fail_create: AtomicBool,
}

impl StubProvider {
    pub fn new(lookups: Vec<identity::Result<Lookup>>) -> Self {
        Self {
            lookups: Mutex::new(lookups.into()),
            lookup_calls: AtomicUsize::new(0),
            created: Mutex::new(vec![]),
            fail_create: AtomicBool::new(false),
        }
    }

    pub fn failing_create(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<(String, CreateIdentityRequest)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn lookup(&self, _token: &str, _endpoint: &str) -> identity::Result<Lookup> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.lookups
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(IdentityError::Internal(
                    "no scripted lookup response".to_string(),
                ))
            })
    }

    async fn create(
        &self,
        _token: &str,
        endpoint: &str,
        req: &CreateIdentityRequest,
    ) -> identity::Result<StatusCode> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(IdentityError::Internal("create unavailable".to_string()));
        }
        self.created
            .lock()
            .unwrap()
            .push((endpoint.to_string(), req.clone()));
        Ok(StatusCode::CREATED)
    }
}
