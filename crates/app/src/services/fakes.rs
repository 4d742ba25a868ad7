//! In-memory port fakes shared by the service tests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::TimeDelta;
use modhub_domain::error::ModHubError;
use modhub_domain::module::ModuleRegistration;
use modhub_domain::proxy::{ProxyHeaders, ProxyResponse, UpstreamRequest};
use modhub_domain::time::{Clock, Timestamp};

use crate::ports::{ForwardError, ModuleForwarder, ModuleRegistrationStore, Upserted};

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<ModuleRegistration>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, registration: ModuleRegistration) {
        self.records.lock().unwrap().push(registration);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), ModHubError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ModHubError::Storage("disk I/O error".into()));
        }
        Ok(())
    }

    fn filter(
        &self,
        predicate: impl Fn(&ModuleRegistration) -> bool,
    ) -> Result<Vec<ModuleRegistration>, ModHubError> {
        self.check()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| predicate(r)).cloned().collect())
    }
}

impl ModuleRegistrationStore for InMemoryStore {
    fn upsert(
        &self,
        registration: ModuleRegistration,
    ) -> impl Future<Output = Result<Upserted, ModHubError>> + Send {
        let result = self.check().map(|()| {
            let mut records = self.records.lock().unwrap();
            if let Some(existing) = records
                .iter_mut()
                .find(|r| r.is_keyed_by(&registration.module_id, &registration.home_id))
            {
                existing.refresh_from(&registration);
                Upserted::Updated(existing.clone())
            } else {
                records.push(registration.clone());
                Upserted::Created(registration)
            }
        });
        async { result }
    }

    fn touch_heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        let result = self.check().map(|()| {
            let mut records = self.records.lock().unwrap();
            records
                .iter_mut()
                .find(|r| r.is_keyed_by(module_id, home_id))
                .map(|r| {
                    r.record_heartbeat(at);
                    r.clone()
                })
        });
        async { result }
    }

    fn find(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        let result = self
            .filter(|r| r.is_keyed_by(module_id, home_id))
            .map(|found| found.into_iter().next());
        async { result }
    }

    fn find_by_module_id(
        &self,
        module_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let result = self.filter(|r| r.module_id == module_id);
        async { result }
    }

    fn find_by_home(
        &self,
        home_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let result = self.filter(|r| r.home_id == home_id);
        async { result }
    }

    fn find_by_type(
        &self,
        module_type: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let result = self.filter(|r| r.module_type == module_type);
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let result = self.filter(|_| true);
        async { result }
    }

    fn delete(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<bool, ModHubError>> + Send {
        let result = self.check().map(|()| {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| !r.is_keyed_by(module_id, home_id));
            records.len() != before
        });
        async { result }
    }
}

/// Manually advanced clock.
#[derive(Clone)]
pub struct FakeClock(Arc<Mutex<Timestamp>>);

impl FakeClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(modhub_domain::time::now())))
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

pub enum Reply {
    Respond(ProxyResponse),
    Unreachable,
    Fail,
}

/// Forwarder that records every request and answers with a canned reply.
pub struct RecordingForwarder {
    pub calls: Mutex<Vec<UpstreamRequest>>,
    reply: Mutex<Reply>,
}

impl RecordingForwarder {
    pub fn replying(reply: Reply) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(reply),
        }
    }

    pub fn ok(status: u16, body: &str) -> Self {
        let mut headers = ProxyHeaders::new();
        headers.append("Content-Type", "application/json");
        headers.append("Transfer-Encoding", "chunked");
        Self::replying(Reply::Respond(ProxyResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> UpstreamRequest {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl ModuleForwarder for RecordingForwarder {
    fn forward(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<ProxyResponse, ForwardError>> + Send {
        self.calls.lock().unwrap().push(request);
        let result = match &*self.reply.lock().unwrap() {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Unreachable => Err(ForwardError::Unreachable("connection refused".into())),
            Reply::Fail => Err(ForwardError::Other("malformed response".into())),
        };
        async { result }
    }
}
