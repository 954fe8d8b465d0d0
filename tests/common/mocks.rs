use async_trait::async_trait;
use textgate::{
    backend::{AnalysisResult, BackendError, InferenceBackend},
    request::AnalysisRequest,
};
use std::sync::{Arc, Mutex};

/// Scripted backend for testing: fails a fixed number of times, then
/// returns its configured result. Records every request it receives.
#[derive(Debug, Clone)]
pub struct StubBackend {
    pub result: AnalysisResult,
    pub failures: Option<u32>,
    pub error: String,
    pub requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl StubBackend {
    pub fn returning(result: AnalysisResult) -> Self {
        Self {
            result,
            failures: Some(0),
            error: "stub failure".to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A backend whose every call fails with `error`.
    pub fn failing(error: &str) -> Self {
        Self {
            failures: None,
            error: error.to_string(),
            ..Self::returning(AnalysisResult::Reply(String::new()))
        }
    }

    pub fn with_failures(mut self, failures: u32) -> Self {
        self.failures = Some(failures);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() as u32
        };

        match self.failures {
            Some(failures) if call > failures => Ok(self.result.clone()),
            _ => Err(BackendError::remote(format!("{} #{}", self.error, call))),
        }
    }
}
