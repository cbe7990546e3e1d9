use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::ports::{OracleError, RelevanceOracle};

/// Scriptable oracle for tests and local runs without an API key.
///
/// Each keyword answers from its script queue first, then from its fixed answer, then from
/// the default (`"false"`, or the configured failure).
pub struct MockRelevanceOracle {
    answers: HashMap<String, String>,
    scripts: Mutex<HashMap<String, VecDeque<Result<String, OracleError>>>>,
    fallback: Result<String, OracleError>,
    latency: Duration,
    configured: bool,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockRelevanceOracle {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            scripts: Mutex::new(HashMap::new()),
            fallback: Ok("false".to_string()),
            latency: Duration::ZERO,
            configured: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(error: OracleError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::new()
        }
    }

    pub fn with_answer(mut self, keyword: &str, answer: &str) -> Self {
        self.answers.insert(keyword.to_string(), answer.to_string());
        self
    }

    /// Queues responses returned, in order, before the keyword's regular answer.
    pub fn with_script(self, keyword: &str, responses: Vec<Result<String, OracleError>>) -> Self {
        lock(&self.scripts)
            .entry(keyword.to_string())
            .or_default()
            .extend(responses);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, keyword: &str) -> usize {
        lock(&self.calls).iter().filter(|(k, _)| k == keyword).count()
    }

    pub fn call_times(&self, keyword: &str) -> Vec<Instant> {
        lock(&self.calls)
            .iter()
            .filter(|(k, _)| k == keyword)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Keywords in the order their first call was made.
    pub fn call_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for (keyword, _) in lock(&self.calls).iter() {
            if !order.contains(keyword) {
                order.push(keyword.clone());
            }
        }
        order
    }
}

impl Default for MockRelevanceOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelevanceOracle for MockRelevanceOracle {
    async fn ask(&self, keyword: &str, _topic: &str) -> Result<String, OracleError> {
        lock(&self.calls).push((keyword.to_string(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = lock(&self.scripts)
            .get_mut(keyword)
            .and_then(|queue| queue.pop_front());
        if let Some(response) = scripted {
            return response;
        }

        match self.answers.get(keyword) {
            Some(answer) => Ok(answer.clone()),
            None => self.fallback.clone(),
        }
    }

    fn preflight(&self) -> Result<(), OracleError> {
        if self.configured {
            Ok(())
        } else {
            Err(OracleError::NotConfigured("mock oracle disabled".to_string()))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
