// Scripted provider for unit tests
//
// Replays a fixed queue of completions (or failures) and records every
// request it was sent.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::types::{Completion, ProviderRequest, ProviderResponse};
use super::LlmProvider;

pub(crate) type Script = Vec<std::result::Result<Completion, String>>;

pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<std::result::Result<Completion, String>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded requests, usable after the provider is boxed
    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<ProviderRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        match next {
            Ok(completion) => Ok(ProviderResponse {
                completion,
                model: "scripted-model".to_string(),
                stop_reason: Some("end_turn".to_string()),
                provider: "scripted".to_string(),
            }),
            Err(reason) => Err(anyhow!(reason)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}
