use std::sync::Arc;

use serde::Serialize;

use crate::error::HookError;

/// Callback installed on an intercepted method: raw text in, text to hand back out.
pub type Interceptor = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Replacement produced for the original text once every transform attempt failed.
pub type RecoveryFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Capability offered by the attachment layer that reaches into the host process.
pub trait InterceptorRegistry {
    fn register_interceptor(&mut self, name: &str, interceptor: Interceptor)
    -> Result<(), HookError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookReport {
    pub method: String,
    pub success: bool,
    pub error: Option<String>,
}

impl HookReport {
    pub fn attached(method: &str) -> Self {
        Self {
            method: method.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(method: &str, error: &HookError) -> Self {
        Self {
            method: method.to_string(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}
