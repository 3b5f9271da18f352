use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::config::NotifierConfig;

/// Platform push capability consulted before each push send.
#[async_trait]
pub trait PushGateway: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Tries to make push usable for `user_email`; returns whether it now is.
    async fn initialize(&self, user_email: &str) -> bool;
}

/// Push gateway driven by the `GRADEGOAL_PUSH_*` settings.
#[derive(Debug)]
pub struct ConfiguredPushGateway {
    enabled: AtomicBool,
    auto_enable: bool,
}

impl ConfiguredPushGateway {
    pub fn new(enabled: bool, auto_enable: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            auto_enable,
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(config.push_enabled, config.push_auto_enable)
    }
}

#[async_trait]
impl PushGateway for ConfiguredPushGateway {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    async fn initialize(&self, user_email: &str) -> bool {
        if !self.auto_enable {
            tracing::info!(user_email, "push auto-enable is off");
            return false;
        }
        self.enabled.store(true, Ordering::Release);
        tracing::info!(user_email, "push enabled");
        true
    }
}
