use async_trait::async_trait;
use testlink_runner_core::event::{
    EventBus,
    RunEvent,
};

/// Writes every run event to the log
pub struct TracingEventBus;

#[async_trait]
impl EventBus for TracingEventBus {
    async fn emit(&self, event: RunEvent) {
        match &event {
            RunEvent::StepFailed { .. } | RunEvent::TestCaseBlocked { .. } => {
                tracing::warn!(
                    event = event.event_name(),
                    payload = %event.to_json_payload(),
                    "Run event"
                );
            }
            _ => {
                tracing::info!(
                    event = event.event_name(),
                    payload = %event.to_json_payload(),
                    "Run event"
                );
            }
        }
    }
}
