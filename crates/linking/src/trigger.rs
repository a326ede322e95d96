use std::rc::Rc;
use std::time::Duration;

use runtime::{Task, TaskScheduler, run_or_schedule};
use serde::Serialize;

use crate::config::LinkConfig;
use crate::deep_link::{DeepLink, intent_url};
use crate::intent::LinkIntent;
use crate::platform::Platform;

/// Browser navigation primitives used to hand a URL to the native app.
///
/// None of these report success: a browser gives no reliable signal that a
/// custom scheme was handled.
pub trait Navigator {
    /// Point an invisible frame at `url`.
    fn open_hidden_frame(&self, url: &str);
    /// Top-level navigation to `url`.
    fn navigate(&self, url: &str);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMethod {
    HiddenFrame,
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerStep {
    pub label: &'static str,
    pub delay_ms: u64,
    pub method: TriggerMethod,
    pub url: String,
}

impl TriggerStep {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// The ordered, best-effort techniques for one deep-link attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerPlan {
    pub deep_link: DeepLink,
    pub steps: Vec<TriggerStep>,
}

impl TriggerPlan {
    pub fn build(
        intent: &LinkIntent,
        platform: Platform,
        page_url: &str,
        config: &LinkConfig,
    ) -> Self {
        let deep_link = DeepLink::build(intent, config);

        let mut steps = vec![
            TriggerStep {
                label: "deeplink.frame",
                delay_ms: 0,
                method: TriggerMethod::HiddenFrame,
                url: deep_link.as_str().to_string(),
            },
            TriggerStep {
                label: "deeplink.redirect",
                delay_ms: config.redirect_delay_ms,
                method: TriggerMethod::Redirect,
                url: deep_link.as_str().to_string(),
            },
        ];

        if platform.supports_intent_urls() {
            steps.push(TriggerStep {
                label: "deeplink.intent",
                delay_ms: config.intent_delay_ms,
                method: TriggerMethod::Redirect,
                url: intent_url(&deep_link, page_url, config),
            });
        }

        Self { deep_link, steps }
    }
}

/// Fire every step of `plan`. Zero-delay steps run before this returns.
///
/// Nothing is awaited or cancelled; calling this again (the manual retry)
/// simply fires a fresh sequence.
pub fn attempt_deep_link(
    plan: &TriggerPlan,
    navigator: Rc<dyn Navigator>,
    scheduler: &dyn TaskScheduler,
) {
    tracing::info!(url = plan.deep_link.as_str(), "attempting deep link");

    for step in &plan.steps {
        let navigator = navigator.clone();
        let method = step.method;
        let url = step.url.clone();
        let task = Task::new(step.label, step.delay(), move || match method {
            TriggerMethod::HiddenFrame => navigator.open_hidden_frame(&url),
            TriggerMethod::Redirect => navigator.navigate(&url),
        });
        run_or_schedule(scheduler, task);
    }
}
