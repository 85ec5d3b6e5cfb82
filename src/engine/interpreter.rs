//! Depth-first interpreter for compiled queues
//!
//! Runs actions strictly in order, repeats loop bodies with interval
//! compensation, and gates conditional bodies on their trigger. Cancellation
//! is checked before every node, after every loop body and during interval
//! waits; an action already in flight always runs to completion.

use std::sync::Arc;

use chrono::Local;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::Instant;

use crate::action::Action;
use crate::queue::{LoopSpec, Node};
use crate::trigger::{Trigger, TriggerOutcome};

use super::cancel::CancelToken;
use super::pacing;
use super::report::{Counters, RunStats};

/// Executes compiled queue nodes
pub struct Interpreter {
    cancel: CancelToken,
    counters: Arc<Counters>,
}

impl Interpreter {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }

    /// Run `nodes` in order at the given nesting depth
    pub fn run<'a>(&'a self, nodes: &'a [Node], depth: usize) -> BoxFuture<'a, ()> {
        async move {
            for node in nodes {
                if self.cancel.is_cancelled() {
                    break;
                }
                match node {
                    Node::Action { label, operation } => {
                        self.run_action(label, &**operation, depth).await;
                    }
                    Node::Loop { spec, body } => self.run_loop(spec, body, depth).await,
                    Node::Conditional { trigger, body } => {
                        self.run_conditional(trigger, body, depth).await;
                    }
                }
            }
        }
        .boxed()
    }

    async fn run_action(&self, label: &str, operation: &dyn Action, depth: usize) {
        tracing::info!(
            depth,
            label,
            "Executing: {}, start time: {}",
            label,
            Local::now().format("%a %H:%M:%S")
        );
        self.counters.action_run();
        if let Err(e) = operation.run().await {
            self.counters.action_failed();
            tracing::error!(depth, label, error = %e, "Action failed, continuing with next item");
        }
    }

    async fn run_loop(&self, spec: &LoopSpec, body: &[Node], depth: usize) {
        let inner = depth + 1;

        for iteration in 1..=spec.count {
            let started = Instant::now();
            tracing::debug!(depth, iteration, count = spec.count, "Loop iteration");

            self.run(body, inner).await;
            if self.cancel.is_cancelled() {
                break;
            }

            if let Some(trigger) = &spec.trigger {
                if self.check(trigger, inner).await {
                    tracing::info!(depth, iteration, "Loop trigger met, leaving loop early");
                    break;
                }
            }

            let elapsed = started.elapsed();
            match pacing::remaining(spec.interval, elapsed) {
                Some(wait) => {
                    tracing::info!(
                        depth = inner,
                        wait_ms = wait.as_millis() as u64,
                        "Waiting {:.2} seconds for nested loop interval",
                        wait.as_secs_f64()
                    );
                    if !self.cancel.sleep(wait).await {
                        break;
                    }
                }
                None if pacing::overran(spec.interval, elapsed) => {
                    self.counters.overrun();
                    tracing::warn!(
                        depth = inner,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Not waiting, this nested loop took {:.2} seconds",
                        elapsed.as_secs_f64()
                    );
                }
                None => {}
            }
        }
    }

    async fn run_conditional(&self, trigger: &Trigger, body: &[Node], depth: usize) {
        if self.check(trigger, depth).await {
            self.run(body, depth + 1).await;
        } else {
            tracing::debug!(depth, trigger = %trigger, "Condition not met, skipping body");
        }
    }

    async fn check(&self, trigger: &Trigger, depth: usize) -> bool {
        let outcome = trigger.evaluate(depth).await;
        match outcome {
            TriggerOutcome::Met(_) => self.counters.trigger_met(),
            TriggerOutcome::Failed(_) => self.counters.trigger_failed(),
            TriggerOutcome::NotMet(_) => {}
        }
        outcome.is_met()
    }
}
