use log::{debug, info, warn};
use std::time::Instant;

use super::{GraphExecutor, RunId, ValidationIssue};
use crate::error::ExecutionError;
use crate::events::StatusEvent;
use crate::graph::{ExecutionState, GraphModel};

/// What to do with an inbound status event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventVerdict {
    Apply,
    /// Belongs to the most recently finished run; applied but noted
    ApplyLate,
    Drop(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    CancelledRun,
    /// A run older than the latest one
    SupersededRun,
    /// Second completion for a run that already finished
    DuplicateCompletion,
    /// The node was removed from the graph while the event was in flight
    UnknownNode,
}

#[derive(Debug, Clone)]
struct InFlight {
    run_id: RunId,
    started: Instant,
}

/// Run bookkeeping for one graph: at most one run in flight, events
/// reconciled by run id.
///
/// The executor may keep working after `cancel`; cancelling only stops
/// this client from listening to the run.
#[derive(Debug, Default)]
pub struct ExecutionClient {
    current: Option<InFlight>,
    /// Most recently started run, whatever became of it
    latest: Option<RunId>,
    last_finished: Option<RunId>,
    /// `latest`, if it was cancelled
    cancelled: Option<RunId>,
}

impl ExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_run(&self) -> Option<&RunId> {
        self.current.as_ref().map(|r| &r.run_id)
    }

    pub fn last_finished(&self) -> Option<&RunId> {
        self.last_finished.as_ref()
    }

    /// Reset node states, serialize `model` and hand it to the executor.
    ///
    /// Rejected locally with [`ExecutionError::RunInFlight`] while another
    /// run is in flight. When the executor rejects the graph, node-level
    /// issues are written to the node states and the run ends at once.
    pub async fn run(
        &mut self,
        executor: &dyn GraphExecutor,
        model: &mut GraphModel,
    ) -> Result<RunId, ExecutionError> {
        if let Some(current) = &self.current {
            warn!("Run requested while run {} is in flight", current.run_id);
            return Err(ExecutionError::RunInFlight);
        }

        let run_id = RunId::new();
        model.reset_execution_states();
        let graph = model.serialize();

        self.current = Some(InFlight { run_id: run_id.clone(), started: Instant::now() });
        self.latest = Some(run_id.clone());
        self.last_finished = None;
        self.cancelled = None;
        info!("Submitting run {} with {} node(s)", run_id, graph.nodes.len());

        let ack = match executor.execute_graph(&run_id, &graph).await {
            Ok(ack) => ack,
            Err(e) => {
                self.current = None;
                warn!("Run {} could not be submitted: {:#}", run_id, e);
                return Err(ExecutionError::Executor(e));
            }
        };

        if !ack.accepted {
            self.current = None;
            self.last_finished = Some(run_id.clone());
            info!("Run {} rejected with {} issue(s)", run_id, ack.errors.len());
            route_validation_errors(model, &ack.errors);
            return Err(ExecutionError::Rejected(ack.errors));
        }

        Ok(run_id)
    }

    /// Stop listening to the current run
    pub fn cancel(&mut self) -> Result<RunId, ExecutionError> {
        let current = self.current.take().ok_or(ExecutionError::NoRunInFlight)?;
        info!("Run {} cancelled locally", current.run_id);
        self.cancelled = Some(current.run_id.clone());
        Ok(current.run_id)
    }

    /// Reconcile `event` against the known runs, stamping unstamped events
    /// with the run they are attributed to. A completion for the current run
    /// ends it.
    pub fn accept(&mut self, event: &mut StatusEvent) -> EventVerdict {
        if let Some(latest) = &self.latest {
            event.attribute_to(latest);
        }

        let Some(run_id) = event.run_id().cloned() else {
            // No run was ever started here; nothing to reconcile against
            return EventVerdict::Apply;
        };

        if self.cancelled.as_ref() == Some(&run_id) {
            debug!("Dropping event of cancelled run {}", run_id);
            return EventVerdict::Drop(DropReason::CancelledRun);
        }

        if self.current_run() == Some(&run_id) {
            if let StatusEvent::ExecutionComplete(complete) = event {
                if let Some(finished) = self.current.take() {
                    info!(
                        "Run {} finished ({:?}): {}/{} complete, {} failed in {:?}",
                        run_id,
                        complete.status,
                        complete.completed,
                        complete.total_nodes,
                        complete.failed,
                        finished.started.elapsed()
                    );
                }
                self.last_finished = Some(run_id);
            }
            return EventVerdict::Apply;
        }

        if self.last_finished.as_ref() == Some(&run_id) {
            return match event {
                StatusEvent::NodeStatus(status) => {
                    warn!(
                        "Node {} reported {} after run {} completed",
                        status.node_id,
                        status.status.name(),
                        run_id
                    );
                    EventVerdict::ApplyLate
                }
                StatusEvent::ExecutionComplete(_) => EventVerdict::Drop(DropReason::DuplicateCompletion),
            };
        }

        debug!("Dropping event of superseded run {}", run_id);
        EventVerdict::Drop(DropReason::SupersededRun)
    }
}

/// Write node-level validation issues into node states.
///
/// Returns the issues that name no node, or a node that is no longer in
/// the graph.
pub fn route_validation_errors(
    model: &mut GraphModel,
    issues: &[ValidationIssue],
) -> Vec<ValidationIssue> {
    let mut unrouted = Vec::new();
    for issue in issues {
        let routed = issue
            .node_id
            .is_some_and(|id| model.set_execution_state(id, ExecutionState::failed(issue.message.clone())));
        if !routed {
            unrouted.push(issue.clone());
        }
    }
    unrouted
}
