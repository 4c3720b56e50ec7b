// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Monotonic request sequencing
//!
//! Requests are never cancelled, so a slow response to an older request can
//! arrive after a newer one was issued. Each workflow stamps its requests with a
//! [`Ticket`] and only applies a response whose ticket is still the latest.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{WorkflowError, WorkflowResult};

/// Position of a request in its workflow's issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Per-workflow monotonic request counter
#[derive(Debug)]
pub struct RequestSequence {
    workflow: &'static str,
    latest: AtomicU64,
}

impl RequestSequence {
    /// Create a counter for the named workflow
    pub fn new(workflow: &'static str) -> Self {
        Self {
            workflow,
            latest: AtomicU64::new(0),
        }
    }

    /// Issue the ticket for a new request, superseding all earlier ones
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Check if no newer ticket has been issued since `ticket`
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Fail with [`WorkflowError::Superseded`] unless `ticket` is the latest
    pub fn ensure_latest(&self, ticket: Ticket) -> WorkflowResult<()> {
        if self.is_latest(ticket) {
            Ok(())
        } else {
            debug!(
                workflow = self.workflow,
                ticket = ticket.0,
                "discarding stale response"
            );
            Err(WorkflowError::Superseded {
                workflow: self.workflow,
            })
        }
    }
}
