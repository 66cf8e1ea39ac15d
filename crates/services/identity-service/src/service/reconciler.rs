//! Reconciliation sweep for the registration saga's crash window.
//!
//! A crash between persisting the user row and binding the default role
//! leaves an identity without a role assignment. The sweep finds such rows
//! and retries the bind. Lookups here are exact, never degraded: a degraded
//! answer would make an orphan look bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use common::AppResult;

use crate::client::RoleDirectoryClient;
use crate::repository::UserRepository;

/// Outcome of a single sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Users inspected
    pub scanned: usize,
    /// Orphans whose default role was bound
    pub bound: usize,
    /// Users skipped because the role directory was unreachable
    pub skipped: usize,
}

/// Periodic sweep binding default roles to orphaned users.
pub struct Reconciler {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleDirectoryClient>,
    /// Users younger than this are left alone; their registration saga may
    /// still be in flight.
    grace: Duration,
}

impl Reconciler {
    /// Create new reconciler instance
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleDirectoryClient>,
        grace: Duration,
    ) -> Self {
        Self { users, roles, grace }
    }

    /// Run one sweep over all users outside the grace window.
    pub async fn run_once(&self) -> AppResult<ReconcileReport> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.grace)
                .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let users = self.users.list_created_before(cutoff).await?;
        let mut report = ReconcileReport::default();

        for user in users {
            report.scanned += 1;

            match self.roles.find_role(user.id).await {
                Ok(Some(_)) => {}
                Ok(None) => match self.roles.bind_default_role(user.id).await {
                    Ok(()) => {
                        info!(user_id = %user.id, "bound default role to orphaned user");
                        report.bound += 1;
                    }
                    Err(err) if err.is_unavailable() => {
                        report.skipped += 1;
                    }
                    Err(err) => {
                        warn!(user_id = %user.id, error = %err, "reconcile bind failed");
                        report.skipped += 1;
                    }
                },
                Err(err) if err.is_unavailable() => {
                    // Next sweep retries; nothing useful to do while down
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        if report.bound > 0 || report.skipped > 0 {
            info!(
                scanned = report.scanned,
                bound = report.bound,
                skipped = report.skipped,
                "reconciliation sweep finished"
            );
        }

        Ok(report)
    }

    /// Run sweeps forever on a fixed interval.
    pub fn spawn(self: Arc<Self>, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once().await {
                    warn!(error = %err, "reconciliation sweep failed");
                }
            }
        });
    }
}
