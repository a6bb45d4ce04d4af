use engine_runtime::summary::JobSummary;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Process exit status, derived from the job outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Clean = 0,
    Failed = 1,
    Interrupted = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Turns SIGINT/SIGTERM into cancellation of the shared token. Nothing but
/// the signal listener ever cancels the token, so the token itself records
/// whether the operator asked for a shutdown.
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns the signal listener. In-flight batches finish; the engine
    /// stops dispatching new work and reports partial counts.
    pub fn arm(&self) {
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let interrupt = async {
                signal::ctrl_c()
                    .await
                    .expect("SIGINT handler installation failed");
            };

            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("SIGTERM handler installation failed")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = interrupt => warn!("interrupt received, finishing in-flight batches"),
                _ = terminate => warn!("termination requested, finishing in-flight batches"),
            }

            cancel.cancel();
        });
    }

    /// Maps the finished job onto a process exit status. An operator
    /// shutdown wins over everything else; otherwise the summary decides.
    pub fn resolve_exit(&self, summary: &JobSummary) -> ExitCode {
        if self.cancel.is_cancelled() {
            ExitCode::Interrupted
        } else if summary.is_clean() {
            ExitCode::Clean
        } else {
            ExitCode::Failed
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_runtime::summary::TableSummary;

    fn summary(failed: u64, interrupted: bool) -> JobSummary {
        JobSummary::from_tables(
            vec![TableSummary {
                table: "t".to_string(),
                destination: "t".to_string(),
                total: 10,
                success: 10 - failed,
                failed,
                batches: 1,
                duration_secs: 1.0,
                records_per_second: 10.0,
                error: None,
                failure_samples: Vec::new(),
            }],
            1.0,
            interrupted,
            false,
        )
    }

    #[test]
    fn clean_run_exits_zero() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.resolve_exit(&summary(0, false)), ExitCode::Clean);
        assert_eq!(ExitCode::Clean.as_i32(), 0);
    }

    #[test]
    fn permanent_failures_exit_nonzero() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(
            coordinator.resolve_exit(&summary(1, false)),
            ExitCode::Failed
        );
        assert_eq!(ExitCode::Failed.as_i32(), 1);
    }

    #[test]
    fn operator_shutdown_exits_130_even_when_counts_are_clean() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.token().cancel();
        assert_eq!(
            coordinator.resolve_exit(&summary(0, true)),
            ExitCode::Interrupted
        );
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }
}
