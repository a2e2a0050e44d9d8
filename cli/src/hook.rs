use exambank_backup::RestartHook;
use std::process::Command;
use tracing::{error, info, warn};

/// Relaunches the application by spawning the configured command.
#[derive(Debug, Clone, Default)]
pub struct RelaunchHook {
    command: Option<Vec<String>>,
}

impl RelaunchHook {
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self { command }
    }
}

impl RestartHook for RelaunchHook {
    fn restart(&self) {
        let Some((program, args)) = self.command.as_deref().and_then(<[String]>::split_first) else {
            warn!("restore complete; restart the application to reload its state");
            return;
        };
        match Command::new(program).args(args).spawn() {
            Ok(child) => info!(program = %program, pid = child.id(), "restart command launched"),
            Err(e) => error!(program = %program, error = %e, "failed to launch restart command"),
        }
    }
}
