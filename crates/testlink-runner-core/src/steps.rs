//! Build steps and the context they run in

use std::path::{
    Path,
    PathBuf,
};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::StepConfig;
use crate::env::BuildEnvironment;
use crate::event::{
    EventBus,
    NoOpEventBus,
};

/// Everything a step can see while the build runs
pub struct BuildContext {
    workspace: PathBuf,
    environment: BuildEnvironment,
    event_bus: Arc<dyn EventBus>,
}

impl BuildContext {
    pub fn new(
        workspace: impl Into<PathBuf>, environment: BuildEnvironment, event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            environment,
            event_bus,
        }
    }

    /// Context with an empty environment and no event listener
    pub fn detached(workspace: impl Into<PathBuf>) -> Self {
        Self::new(
            workspace,
            BuildEnvironment::default(),
            Arc::new(NoOpEventBus),
        )
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn environment(&self) -> &BuildEnvironment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut BuildEnvironment {
        &mut self.environment
    }

    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.event_bus
    }
}

/// A unit of build work. `perform` reports success; failures are expected
/// to be logged by the step itself.
#[async_trait]
pub trait BuildStep: Send + Sync {
    fn name(&self) -> &str;

    async fn perform(&self, context: &BuildContext) -> bool;
}

/// Runs a command line through the platform shell
#[derive(Debug, Clone)]
pub struct ShellStep {
    name: String,
    command: String,
    working_dir: Option<PathBuf>,
}

impl ShellStep {
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            working_dir: None,
        }
    }

    pub fn from_config(config: &StepConfig) -> Self {
        let mut step = Self::new(config.command.clone());
        if let Some(name) = &config.name {
            step.name = name.clone();
        }
        step.working_dir = config.working_dir.as_ref().map(PathBuf::from);
        step
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell_command(&self) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.command);
            cmd
        }
    }
}

#[async_trait]
impl BuildStep for ShellStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform(&self, context: &BuildContext) -> bool {
        let dir = match &self.working_dir {
            Some(dir) => context.workspace().join(dir),
            None => context.workspace().to_path_buf(),
        };

        tracing::debug!(step = %self.name, dir = %dir.display(), "Running shell step");

        let mut cmd = self.shell_command();
        cmd.current_dir(&dir)
            .env_clear()
            .envs(context.environment().materialize())
            .stdin(Stdio::null());

        match cmd.status().await {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::warn!(
                    step = %self.name,
                    exit_code = status.code().unwrap_or(-1),
                    "Shell step failed"
                );
                false
            }
            Err(e) => {
                tracing::error!(step = %self.name, error = %e, "Failed to spawn shell step");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::env::EnvVars;

    fn context(dir: &TempDir) -> BuildContext {
        let mut base = EnvVars::new();
        if let Ok(path) = std::env::var("PATH") {
            base.insert("PATH".to_string(), path);
        }
        BuildContext::new(
            dir.path(),
            BuildEnvironment::new(base),
            Arc::new(NoOpEventBus),
        )
    }

    #[tokio::test]
    async fn test_shell_step_exit_status() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert!(ShellStep::new("exit 0").perform(&ctx).await);
        assert!(!ShellStep::new("exit 3").perform(&ctx).await);
    }

    #[tokio::test]
    async fn test_shell_step_sees_contributed_environment() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);

        let mut vars = EnvVars::new();
        vars.insert("TESTLINK_TESTCASE_ID".to_string(), "7".to_string());
        ctx.environment_mut().contribute(vars);

        let step = ShellStep::new("test \"$TESTLINK_TESTCASE_ID\" = 7");
        assert!(step.perform(&ctx).await);
    }

    #[tokio::test]
    async fn test_shell_step_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        let ctx = context(&dir);

        let step = ShellStep::from_config(&StepConfig {
            name: Some("touch".to_string()),
            command: "touch marker".to_string(),
            working_dir: Some("reports".to_string()),
        });
        assert_eq!(step.name(), "touch");
        assert!(step.perform(&ctx).await);
        assert!(dir.path().join("reports").join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_working_dir_is_failure() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let step = ShellStep::new("true").with_working_dir("does-not-exist");
        assert!(!step.perform(&ctx).await);
    }
}
