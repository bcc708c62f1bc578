use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Executable not found: {program}")]
    NotFound { program: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process termination failed: {0}")]
    TerminationFailed(String),
}

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Working directory for command execution
    pub working_directory: Option<PathBuf>,

    /// Environment variables layered over the inherited environment
    pub environment_variables: HashMap<String, String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            environment_variables: HashMap::new(),
        }
    }
}

impl ExecutionConfig {
    /// Create a new execution config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set working directory
    pub fn with_working_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add environment variable
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables
    pub fn with_environment_variables(mut self, vars: HashMap<String, String>) -> Self {
        self.environment_variables.extend(vars);
        self
    }

}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code of the process
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error output
    pub stderr: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Whether the command was successful (exit code 0)
    pub success: bool,
}

impl ExecutionResult {
    /// Create a new execution result
    pub fn new(exit_code: i32, stdout: String, stderr: String, execution_time_ms: u64) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            execution_time_ms,
            success: exit_code == 0,
        }
    }
}

/// Command executor for running external processes
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute a program with arguments, capturing output.
    pub async fn execute(
        program: &Path,
        args: &[String],
        config: &ExecutionConfig,
    ) -> Result<ExecutionResult, CommandExecutorError> {
        Self::execute_with_listener(program, args, config, &mut |_| {}).await
    }

    /// Execute a program, handing every stdout line to `on_line` as it arrives.
    pub async fn execute_with_listener(
        program: &Path,
        args: &[String],
        config: &ExecutionConfig,
        on_line: &mut (dyn FnMut(&str) + Send),
    ) -> Result<ExecutionResult, CommandExecutorError> {
        if program.as_os_str().is_empty() {
            return Err(CommandExecutorError::InvalidCommand(
                "Command is empty".to_string(),
            ));
        }

        let start_time = Instant::now();
        debug!(program = %program.display(), args = ?args, "executing");

        let mut cmd = TokioCommand::new(program);
        cmd.args(args);

        if let Some(working_dir) = &config.working_directory {
            cmd.current_dir(working_dir);
        }

        for (key, value) in &config.environment_variables {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandExecutorError::NotFound {
                    program: program.display().to_string(),
                }
            } else {
                CommandExecutorError::SpawnFailed(format!(
                    "Failed to spawn '{}': {}",
                    program.display(),
                    e
                ))
            }
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes together so a chatty stderr cannot stall stdout
        let (stdout_data, stderr_data) =
            tokio::try_join!(Self::read_lines(stdout, on_line), Self::read_all(stderr))?;

        let exit_status = child.wait().await.map_err(|e| {
            CommandExecutorError::TerminationFailed(format!("Failed to wait for process: {}", e))
        })?;

        let exit_code = exit_status.code().unwrap_or(-1);
        let execution_time = start_time.elapsed().as_millis() as u64;

        Ok(ExecutionResult::new(
            exit_code,
            stdout_data,
            stderr_data,
            execution_time,
        ))
    }

    async fn read_lines<R>(
        reader: Option<R>,
        on_line: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String, CommandExecutorError>
    where
        R: AsyncRead + Unpin,
    {
        let mut data = String::new();
        let Some(reader) = reader else {
            return Ok(data);
        };

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        while reader.read_line(&mut line).await? > 0 {
            on_line(line.trim_end_matches(['\r', '\n']));
            data.push_str(&line);
            line.clear();
        }
        Ok(data)
    }

    async fn read_all<R>(reader: Option<R>) -> Result<String, CommandExecutorError>
    where
        R: AsyncRead + Unpin,
    {
        let mut data = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut data).await?;
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
