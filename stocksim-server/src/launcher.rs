//! Desktop launcher
//!
//! Prints a banner, waits briefly, points the default browser at the
//! dashboard and then runs the server in the foreground until it exits.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use stocksim_common::config::{DEFAULT_HOST, DEFAULT_PORT};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const APP_TITLE: &str = "Fintech Stock Simulator";

/// Name of the server executable shipped next to the launcher
pub const SERVER_BINARY: &str = "stocksim-server";

/// How to launch
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub host: String,
    pub port: u16,
    /// Pause between the banner and opening the browser
    pub delay: Duration,
    pub open_browser: bool,
    /// Replacement server command; empty means the bundled server
    pub command: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            delay: Duration::from_secs(2),
            open_browser: true,
            command: Vec::new(),
        }
    }
}

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: OsString,
    pub args: Vec<String>,
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub fn dashboard_url(host: &str, port: u16) -> String {
    format!("http://{}:{}/", host, port)
}

pub fn banner(url: &str) -> String {
    let rule = "=".repeat(60);
    format!(
        "{rule}\n  {APP_TITLE}\n{rule}\n\n  Starting server...\n  Dashboard: {url}\n  Status:    {url}status\n\n  Press Ctrl+C to stop the server.\n{rule}\n"
    )
}

pub fn default_server_args(host: &str, port: u16) -> Vec<String> {
    vec![
        "--host".to_string(),
        host.to_string(),
        "--port".to_string(),
        port.to_string(),
    ]
}

/// Resolve the command that runs the server
///
/// `launcher_exe` is the launcher's own path; the bundled server is looked
/// up in the same directory and otherwise left to `PATH`.
pub fn server_command(options: &LaunchOptions, launcher_exe: Option<&Path>) -> CommandLine {
    if let Some((program, args)) = options.command.split_first() {
        return CommandLine {
            program: OsString::from(program),
            args: args.to_vec(),
        };
    }

    let binary = format!("{}{}", SERVER_BINARY, std::env::consts::EXE_SUFFIX);
    let program = launcher_exe
        .and_then(Path::parent)
        .map(|dir| dir.join(&binary))
        .filter(|candidate| candidate.exists())
        .map(PathBuf::into_os_string)
        .unwrap_or_else(|| OsString::from(binary));

    CommandLine {
        program,
        args: default_server_args(&options.host, options.port),
    }
}

/// Platform command that opens `url` in the default browser
pub fn browser_command(url: &str) -> CommandLine {
    if cfg!(target_os = "windows") {
        CommandLine {
            program: OsString::from("cmd"),
            args: vec!["/C".into(), "start".into(), String::new(), url.to_string()],
        }
    } else if cfg!(target_os = "macos") {
        CommandLine {
            program: OsString::from("open"),
            args: vec![url.to_string()],
        }
    } else {
        CommandLine {
            program: OsString::from("xdg-open"),
            args: vec![url.to_string()],
        }
    }
}

/// Spawn `command` and reap it in a background task
///
/// Must be called inside a tokio runtime.
pub fn spawn_detached(
    command: &CommandLine,
) -> std::io::Result<JoinHandle<std::io::Result<ExitStatus>>> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .spawn()?;
    Ok(tokio::spawn(async move { child.wait().await }))
}

/// Fire-and-forget browser launch; failure is only logged
pub fn open_browser(url: &str) {
    let command = browser_command(url);
    match spawn_detached(&command) {
        Ok(_) => info!("Opened browser at {}", url),
        Err(e) => warn!("Could not open browser ({}): {}. Visit {} manually.", command, e, url),
    }
}

/// Banner, pause, browser, then the server in the foreground
pub async fn run(options: LaunchOptions) -> Result<ExitStatus> {
    let url = dashboard_url(&options.host, options.port);
    println!("{}", banner(&url));

    tokio::time::sleep(options.delay).await;

    if options.open_browser {
        open_browser(&url);
    }

    let launcher_exe = std::env::current_exe().ok();
    let command = server_command(&options, launcher_exe.as_deref());
    info!("Running: {}", command);

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .spawn()
        .with_context(|| format!("Failed to start server: {}", command))?;

    let status = tokio::select! {
        status = child.wait() => status,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, waiting for server to stop");
            child.wait().await
        }
    }
    .context("Failed waiting for server process")?;

    info!("Server exited with {}", status);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dashboard_url() {
        let options = LaunchOptions::default();
        assert_eq!(
            dashboard_url(&options.host, options.port),
            "http://127.0.0.1:8000/"
        );
    }

    #[test]
    fn test_banner_mentions_url_and_stop_key() {
        let text = banner("http://127.0.0.1:8000/");
        assert!(text.contains("http://127.0.0.1:8000/"));
        assert!(text.contains(APP_TITLE));
        assert!(text.contains("Ctrl+C"));
    }

    #[test]
    fn test_default_server_command_binds_localhost_8000() {
        let command = server_command(&LaunchOptions::default(), None);
        assert_eq!(command.args.join(" "), "--host 127.0.0.1 --port 8000");
        assert!(command
            .program
            .to_string_lossy()
            .starts_with(SERVER_BINARY));
    }

    #[test]
    fn test_bundled_server_found_next_to_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let server = dir
            .path()
            .join(format!("{}{}", SERVER_BINARY, std::env::consts::EXE_SUFFIX));
        std::fs::write(&server, b"").unwrap();
        let launcher = dir.path().join("stocksim-launch");

        let command = server_command(&LaunchOptions::default(), Some(&launcher));
        assert_eq!(PathBuf::from(command.program), server);
    }

    #[test]
    fn test_custom_command_used_verbatim() {
        let options = LaunchOptions {
            command: "python -m uvicorn main:app --reload --host 127.0.0.1 --port 8000"
                .split(' ')
                .map(String::from)
                .collect(),
            ..LaunchOptions::default()
        };
        let command = server_command(&options, None);
        assert_eq!(
            command.to_string(),
            "python -m uvicorn main:app --reload --host 127.0.0.1 --port 8000"
        );
    }

    #[test]
    fn test_browser_command_targets_url() {
        let command = browser_command("http://127.0.0.1:8000/");
        assert_eq!(
            command.args.last().map(String::as_str),
            Some("http://127.0.0.1:8000/")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detached_child_is_reaped() {
        let command = CommandLine {
            program: OsString::from("true"),
            args: Vec::new(),
        };
        let handle = spawn_detached(&command).unwrap();
        let status = handle.await.unwrap().unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_detached_spawn_failure_is_reported() {
        let command = CommandLine {
            program: OsString::from("stocksim-no-such-program"),
            args: Vec::new(),
        };
        assert!(spawn_detached(&command).is_err());
    }
}
