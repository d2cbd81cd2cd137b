//! Repowatch - GitHub repository push monitor
//!
//! CLI entry point for the polling daemon and one-shot commands.

use std::fs;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use repowatch::cli::{Cli, Command, OutputFormat, get_log_path};
use repowatch::config::Config;
use repowatch::daemon::DaemonManager;
use repowatch::github::{CommitSource, GithubClient};
use repowatch::monitor::Monitor;
use repowatch::notify::{EmailNotifier, Notifier};
use repowatch::state::StateStore;

/// Where log output goes for this invocation
enum LogTarget {
    /// Daemon process: log to the data-dir log file
    File,
    /// Interactive commands: log to stderr
    Stderr,
}

fn setup_logging(verbose: bool, target: LogTarget) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match target {
        LogTarget::File => {
            let log_path = get_log_path();
            if let Some(log_dir) = log_path.parent() {
                fs::create_dir_all(log_dir).context("Failed to create log directory")?;
            }

            let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(env_filter)
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter)
                .init();
        }
    }

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_target = match cli.command {
        Some(Command::RunDaemon) => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    setup_logging(cli.verbose, log_target).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "Repowatch loaded config: {} repos, interval {}s",
        config.repos.len(),
        config.monitor.poll_interval_secs
    );

    // Dispatch command
    match cli.command {
        Some(Command::Start { foreground }) => {
            cmd_start(&config, cli.config.as_deref(), foreground).await
        }
        Some(Command::Stop) => cmd_stop().await,
        Some(Command::Status { format }) => cmd_status(format).await,
        Some(Command::Check) => cmd_check(&config).await,
        Some(Command::Repos { format }) => cmd_repos(&config, format).await,
        Some(Command::Logs { follow, lines }) => cmd_logs(follow, lines).await,
        Some(Command::RunDaemon) => cmd_run_daemon(&config).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Build the monitor from configuration
fn build_monitor(config: &Config) -> Result<Monitor> {
    config.validate()?;

    let client: Arc<dyn CommitSource> =
        Arc::new(GithubClient::from_config(&config.github).context("Failed to create GitHub client")?);

    let notifier: Arc<dyn Notifier> =
        Arc::new(EmailNotifier::from_config(&config.email).context("Failed to create email notifier")?);

    let store = StateStore::new(&config.storage.state_file);

    Ok(Monitor::new(
        config.monitor.clone(),
        config.repos.clone(),
        client,
        notifier,
        store,
    ))
}

/// Start the daemon
async fn cmd_start(config: &Config, config_path: Option<&std::path::Path>, foreground: bool) -> Result<()> {
    let daemon = DaemonManager::new();

    if daemon.is_running() {
        println!("Repowatch is already running (PID: {})", daemon.running_pid().unwrap());
        return Ok(());
    }

    if foreground {
        println!("Starting repowatch in foreground mode...");
        run_monitor(config).await
    } else {
        // Fail fast on config problems before spawning a background process
        config.validate()?;
        let pid = daemon.start(config_path)?;
        println!("Repowatch started (PID: {})", pid);
        Ok(())
    }
}

/// Stop the daemon
async fn cmd_stop() -> Result<()> {
    let daemon = DaemonManager::new();

    if !daemon.is_running() {
        println!("Repowatch is not running");
        return Ok(());
    }

    let pid = daemon.running_pid().unwrap();
    daemon.stop()?;
    println!("Repowatch stopped (was PID: {})", pid);
    Ok(())
}

/// Show daemon status
async fn cmd_status(format: OutputFormat) -> Result<()> {
    let daemon = DaemonManager::new();
    let status = daemon.status();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "running": status.running,
                "pid": status.pid,
                "pid_file": status.pid_file.to_string_lossy()
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Repowatch Status");
            println!("----------------");
            if status.running {
                println!("Status: running");
                println!("PID: {}", status.pid.unwrap());
            } else {
                println!("Status: stopped");
            }
            println!("PID file: {}", status.pid_file.display());
        }
    }

    Ok(())
}

/// Run a single check cycle and exit
async fn cmd_check(config: &Config) -> Result<()> {
    let mut monitor = build_monitor(config)?;

    println!("Checking {} repositories...", config.repos.len());
    let stats = monitor.check_once().await;

    println!();
    println!("Checked:        {}", stats.checked);
    println!("New commits:    {}", stats.new_commits);
    println!("Fetch failures: {}", stats.fetch_failures);
    println!("Send failures:  {}", stats.send_failures);

    if stats.fetch_failures > 0 || stats.send_failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// List configured repositories and their last recorded commits
async fn cmd_repos(config: &Config, format: OutputFormat) -> Result<()> {
    let store = StateStore::new(&config.storage.state_file);
    let state = store.load();

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = config
                .repos
                .iter()
                .map(|repo| {
                    serde_json::json!({
                        "repo": repo.as_str(),
                        "last_sha": state.get(repo.as_str()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            if config.repos.is_empty() {
                println!("No repositories configured.");
                return Ok(());
            }

            println!("Monitored repositories:");
            for repo in &config.repos {
                match state.get(repo.as_str()) {
                    Some(sha) => println!("  {} (last: {})", repo, sha),
                    None => println!("  {} (never checked)", repo),
                }
            }
        }
    }

    Ok(())
}

/// Show logs
async fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        println!("The daemon may not have been started yet.");
        return Ok(());
    }

    if follow {
        println!("Following log file: {} (Ctrl+C to stop)", log_path.display());
        println!();

        // Use tail -f for following
        let mut child = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&log_path)
            .spawn()
            .context("Failed to run tail -f")?;

        child.wait()?;
    } else {
        // Read last N lines
        let file = fs::File::open(&log_path).context("Failed to open log file")?;
        let reader = BufReader::new(file);
        let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

        let start = if all_lines.len() > lines { all_lines.len() - lines } else { 0 };

        for line in &all_lines[start..] {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Run as the daemon process (internal command)
async fn cmd_run_daemon(config: &Config) -> Result<()> {
    let daemon = DaemonManager::new();
    daemon.register_self()?;

    run_monitor(config).await
}

/// Run the monitor loop with signal handling
async fn run_monitor(config: &Config) -> Result<()> {
    info!("Monitor starting...");

    let monitor = build_monitor(config)?;
    info!("Startup validation passed");

    // Create shutdown channel for the monitor
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.run(shutdown_rx).await {
            tracing::error!(error = %e, "Monitor error");
        }
    });
    info!("Monitor running. Press Ctrl+C to stop.");

    // Set up signal handlers
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("SIGINT received");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received");
            }
        }
        let _ = shutdown_tx.send(()).await;
    }

    #[cfg(not(unix))]
    {
        // On non-Unix, just wait for Ctrl+C
        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(()).await;
    }

    info!("Monitor shutting down...");

    let _ = monitor_handle.await;

    Ok(())
}
