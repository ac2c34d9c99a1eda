//! Arena backend processes
//!
//! Servers are started from per-protocol shell commands. Every process the
//! manager spawns is returned as a [`ServerHandle`]; whoever holds the handle
//! is responsible for stopping it.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::Config,
    types::Protocol,
};
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};

/// Grace period between the terminate signal and a forced kill
pub const STOP_GRACE: Duration = Duration::from_secs(2);
/// Default time a spawned server gets to open its port
pub const READY_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How to start one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// Shell command line
    pub command: String,
}

impl ServerSpec {
    /// One spec per selected protocol that has a configured command
    pub fn from_config(config: &Config) -> Vec<ServerSpec> {
        config
            .protocols
            .iter()
            .filter_map(|&protocol| {
                config.server_commands.get(&protocol).map(|command| ServerSpec {
                    protocol,
                    host: config.host.clone(),
                    port: config.port_for(protocol),
                    command: command.clone(),
                })
            })
            .collect()
    }
}

/// A process this client spawned.
///
/// On Unix the shell leads its own process group, so the server it launches
/// is signalled together with it.
#[derive(Debug)]
pub struct ServerHandle {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// Process group id, equal to the shell's pid
    pgid: Option<u32>,
    child: Child,
}

impl ServerHandle {
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Non-blocking exit poll of the shell
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Terminate the process group, waiting up to [`STOP_GRACE`] for the
    /// shell to exit and the port to close before a forced kill
    pub async fn stop(mut self) -> Result<()> {
        self.signal(Signal::Terminate)?;

        let deadline = Instant::now() + STOP_GRACE;
        loop {
            if !self.is_running() && !ServerManager::is_port_open(&self.host, self.port).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(STOP_POLL_INTERVAL).await;
        }

        self.signal(Signal::Kill)?;
        self.child
            .wait()
            .await
            .map_err(|e| AppError::server_process(format!("Failed to reap {} server: {}", self.protocol, e)))?;
        Ok(())
    }

    #[cfg(unix)]
    fn signal(&mut self, signal: Signal) -> Result<()> {
        let Some(pgid) = self.pgid else {
            return Ok(());
        };
        let signo = match signal {
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        };
        // A negative pid addresses every process in the group
        let rc = unsafe { libc::kill(-(pgid as libc::pid_t), signo) };
        if rc == 0 {
            return Ok(());
        }
        let error = std::io::Error::last_os_error();
        if error.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(AppError::server_process(format!(
                "Failed to signal {} server group {}: {}",
                self.protocol, pgid, error
            )))
        }
    }

    #[cfg(not(unix))]
    fn signal(&mut self, _signal: Signal) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.child
            .start_kill()
            .map_err(|e| AppError::server_process(format!("Failed to stop {} server: {}", self.protocol, e)))
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Terminate,
    Kill,
}

/// Result of [`ServerManager::start`]
#[derive(Debug)]
pub enum ServerStart {
    /// Something already listens on the port; nothing is tracked
    AlreadyRunning,
    Spawned(ServerHandle),
}

/// Starts and stops arena backends
#[derive(Clone)]
pub struct ServerManager {
    logger: Logger,
    ready_timeout: Duration,
}

impl ServerManager {
    pub fn new(logger: Logger) -> Self {
        Self { logger, ready_timeout: READY_TIMEOUT }
    }

    pub fn with_ready_timeout(mut self, ready_timeout: Duration) -> Self {
        self.ready_timeout = ready_timeout;
        self
    }

    /// TCP connect probe
    pub async fn is_port_open(host: &str, port: u16) -> bool {
        matches!(
            timeout(CONNECT_PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }

    /// Poll until the port accepts connections or `limit` elapses
    pub async fn wait_until_ready(host: &str, port: u16, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;
        loop {
            if Self::is_port_open(host, port).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::server_process(format!(
                    "{}:{} did not accept connections within {:?}",
                    host, port, limit
                )));
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Spawn `spec.command` unless its port is already served.
    ///
    /// Output of the child is discarded.
    pub async fn start(&self, spec: &ServerSpec) -> Result<ServerStart> {
        if Self::is_port_open(&spec.host, spec.port).await {
            self.logger
                .info(&format!("Port {} for {} is already open", spec.port, spec.protocol))
                .field("protocol", spec.protocol)
                .field("port", spec.port)
                .log()
                .await;
            return Ok(ServerStart::AlreadyRunning);
        }

        self.logger
            .info(&format!("Starting {} server on port {}", spec.protocol, spec.port))
            .field("protocol", spec.protocol)
            .field("command", &spec.command)
            .log()
            .await;

        let mut command = shell(&spec.command);
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        let child = Command::from(command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::server_process(format!("Failed to start {} server: {}", spec.protocol, e)))?;

        Ok(ServerStart::Spawned(ServerHandle {
            protocol: spec.protocol,
            host: spec.host.clone(),
            port: spec.port,
            pgid: child.id(),
            child,
        }))
    }

    /// Start every spec and wait for its port.
    ///
    /// On failure, servers spawned so far are stopped before the error is returned.
    pub async fn start_all(&self, specs: &[ServerSpec]) -> Result<Vec<ServerHandle>> {
        let mut handles = Vec::new();
        for spec in specs {
            let started = match self.start(spec).await {
                Ok(started) => started,
                Err(error) => {
                    self.stop_all(handles).await;
                    return Err(error);
                }
            };

            if let ServerStart::Spawned(mut handle) = started {
                let ready = Self::wait_until_ready(&spec.host, spec.port, self.ready_timeout).await;
                if let Err(error) = ready {
                    let exited = !handle.is_running();
                    handles.push(handle);
                    self.stop_all(handles).await;
                    return Err(if exited {
                        AppError::server_process(format!("{} server exited during startup", spec.protocol))
                    } else {
                        error
                    });
                }
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    /// Stop handles, logging failures instead of returning them
    pub async fn stop_all(&self, handles: Vec<ServerHandle>) {
        for handle in handles {
            let protocol = handle.protocol;
            self.logger.info(&format!("Stopping {} server", protocol)).log().await;
            if let Err(error) = handle.stop().await {
                self.logger
                    .warn(&format!("Could not stop {} server", protocol))
                    .error_info(&error)
                    .log()
                    .await;
            }
        }
    }
}

#[cfg(unix)]
fn shell(command: &str) -> std::process::Command {
    use std::os::unix::process::CommandExt;

    let mut cmd = std::process::Command::new("sh");
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ServerManager {
        ServerManager::new(Logger::silent("server-test".to_string()))
    }

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn spec(port: u16, command: &str) -> ServerSpec {
        ServerSpec {
            protocol: Protocol::Rest,
            host: "127.0.0.1".to_string(),
            port,
            command: command.to_string(),
        }
    }

    #[test]
    fn test_specs_only_for_configured_commands() {
        let mut config = Config::default();
        config.protocols = vec![Protocol::Rest, Protocol::Grpc];
        config.server_commands.insert(Protocol::Grpc, "run-grpc".to_string());
        config.server_commands.insert(Protocol::Sse, "run-sse".to_string());

        let specs = ServerSpec::from_config(&config);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].protocol, Protocol::Grpc);
        assert_eq!(specs[0].port, 50051);
    }

    #[tokio::test]
    async fn test_port_probe() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(ServerManager::is_port_open("127.0.0.1", port).await);

        drop(listener);
        assert!(!ServerManager::is_port_open("127.0.0.1", free_port()).await);
    }

    #[tokio::test]
    async fn test_open_port_is_not_tracked() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let started = manager().start(&spec(port, "exit 1")).await.unwrap();
        assert!(matches!(started, ServerStart::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out() {
        let result = ServerManager::wait_until_ready("127.0.0.1", free_port(), Duration::from_millis(200)).await;
        assert!(matches!(result, Err(AppError::ServerProcess(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_and_stop() {
        let started = manager().start(&spec(free_port(), "sleep 30")).await.unwrap();
        let ServerStart::Spawned(mut handle) = started else {
            panic!("expected a spawned server");
        };
        assert!(handle.is_running());
        assert!(handle.pid().is_some());

        let begin = Instant::now();
        handle.stop().await.unwrap();
        assert!(begin.elapsed() <= STOP_GRACE + Duration::from_millis(500));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_closes_port_held_by_grandchild() {
        let has_python = std::process::Command::new("python3")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        if !has_python {
            return;
        }

        let port = free_port();
        // `; true` keeps sh alive as the parent instead of exec-ing the server
        let command = format!("python3 -m http.server {} --bind 127.0.0.1; true", port);
        let manager = manager().with_ready_timeout(Duration::from_secs(10));
        let mut handles = manager.start_all(&[spec(port, &command)]).await.unwrap();
        assert_eq!(handles.len(), 1);
        assert!(ServerManager::is_port_open("127.0.0.1", port).await);

        handles.pop().unwrap().stop().await.unwrap();
        assert!(!ServerManager::is_port_open("127.0.0.1", port).await);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stop_terminates_whole_process_group() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("worker.pid");
        let command = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let started = manager().start(&spec(free_port(), &command)).await.unwrap();
        let ServerStart::Spawned(handle) = started else {
            panic!("expected a spawned server");
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        let worker = loop {
            if let Ok(pid) = std::fs::read_to_string(&pid_file) {
                if let Ok(pid) = pid.trim().parse::<u32>() {
                    break pid;
                }
            }
            assert!(Instant::now() < deadline, "worker pid was never written");
            sleep(Duration::from_millis(20)).await;
        };

        handle.stop().await.unwrap();

        // Gone, or a zombie waiting for init to reap it
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let alive = std::fs::read_to_string(format!("/proc/{}/stat", worker))
                .map(|stat| !stat.contains(") Z "))
                .unwrap_or(false);
            if !alive {
                break;
            }
            assert!(Instant::now() < deadline, "worker {} survived stop", worker);
            sleep(Duration::from_millis(20)).await;
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_all_reports_early_exit() {
        let manager = manager().with_ready_timeout(Duration::from_millis(300));
        let result = manager.start_all(&[spec(free_port(), "exit 3")]).await;
        assert!(matches!(result, Err(AppError::ServerProcess(_))));
    }
}
