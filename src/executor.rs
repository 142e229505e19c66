use std::collections::HashMap;
use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitid, Id, WaitPidFlag};
use nix::unistd::Pid;
use crate::error::SpawnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Exited(i32),
    Signaled(i32),
    NotStarted,
}

#[derive(Debug)]
pub struct LaunchResult {
    pub path: PathBuf,
    pub status: ExitState,
    pub stdout: String,
    pub stderr: String,
    pub spawn_error: Option<SpawnError>,
}

impl LaunchResult {
    fn spawn_failed(path: PathBuf, err: SpawnError) -> Self {
        Self {
            path,
            status: ExitState::NotStarted,
            stdout: String::new(),
            stderr: String::new(),
            spawn_error: Some(err),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.spawn_error.is_none() && self.status == ExitState::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ExitState::Exited(code) => Some(code),
            _ => None,
        }
    }
}

fn exit_state(status: ExitStatus) -> ExitState {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitState::Exited(code),
        (None, Some(sig)) => ExitState::Signaled(sig),
        // Neither a code nor a signal: treat like a kill rather than success
        (None, None) => ExitState::Signaled(0),
    }
}

/// A child that may still be signalled. `finished` flips before the child is
/// reaped, so a pid stored here always belongs to our (possibly zombie) child.
struct Tracked {
    pid: Pid,
    finished: Mutex<bool>,
}

impl Tracked {
    fn terminate(&self) -> bool {
        let finished = lock(&self.finished);
        if *finished {
            return false;
        }
        match signal::kill(self.pid, Signal::SIGTERM) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to signal pid {}: {}", self.pid, e);
                false
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returned by [`Launcher::launch`]. Dropping it never affects the child.
pub struct LaunchHandle {
    tracked: Option<Arc<Tracked>>,
}

#[allow(dead_code)]
impl LaunchHandle {
    /// Sends SIGTERM if the child is still running. Returns whether a signal
    /// was delivered.
    pub fn cancel(&self) -> bool {
        self.tracked.as_ref().is_some_and(|t| t.terminate())
    }

    pub fn pid(&self) -> Option<u32> {
        self.tracked.as_ref().map(|t| t.pid.as_raw() as u32)
    }
}

#[derive(Default, Clone)]
pub struct Launcher {
    running: Arc<Mutex<HashMap<u64, Arc<Tracked>>>>,
    next_id: Arc<AtomicU64>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `path` with no arguments and calls `on_complete` exactly once:
    /// right away if the spawn fails, otherwise from a background thread once
    /// the child exits.
    pub fn launch<F>(&self, path: &Path, on_complete: F) -> LaunchHandle
    where
        F: FnOnce(LaunchResult) + Send + 'static,
    {
        let path = path.to_path_buf();
        let mut child = match Command::new(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let err = SpawnError::from_io(path.clone(), e);
                warn!("Spawn failed: {}", err);
                on_complete(LaunchResult::spawn_failed(path, err));
                return LaunchHandle { tracked: None };
            }
        };

        let pid = Pid::from_raw(child.id() as i32);
        debug!("Spawned {:?} as pid {}", path, pid);
        let tracked = Arc::new(Tracked { pid, finished: Mutex::new(false) });
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.running).insert(id, tracked.clone());

        // Readers must start before the wait so a chatty child cannot fill a
        // pipe and stall.
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let running = self.running.clone();
        let waiter_tracked = tracked.clone();
        thread::spawn(move || {
            let result = wait_child(child, &waiter_tracked, path, stdout, stderr);
            lock(&running).remove(&id);
            on_complete(result);
        });

        LaunchHandle { tracked: Some(tracked) }
    }

    /// Number of children that have not exited yet.
    pub fn running(&self) -> usize {
        lock(&self.running).len()
    }

    /// SIGTERM every live child. Returns how many were signalled.
    pub fn terminate_all(&self) -> usize {
        let live: Vec<Arc<Tracked>> = lock(&self.running).values().cloned().collect();
        live.iter().filter(|t| t.terminate()).count()
    }
}

type Reader = thread::JoinHandle<Vec<u8>>;

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Reader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!("Pipe read ended early: {}", e);
        }
        buf
    })
}

fn collect(reader: Option<Reader>) -> String {
    let bytes = reader.and_then(|r| r.join().ok()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_child(
    mut child: Child,
    tracked: &Tracked,
    path: PathBuf,
    stdout: Option<Reader>,
    stderr: Option<Reader>,
) -> LaunchResult {
    // Block until exit but leave the zombie in place.
    loop {
        match waitid(Id::Pid(tracked.pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Err(Errno::EINTR) => continue,
            Err(e) => {
                debug!("waitid on {} failed: {}", tracked.pid, e);
                break;
            }
            Ok(_) => break,
        }
    }
    *lock(&tracked.finished) = true;

    let status = match child.wait() {
        Ok(status) => exit_state(status),
        Err(e) => {
            warn!("Lost exit status of pid {}: {}", tracked.pid, e);
            ExitState::Signaled(0)
        }
    };
    let stdout = collect(stdout);
    let stderr = collect(stderr);
    debug!("pid {} finished with {:?}", tracked.pid, status);

    LaunchResult {
        path,
        status,
        stdout,
        stderr,
        spawn_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(20);

    fn write_executable(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    fn run(launcher: &Launcher, path: &Path) -> LaunchResult {
        let (tx, rx) = mpsc::channel();
        launcher.launch(path, move |r| tx.send(r).unwrap());
        rx.recv_timeout(TIMEOUT).unwrap()
    }

    #[test]
    fn captures_stdout_on_success() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("hello.sh");
        write_executable(&script, "#!/bin/sh\necho hello\n");

        let result = run(&Launcher::new(), &script);
        assert!(result.succeeded());
        assert_eq!(result.status, ExitState::Exited(0));
        assert_eq!(result.exit_code(), Some(0));
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "");
        assert!(result.spawn_error.is_none());
        assert_eq!(result.path, script);
    }

    #[test]
    fn missing_path_is_a_spawn_error() {
        let root = TempDir::new().unwrap();
        let result = run(&Launcher::new(), &root.path().join("gone.sh"));
        assert!(!result.succeeded());
        assert_eq!(result.status, ExitState::NotStarted);
        assert_eq!(result.exit_code(), None);
        assert!(matches!(result.spawn_error, Some(SpawnError::NotFound(_))));
    }

    #[test]
    fn non_executable_is_a_spawn_error() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("plain.sh");
        fs::write(&script, "#!/bin/sh\necho nope\n").unwrap();

        let result = run(&Launcher::new(), &script);
        assert!(!result.succeeded());
        assert!(result.spawn_error.is_some());
        assert_eq!(result.exit_code(), None);
    }

    #[test]
    fn spawn_failure_reports_synchronously() {
        let root = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let handle =
            Launcher::new().launch(&root.path().join("gone"), move |r| tx.send(r).unwrap());
        assert!(rx.try_recv().is_ok());
        assert!(handle.pid().is_none());
        assert!(!handle.cancel());
    }

    #[test]
    fn nonzero_exit_keeps_output() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("fail.sh");
        write_executable(&script, "#!/bin/sh\necho partial\necho oops >&2\nexit 3\n");

        let result = run(&Launcher::new(), &script);
        assert!(!result.succeeded());
        assert_eq!(result.status, ExitState::Exited(3));
        assert_eq!(result.stdout, "partial\n");
        assert_eq!(result.stderr, "oops\n");
        assert!(result.spawn_error.is_none());
    }

    #[test]
    fn signal_death_is_not_success() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("die.sh");
        write_executable(&script, "#!/bin/sh\nkill -9 $$\n");

        let result = run(&Launcher::new(), &script);
        assert!(!result.succeeded());
        assert_eq!(result.status, ExitState::Signaled(9));
        assert_eq!(result.exit_code(), None);
    }

    #[test]
    fn stdin_is_empty() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("cat.sh");
        write_executable(&script, "#!/bin/sh\ncat\necho done\n");

        let result = run(&Launcher::new(), &script);
        assert!(result.succeeded());
        assert_eq!(result.stdout, "done\n");
    }

    #[test]
    fn concurrent_launches_are_isolated() {
        let root = TempDir::new().unwrap();
        let slow = root.path().join("slow.sh");
        let fast = root.path().join("fast.sh");
        write_executable(&slow, "#!/bin/sh\nsleep 1\necho slow-out\necho slow-err >&2\n");
        write_executable(&fast, "#!/bin/sh\necho fast-out\necho fast-err >&2\n");

        let launcher = Launcher::new();
        let (tx, rx) = mpsc::channel();
        let tx_fast = tx.clone();
        launcher.launch(&slow, move |r| tx.send(("slow", r)).unwrap());
        launcher.launch(&fast, move |r| tx_fast.send(("fast", r)).unwrap());

        let mut results: HashMap<&str, LaunchResult> = HashMap::new();
        for _ in 0..2 {
            let (tag, result) = rx.recv_timeout(TIMEOUT).unwrap();
            results.insert(tag, result);
        }
        assert_eq!(results["fast"].stdout, "fast-out\n");
        assert_eq!(results["fast"].stderr, "fast-err\n");
        assert_eq!(results["slow"].stdout, "slow-out\n");
        assert_eq!(results["slow"].stderr, "slow-err\n");
    }

    #[test]
    fn cancel_terminates_running_child() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("hang.sh");
        write_executable(&script, "#!/bin/sh\nexec sleep 30\n");

        let launcher = Launcher::new();
        let (tx, rx) = mpsc::channel();
        let handle = launcher.launch(&script, move |r| tx.send(r).unwrap());
        assert!(handle.pid().is_some());
        assert_eq!(launcher.running(), 1);
        assert!(handle.cancel());

        let result = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(result.status, ExitState::Signaled(Signal::SIGTERM as i32));
        assert!(!result.succeeded());
        assert!(!handle.cancel());
    }

    #[test]
    fn terminate_all_signals_every_child() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("hang.sh");
        write_executable(&script, "#!/bin/sh\nexec sleep 30\n");

        let launcher = Launcher::new();
        let (tx, rx) = mpsc::channel();
        for _ in 0..2 {
            let tx = tx.clone();
            launcher.launch(&script, move |r| tx.send(r).unwrap());
        }
        assert_eq!(launcher.terminate_all(), 2);
        for _ in 0..2 {
            let result = rx.recv_timeout(TIMEOUT).unwrap();
            assert_eq!(result.status, ExitState::Signaled(Signal::SIGTERM as i32));
        }
        assert_eq!(launcher.running(), 0);
    }
}
