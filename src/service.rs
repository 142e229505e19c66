use std::sync::Arc;
use std::thread;
use log::{info, warn};
use crate::config::{Config, NotifyMode};
use crate::executor::{ExitState, LaunchHandle, LaunchResult, Launcher};
use crate::logsink::LogSink;
use crate::model::ScriptEntry;
use crate::notify::{DesktopNotifier, Notifier};
use crate::sources::scripts::{ScanOptions, ScriptsSource};
use crate::sources::Source;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Leave running scripts alone; their results still get logged.
    #[default]
    Detach,
    /// SIGTERM every script still running.
    Terminate,
}

#[derive(Clone)]
struct SideEffects {
    notify_mode: NotifyMode,
    notifier: Arc<dyn Notifier>,
    log: Option<Arc<LogSink>>,
}

impl SideEffects {
    fn apply(&self, script_name: &str, result: &LaunchResult) {
        if let Err(e) = self.notifier.notify(script_name, result, self.notify_mode) {
            warn!("{}", e);
        }
        if let Some(log) = &self.log {
            if let Err(e) = log.append(script_name, &result.stdout, &result.stderr) {
                warn!("{}", e);
            }
        }
    }
}

/// Scanner, launcher and side effects bound to one configuration.
pub struct ScriptService {
    source: Option<ScriptsSource>,
    launcher: Launcher,
    effects: SideEffects,
}

impl ScriptService {
    pub fn new(config: &Config) -> Self {
        Self::with_notifier(config, Arc::new(DesktopNotifier))
    }

    pub fn with_notifier(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let source = config.general.directory.clone().map(|directory| ScriptsSource {
            directory,
            options: ScanOptions::from(&config.menu),
        });
        let log = config
            .general
            .logging
            .then(|| Arc::new(LogSink::new(config.general.log_path())));

        Self {
            source,
            launcher: Launcher::new(),
            effects: SideEffects {
                notify_mode: config.general.notify,
                notifier,
                log,
            },
        }
    }

    /// Fresh listing on every call.
    pub fn scan(&self) -> Vec<ScriptEntry> {
        match &self.source {
            Some(source) => source.scan(),
            None => {
                info!("No scripts directory configured");
                vec![]
            }
        }
    }

    pub fn launch<F>(&self, entry: &ScriptEntry, on_complete: F) -> LaunchHandle
    where
        F: FnOnce(LaunchResult) + Send + 'static,
    {
        let effects = self.effects.clone();
        let name = entry.name.clone();
        info!("Launching {}", name);
        self.launcher.launch(&entry.path, move |result| {
            // spawn failures arrive on the caller's thread
            let on_caller = result.status == ExitState::NotStarted;
            let finish = move || {
                effects.apply(&name, &result);
                on_complete(result);
            };
            if on_caller {
                thread::spawn(finish);
            } else {
                finish();
            }
        })
    }

    pub fn running(&self) -> usize {
        self.launcher.running()
    }

    pub fn dispose(self, policy: ShutdownPolicy) {
        let running = self.running();
        match policy {
            ShutdownPolicy::Detach if running > 0 => {
                info!("Shutting down with {} script(s) still running", running)
            }
            ShutdownPolicy::Detach => {}
            ShutdownPolicy::Terminate => {
                let n = self.launcher.terminate_all();
                info!("Shutting down, terminated {} script(s)", n);
            }
        }
    }
}
