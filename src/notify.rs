use crate::config::{NotifyMode, APP_NAME};
use crate::error::NotifyError;
use crate::executor::{ExitState, LaunchResult};
use log::info;

pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        script_name: &str,
        result: &LaunchResult,
        mode: NotifyMode,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub summary: String,
    pub body: String,
}

/// What to show for a finished launch, or `None` when notifications are off.
pub fn message(script_name: &str, result: &LaunchResult, mode: NotifyMode) -> Option<Message> {
    if mode == NotifyMode::Off {
        return None;
    }

    let summary = if result.succeeded() {
        format!("{} finished", script_name)
    } else {
        let why = match (&result.spawn_error, result.status) {
            (Some(err), _) => format!("could not start: {}", err),
            (None, ExitState::Exited(code)) => format!("exit {}", code),
            (None, ExitState::Signaled(sig)) => format!("killed by signal {}", sig),
            (None, ExitState::NotStarted) => "did not run".to_string(),
        };
        format!("{} failed ({})", script_name, why)
    };

    let body = match mode {
        NotifyMode::FullOutput => {
            let mut body = String::new();
            if !result.stdout.is_empty() {
                body.push_str(result.stdout.trim_end());
            }
            if !result.stderr.is_empty() {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(result.stderr.trim_end());
            }
            body
        }
        _ => String::new(),
    };

    Some(Message { summary, body })
}

/// Desktop notifications over the freedesktop notification service.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(
        &self,
        script_name: &str,
        result: &LaunchResult,
        mode: NotifyMode,
    ) -> Result<(), NotifyError> {
        let Some(msg) = message(script_name, result, mode) else {
            return Ok(());
        };
        notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(&msg.summary)
            .body(&msg.body)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Desktop(e.to_string()))
    }
}

/// Writes notifications to the log instead of the desktop.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        script_name: &str,
        result: &LaunchResult,
        mode: NotifyMode,
    ) -> Result<(), NotifyError> {
        if let Some(msg) = message(script_name, result, mode) {
            if msg.body.is_empty() {
                info!("{}", msg.summary);
            } else {
                info!("{}\n{}", msg.summary, msg.body);
            }
        }
        Ok(())
    }
}
