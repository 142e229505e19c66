use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use chrono::{DateTime, Local};
use crate::error::LogError;

/// Append-only run log. One mutex-guarded `write_all` per record keeps
/// concurrent completions from interleaving.
pub struct LogSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LogSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: Mutex::new(()) }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, script_name: &str, stdout: &str, stderr: &str) -> Result<(), LogError> {
        let record = format_record(script_name, Local::now(), stdout, stderr);

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open { path: self.path.clone(), source })?;
        file.write_all(record.as_bytes())
            .map_err(|source| LogError::Write { path: self.path.clone(), source })
    }
}

pub fn format_record(script_name: &str, at: DateTime<Local>, stdout: &str, stderr: &str) -> String {
    let mut record = format!("\n[{}]: {}\n", script_name, at.format("%a %b %d %Y %H:%M:%S %z"));
    push_block(&mut record, "STDOUT:", stdout);
    push_block(&mut record, "STDERR:", stderr);
    record
}

fn push_block(record: &mut String, header: &str, text: &str) {
    record.push_str(header);
    record.push('\n');
    record.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        record.push('\n');
    }
}
