/**
 * Audit Trail
 *
 * Failed requests are appended as JSON lines to
 * `<dir>/audit-YYYY-MM-DD.log`. The file rolls over at UTC midnight. Writes
 * are serialised by one mutex; a write failure is logged and never fails the
 * request that triggered it.
 *
 * Captured request bodies are sanitised first: the value of any key that
 * looks like a credential (password, token, secret, OTP, code, API key) is
 * replaced by a mask, at any depth.
 */

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

const MASK: &str = "******";
const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "otp", "code", "api_key", "api-key", "apikey"];

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub time: String,
    pub transactionid: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
}

struct OpenLog {
    date: String,
    file: File,
}

pub struct AuditLog {
    dir: PathBuf,
    current: Mutex<Option<OpenLog>>,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one entry; errors are logged and swallowed.
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.append(entry) {
            tracing::error!("Failed to write audit entry {}: {}", entry.transactionid, e);
        }
    }

    fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry).map_err(std::io::Error::other)?;
        line.push(b'\n');

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut current = self
            .current
            .lock()
            .map_err(|_| std::io::Error::other("audit log mutex poisoned"))?;

        let needs_open = current.as_ref().map_or(true, |open| open.date != today);
        if needs_open {
            std::fs::create_dir_all(&self.dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.dir.join(format!("audit-{}.log", today)))?;
            *current = Some(OpenLog { date: today, file });
        }

        match current.as_mut() {
            Some(open) => {
                open.file.write_all(&line)?;
                open.file.flush()
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").field("dir", &self.dir).finish()
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|needle| key.contains(needle))
}

/// Copy of `value` with credential-like members masked
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive(key) && !value.is_null() {
                        Value::String(MASK.to_string())
                    } else {
                        sanitize(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}
