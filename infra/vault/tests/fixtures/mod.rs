#![allow(dead_code)]

use parking_lot::Mutex;
use readonce_vault::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::io;
use std::sync::Arc;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`].
///
/// # Errors
/// * If the password is too short.
#[allow(clippy::ptr_arg)]
pub fn min_password_len(value: &String) -> Result<(), Cow<'static, str>> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {MIN_PASSWORD_LEN} characters").into());
    }
    Ok(())
}

#[read_once(label = "db.password", validate = min_password_len)]
pub struct Password(String);

#[read_once(label = "db.uri")]
pub struct DbUri(String);

#[read_once(label = "db.host")]
pub struct DbHost(String);

#[read_once(label = "db.port")]
pub struct DbPort(u16);

/// A plain record composed of read-once values.
#[derive(Debug, Serialize)]
pub struct DbCredentials {
    pub password: Password,
    pub uri: DbUri,
    pub port: DbPort,
    pub host: DbHost,
}

/// Builds a complete set of database credentials for testing.
/// # Panics
/// * If any of the values is rejected.
#[must_use]
pub fn db_credentials() -> DbCredentials {
    DbCredentials {
        password: Password::new("db-password".to_owned()).expect("password should be sealed"),
        uri: DbUri::new("mysql://".to_owned()).expect("uri should be sealed"),
        port: DbPort::new(3306).expect("port should be sealed"),
        host: DbHost::new("localhost".to_owned()).expect("host should be sealed"),
    }
}

/// Collects everything a `tracing` subscriber writes.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a debug-level subscriber that writes into the returned buffer.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}
