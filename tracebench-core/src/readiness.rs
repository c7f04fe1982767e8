// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Readiness notifications from spawned daemons.
//!
//! A probe is armed *before* the daemon is spawned so a notification sent
//! right after exec is never lost, then awaited with an explicit timeout.
//!
//! Two channels are supported:
//! - **signal**: the daemon signals its parent (e.g. `lttng-sessiond
//!   --sig-parent` sends `SIGUSR1`). A tokio signal watcher observes it. Once
//!   registered, the watcher's handler stays installed for the lifetime of the
//!   process, so a late signal never falls back to the default action.
//! - **socket**: the daemon connects to the Unix socket named by
//!   `TRACEBENCH_READY_SOCKET` and writes `READY`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::error::ReadinessError;
use crate::types::ReadySignal;

/// Environment variable carrying the readiness socket path.
pub const READY_SOCKET_ENV: &str = "TRACEBENCH_READY_SOCKET";

/// Ready message expected on the socket.
const READY_MESSAGE: &[u8] = b"READY";

/// How a daemon announces that it is ready.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case", deny_unknown_fields)]
pub enum ReadinessProbe {
    /// The daemon sends a signal to its parent.
    Signal {
        #[serde(default)]
        signal: ReadySignal,
    },
    /// The daemon writes `READY` to a Unix socket.
    Socket,
}

impl ReadinessProbe {
    /// Start listening for the notification. Must be called from within a
    /// tokio runtime, before the daemon is spawned.
    pub fn arm(&self) -> Result<ArmedProbe, ReadinessError> {
        match self {
            Self::Signal { signal: ready } => {
                let stream = signal(SignalKind::from_raw(ready.signal() as i32)).map_err(|e| {
                    ReadinessError::Watch {
                        signal: ready.name(),
                        source: e,
                    }
                })?;
                Ok(ArmedProbe::Signal {
                    signal: *ready,
                    stream,
                })
            }
            Self::Socket => {
                let dir = tempfile::Builder::new()
                    .prefix("tracebench-ready-")
                    .tempdir()
                    .map_err(|e| ReadinessError::Socket {
                        reason: format!("Failed to create socket directory: {}", e),
                    })?;
                let path = dir.path().join("ready.sock");
                let listener = UnixListener::bind(&path).map_err(|e| ReadinessError::Socket {
                    reason: format!("Failed to bind socket {}: {}", path.display(), e),
                })?;
                Ok(ArmedProbe::Socket {
                    _dir: dir,
                    path,
                    listener,
                })
            }
        }
    }
}

/// A probe that is listening for a notification.
#[derive(Debug)]
pub enum ArmedProbe {
    /// Watching a signal.
    Signal { signal: ReadySignal, stream: Signal },
    /// Accepting on a socket inside a private temp directory.
    Socket {
        _dir: tempfile::TempDir,
        path: PathBuf,
        listener: UnixListener,
    },
    /// No notification: ready as soon as the process exists.
    Immediate,
}

impl ArmedProbe {
    /// Environment variable the child needs to reach this probe, if any.
    pub fn child_env(&self) -> Option<(&'static str, &Path)> {
        match self {
            Self::Socket { path, .. } => Some((READY_SOCKET_ENV, path.as_path())),
            Self::Signal { .. } | Self::Immediate => None,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Signal { signal, .. } => format!("signal {}", signal),
            Self::Socket { path, .. } => format!("socket {}", path.display()),
            Self::Immediate => "immediate".to_string(),
        }
    }

    /// Wait for the notification. Returns the instant it was observed.
    pub async fn wait(&mut self, timeout: Duration) -> Result<Instant, ReadinessError> {
        match self {
            Self::Immediate => Ok(Instant::now()),
            Self::Signal { stream, .. } => match tokio::time::timeout(timeout, stream.recv()).await
            {
                Ok(Some(())) => Ok(Instant::now()),
                Ok(None) => Err(ReadinessError::Closed),
                Err(_) => Err(ReadinessError::Timeout { timeout }),
            },
            Self::Socket { listener, .. } => {
                match tokio::time::timeout(timeout, accept_ready(listener)).await {
                    Ok(result) => result,
                    Err(_) => Err(ReadinessError::Timeout { timeout }),
                }
            }
        }
    }
}

/// Accept connections until one of them says READY.
async fn accept_ready(listener: &UnixListener) -> Result<Instant, ReadinessError> {
    loop {
        let (mut stream, _) = listener
            .accept()
            .await
            .map_err(|e| ReadinessError::Socket {
                reason: format!("Accept error: {}", e),
            })?;

        // The message may arrive in several writes
        let mut buf = [0u8; READY_MESSAGE.len()];
        match stream.read_exact(&mut buf).await {
            Ok(_) if &buf[..] == READY_MESSAGE => return Ok(Instant::now()),
            Ok(_) => {
                tracing::debug!(message = ?buf, "Ignoring readiness connection without READY");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Readiness connection closed before READY");
            }
        }
    }
}
