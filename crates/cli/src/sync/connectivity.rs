// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability tracking.
//!
//! The monitor keeps the last known online/offline value and notifies
//! listeners on transitions only: two probes returning the same answer fire
//! nothing. A failing probe counts as offline.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A point-in-time reachability check.
pub trait Probe: Send + Sync {
    /// Returns true if the network is reachable. Must not panic or hang.
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Error building a probe from a remote URL.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid remote URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("remote URL has no host: {0}")]
    MissingHost(String),
}

/// Reachability by opening a TCP connection to the remote server.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        TcpProbe {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host and port of a `ws://` or `wss://` URL.
    pub fn from_url(url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ProbeError::MissingHost(url.to_string()))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ProbeError::MissingHost(url.to_string()))?;
        Ok(TcpProbe::new(host, port, timeout))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Probe for TcpProbe {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let connect = TcpStream::connect((self.host.as_str(), self.port));
            match tokio::time::timeout(self.timeout, connect).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::debug!(address = %self.address(), error = %e, "probe failed");
                    false
                }
                Err(_) => {
                    tracing::debug!(address = %self.address(), "probe timed out");
                    false
                }
            }
        })
    }
}

type Listener = Arc<dyn Fn(bool) + Send + Sync>;
type ListenerList = Mutex<Vec<(u64, Listener)>>;

/// Handle returned by [`ConnectivityMonitor::add_connectivity_listener`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct ListenerHandle {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl ListenerHandle {
    /// Remove the listener. Safe to call more than once, and from inside
    /// the listener itself.
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct ConnectivityMonitor {
    probe: Arc<dyn Probe>,
    online: AtomicBool,
    listeners: Arc<ListenerList>,
    next_listener: AtomicU64,
    /// Held across swap and notify so listeners see transitions in order.
    notify: Mutex<()>,
}

impl ConnectivityMonitor {
    /// Create a monitor. The device counts as offline until the first probe.
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        ConnectivityMonitor {
            probe,
            online: AtomicBool::new(false),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(1),
            notify: Mutex::new(()),
        }
    }

    /// Probe now and record the answer.
    pub async fn check_network_status(&self) -> bool {
        let online = self.probe.probe().await;
        self.record(online);
        online
    }

    /// Last known value. Never blocks.
    pub fn get_is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Record an observed reachability value, notifying listeners if it
    /// differs from the last one.
    ///
    /// Concurrent calls are serialized, so listeners never see a stale
    /// value last. Listeners must not call `record` themselves.
    pub fn record(&self, online: bool) {
        let _notify = self.notify.lock().unwrap_or_else(|e| e.into_inner());
        let previous = self.online.swap(online, Ordering::AcqRel);
        if previous == online {
            return;
        }
        tracing::info!(online, "connectivity changed");

        // Snapshot so listeners run without the list lock held
        let listeners: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(online);
        }
    }

    /// Register a callback fired with the new value on every transition.
    pub fn add_connectivity_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push((id, Arc::new(callback)));
        ListenerHandle {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Probe every `interval` until `cancel` fires. The first probe runs
    /// immediately.
    pub fn spawn_polling(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        // interval() rejects a zero period
        let interval = interval.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        monitor.check_network_status().await;
                    }
                }
            }
            tracing::debug!("connectivity polling stopped");
        })
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
