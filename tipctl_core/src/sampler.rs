//! Sample-ready notification between the ADC side and the control task.
//!
//! `notification_channel()` gives a `SampleNotifier` (ADC side, cheap to
//! clone) and a `NotifyGate` (control side, implements `SampleGate`).
//! Notifications coalesce like a task-notify counter cleared on take: any
//! number of raises between two waits count as one sample.
//!
//! `PacedNotifier` spawns a thread that raises the notification at a fixed
//! rate, standing in for the ADC conversion-complete interrupt. The thread is
//! shut down and joined when the `PacedNotifier` is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tipctl_traits::clock::{Clock, Tick, ticks_to_duration};
use tipctl_traits::{SampleGate, SampleWait};

#[derive(Debug, Clone)]
pub struct SampleNotifier {
    tx: xch::Sender<()>,
}

impl SampleNotifier {
    /// Raise the notification. Returns `false` once the gate is gone.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(xch::TrySendError::Full(())) => true,
            Err(xch::TrySendError::Disconnected(())) => false,
        }
    }
}

#[derive(Debug)]
pub struct NotifyGate {
    rx: xch::Receiver<()>,
}

impl SampleGate for NotifyGate {
    fn wait_for_sample(&mut self, timeout: Tick) -> SampleWait {
        match self.rx.recv_timeout(ticks_to_duration(timeout)) {
            Ok(()) => SampleWait::Ready,
            Err(xch::RecvTimeoutError::Timeout) => SampleWait::Timeout,
            Err(xch::RecvTimeoutError::Disconnected) => {
                // No producer left: behave like a stalled ADC, not a busy loop.
                std::thread::sleep(ticks_to_duration(timeout));
                SampleWait::Timeout
            }
        }
    }
}

pub fn notification_channel() -> (SampleNotifier, NotifyGate) {
    let (tx, rx) = xch::bounded(1);
    (SampleNotifier { tx }, NotifyGate { rx })
}

pub struct PacedNotifier {
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl PacedNotifier {
    pub fn spawn<C: Clock + Send + Sync + 'static>(
        notifier: SampleNotifier,
        hz: u32,
        clock: C,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let paused = Arc::new(AtomicBool::new(false));
        let paused_clone = paused.clone();
        let period = crate::util::period_ticks(hz);

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sample notifier received shutdown signal");
                    break;
                }
                clock.sleep(period);
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                if paused_clone.load(Ordering::Relaxed) {
                    continue;
                }
                if !notifier.notify() {
                    tracing::debug!("sample gate dropped, notifier exiting");
                    break;
                }
            }
            tracing::trace!("sample notifier thread exiting cleanly");
        });

        Self {
            shutdown,
            paused,
            join_handle: Some(join_handle),
        }
    }

    /// Stop raising notifications without ending the thread (simulates a stalled ADC).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }
}

impl Drop for PacedNotifier {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread wakes at most one period later.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sample notifier joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "sample notifier panicked during shutdown");
                }
            }
        }
    }
}
