//! Attempt timers.
//!
//! Each timer is a tokio task that reports into the session's timer
//! channel. Events carry the id of the attempt that started them so the
//! session can drop events that arrive after their attempt moved on. The
//! task is aborted when its handle is dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::attempt::AttemptId;

/// Something a timer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second of the countdown elapsed.
    Tick {
        /// Attempt the countdown belongs to.
        attempt: AttemptId,
        /// Seconds left.
        remaining: u32,
    },
    /// The countdown reached zero.
    Expired {
        /// Attempt the countdown belongs to.
        attempt: AttemptId,
    },
    /// The result display delay is over.
    DisplayDone {
        /// Attempt whose result was shown.
        attempt: AttemptId,
    },
}

impl TimerEvent {
    /// The attempt this event belongs to.
    pub fn attempt(&self) -> AttemptId {
        match self {
            Self::Tick { attempt, .. } | Self::Expired { attempt } | Self::DisplayDone { attempt } => {
                *attempt
            }
        }
    }
}

/// A running timer task, aborted on drop.
#[derive(Debug)]
pub struct TimerTask {
    handle: JoinHandle<()>,
}

impl TimerTask {
    /// Count down from `secs`, one tick per second, then report expiry.
    /// A zero-second countdown expires at once.
    pub fn countdown(attempt: AttemptId, secs: u32, tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let handle = tokio::spawn(async move {
            if secs == 0 {
                let _ = tx.send(TimerEvent::Expired { attempt });
                return;
            }
            let mut interval = time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            let mut remaining = secs;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                let event = if remaining == 0 {
                    TimerEvent::Expired { attempt }
                } else {
                    TimerEvent::Tick { attempt, remaining }
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        });
        Self { handle }
    }

    /// Report once `delay` has passed.
    pub fn display(attempt: AttemptId, delay: Duration, tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(TimerEvent::DisplayDone { attempt });
        });
        Self { handle }
    }

}

impl Drop for TimerTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_then_expires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = AttemptId(1);
        let _timer = TimerTask::countdown(id, 3, tx);
        assert_eq!(
            rx.recv().await,
            Some(TimerEvent::Tick {
                attempt: id,
                remaining: 2
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(TimerEvent::Tick {
                attempt: id,
                remaining: 1
            })
        );
        assert_eq!(rx.recv().await, Some(TimerEvent::Expired { attempt: id }));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_second_countdown_expires_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = time::Instant::now();
        let _timer = TimerTask::countdown(AttemptId(4), 0, tx);
        assert_eq!(
            rx.recv().await,
            Some(TimerEvent::Expired {
                attempt: AttemptId(4)
            })
        );
        assert_eq!(rx.recv().await, None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_aborts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TimerTask::countdown(AttemptId(2), 30, tx);
        drop(timer);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn display_delay_reports_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = time::Instant::now();
        let _timer = TimerTask::display(AttemptId(3), Duration::from_millis(2500), tx);
        assert_eq!(
            rx.recv().await,
            Some(TimerEvent::DisplayDone {
                attempt: AttemptId(3)
            })
        );
        assert!(start.elapsed() >= Duration::from_millis(2500));
    }
}
