//! Blocking bounded waits.

use std::thread;
use std::time::{Duration, Instant};

/// Call `probe` until it returns `true` or `timeout` elapses, sleeping
/// `interval` between attempts.
///
/// The probe always runs at least once, even with a zero timeout. A timeout
/// too large to represent as a deadline means waiting without one.
/// Returns whether the probe eventually succeeded.
pub fn poll_until<F>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now().checked_add(timeout);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        if probe() {
            tracing::debug!(attempt, "probe succeeded");
            return true;
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!(attempt, "probe deadline reached");
                    return false;
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        thread::sleep(pause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_on_first_success() {
        let mut calls = 0;
        let ok = poll_until(Duration::from_secs(5), Duration::from_secs(1), || {
            calls += 1;
            true
        });
        assert!(ok);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_success() {
        let mut calls = 0;
        let ok = poll_until(Duration::from_secs(5), Duration::from_millis(1), || {
            calls += 1;
            calls == 3
        });
        assert!(ok);
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_deadline() {
        let start = Instant::now();
        let ok = poll_until(Duration::from_millis(30), Duration::from_millis(5), || false);
        assert!(!ok);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn zero_timeout_probes_once() {
        let mut calls = 0;
        let ok = poll_until(Duration::ZERO, Duration::from_secs(1), || {
            calls += 1;
            false
        });
        assert!(!ok);
        assert_eq!(calls, 1);
    }

    #[test]
    fn unbounded_timeout_keeps_polling() {
        let mut calls = 0;
        let ok = poll_until(Duration::MAX, Duration::from_millis(1), || {
            calls += 1;
            calls == 2
        });
        assert!(ok);
        assert_eq!(calls, 2);
    }
}
