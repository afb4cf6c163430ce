use {crate::utils::AppInstant, std::time::Duration};

/// Pending-frame guard: at most one update per rendered frame.
///
/// Inputs submitted while a frame is already pending replace the captured value
/// without scheduling another frame.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this call scheduled a new frame.
    pub fn submit(&mut self, value: T) -> bool {
        let scheduled = self.pending.is_none();
        self.pending = Some(value);
        scheduled
    }

    /// Consume the latest value when the frame runs.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Time throttle: admits an event only if `min_interval` passed since the last admitted one.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    min_interval: Duration,
    last: Option<AppInstant>,
}

impl IntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn admit(&mut self, now: AppInstant) -> bool {
        if let Some(last) = self.last
            && now.saturating_duration_since(last) < self.min_interval
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_wins_within_a_frame() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.submit(1));
        assert!(!throttle.submit(2));
        assert!(!throttle.submit(3));
        assert_eq!(throttle.take(), Some(3));
        assert_eq!(throttle.take(), None);
        assert!(throttle.submit(4));
    }

    #[test]
    fn cancel_drops_pending_value() {
        let mut throttle = FrameThrottle::new();
        throttle.submit("move");
        throttle.cancel();
        assert!(!throttle.is_pending());
        assert_eq!(throttle.take(), None);
    }

    #[test]
    fn gate_enforces_minimum_interval() {
        let mut gate = IntervalGate::new(Duration::from_millis(16));
        let t0 = AppInstant::now();
        assert!(gate.admit(t0));
        assert!(!gate.admit(t0 + Duration::from_millis(5)));
        assert!(!gate.admit(t0 + Duration::from_millis(15)));
        assert!(gate.admit(t0 + Duration::from_millis(16)));
        assert!(!gate.admit(t0 + Duration::from_millis(20)));
    }
}
