use std::time::{Duration, Instant};

/// How long a notification stays fully visible.
pub(crate) const VISIBLE_FOR: Duration = Duration::from_secs(5);
/// Length of the fade-out that follows.
pub(crate) const FADE_FOR: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotificationPhase {
    Visible,
    Fading,
}

/// A transient success message with its own dismissal deadline.
#[derive(Debug, Clone)]
pub(crate) struct Notification {
    pub(crate) id: u64,
    pub(crate) message: String,
    shown_at: Instant,
}

impl Notification {
    /// `None` once both the visible and fading windows are over.
    pub(crate) fn phase(&self, now: Instant) -> Option<NotificationPhase> {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed < VISIBLE_FOR {
            Some(NotificationPhase::Visible)
        } else if elapsed < VISIBLE_FOR + FADE_FOR {
            Some(NotificationPhase::Fading)
        } else {
            None
        }
    }
}

/// Owns every live notification. New ones stack on top of older ones; each
/// expires on its own schedule and can be dismissed early by id.
#[derive(Debug, Default)]
pub(crate) struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
}

impl NotificationCenter {
    pub(crate) fn push(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Notification {
            id,
            message: message.into(),
            shown_at: now,
        });
        id
    }

    pub(crate) fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Drop notifications whose fade has finished.
    pub(crate) fn expire(&mut self, now: Instant) {
        self.items.retain(|item| item.phase(now).is_some());
    }

    pub(crate) fn live(&self, now: Instant) -> impl Iterator<Item = (&Notification, NotificationPhase)> {
        self.items
            .iter()
            .filter_map(move |item| item.phase(now).map(|phase| (item, phase)))
    }

    /// Id of the most recently shown notification still on screen.
    pub(crate) fn newest(&self) -> Option<u64> {
        self.items.last().map(|item| item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_fades_then_disappears() {
        let start = Instant::now();
        let mut center = NotificationCenter::default();
        center.push("Database updated successfully! done", start);

        let phases: Vec<_> = center.live(start + Duration::from_secs(1)).map(|(_, p)| p).collect();
        assert_eq!(phases, [NotificationPhase::Visible]);

        let phases: Vec<_> = center
            .live(start + Duration::from_millis(5200))
            .map(|(_, p)| p)
            .collect();
        assert_eq!(phases, [NotificationPhase::Fading]);

        center.expire(start + Duration::from_millis(5500));
        assert_eq!(center.newest(), None);
    }

    #[test]
    fn overlapping_notifications_stack() {
        let start = Instant::now();
        let mut center = NotificationCenter::default();
        center.push("first", start);
        center.push("second", start + Duration::from_secs(3));

        center.expire(start + Duration::from_secs(6));
        let remaining: Vec<_> = center
            .live(start + Duration::from_secs(6))
            .map(|(n, _)| n.message.clone())
            .collect();
        assert_eq!(remaining, ["second"]);
    }

    #[test]
    fn dismiss_cancels_pending_expiry() {
        let start = Instant::now();
        let mut center = NotificationCenter::default();
        center.push("first", start);
        let id = center.push("second", start);
        assert_eq!(center.newest(), Some(id));
        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert_eq!(center.live(start).count(), 1);
    }
}
