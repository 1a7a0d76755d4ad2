use crate::domains::notification::types::NotificationCenter;
use log::debug;
use std::sync::{Arc, Mutex};

/// Notification center shared between a session and its expiry timers
pub type SharedNotifications = Arc<Mutex<NotificationCenter>>;

/// Waits out the center's TTL, then expires `generation`.
///
/// Returns whether the notice was cleared. A newer post in the meantime
/// leaves the center untouched.
pub async fn schedule_expiry(center: SharedNotifications, generation: u64) -> bool {
    let ttl = match center.lock() {
        Ok(center) => center.ttl(),
        Err(_) => return false,
    };

    tokio::time::sleep(ttl).await;

    match center.lock() {
        Ok(mut center) => {
            let cleared = center.expire(generation);
            debug!("Notice generation {} expiry fired (cleared: {})", generation, cleared);
            cleared
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::notification::types::NoticeKind;
    use std::time::Duration;

    fn shared(ttl_ms: u64) -> SharedNotifications {
        Arc::new(Mutex::new(NotificationCenter::new(Duration::from_millis(ttl_ms))))
    }

    #[tokio::test]
    async fn test_expiry_clears_current_notice() {
        let center = shared(20);
        let generation = center.lock().unwrap().post("done", NoticeKind::Success);

        assert!(schedule_expiry(center.clone(), generation).await);
        assert!(center.lock().unwrap().current().is_none());
    }

    #[tokio::test]
    async fn test_old_timer_leaves_newer_notice() {
        let center = shared(200);
        let first = center.lock().unwrap().post("first", NoticeKind::Error);
        let timer = tokio::spawn(schedule_expiry(center.clone(), first));

        let second = center.lock().unwrap().post("second", NoticeKind::Success);
        assert!(!timer.await.unwrap());

        // The newer notice is still the one on record
        assert!(center.lock().unwrap().expire(second));
    }
}
