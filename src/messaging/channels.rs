// Lock-free channels between the audio thread and the front end

use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_notification_channel_is_bounded() {
        let (mut tx, mut rx) = create_notification_channel(2);
        for i in 0..3 {
            let notif = Notification::info(NotificationCategory::Generic, format!("n{}", i));
            let _ = tx.try_push(notif);
        }
        assert_eq!(rx.try_pop().map(|n| n.message), Some("n0".to_string()));
        assert_eq!(rx.try_pop().map(|n| n.message), Some("n1".to_string()));
        assert!(rx.try_pop().is_none());
    }
}
