use tokio::sync::broadcast;

/// Buffered events per subscriber before slow receivers start lagging.
const FEED_CAPACITY: usize = 64;

/// Table touched by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Employees,
    Sales,
    Availability,
    Appointments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
}

/// In-process notification of writes, one event per committed change.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, table: Table) {
        // No subscribers is fine
        let _ = self.sender.send(ChangeEvent { table });
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish(Table::Sales);

        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent {
                table: Table::Sales
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        ChangeFeed::new().publish(Table::Employees);
    }
}
