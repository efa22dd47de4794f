use maas_link::core::session::EventSender;
use maas_link::{
    ConnectionStatus, Connector, Link, MaasLinkResult, SessionEvent, SessionManager,
    SessionSettings, SubscriptionSet,
};
use std::time::{Duration, Instant};

/// Performance and stress tests
#[cfg(test)]
mod performance_tests {
    use super::*;

    struct NullLink;

    impl Link for NullLink {
        fn send_text(&mut self, _text: String) -> MaasLinkResult<()> {
            Ok(())
        }

        fn close(&mut self, _code: u16, _reason: &str) -> MaasLinkResult<()> {
            Ok(())
        }
    }

    struct NullConnector;

    impl Connector for NullConnector {
        fn open(
            &mut self,
            _settings: &SessionSettings,
            _connection: u64,
            _events: EventSender,
        ) -> MaasLinkResult<Box<dyn Link>> {
            Ok(Box::new(NullLink))
        }
    }

    #[tokio::test]
    async fn test_inbound_throughput() {
        let (mut manager, _events) = SessionManager::new(
            SessionSettings::default(),
            SubscriptionSet::default(),
            NullConnector,
        )
        .unwrap();
        manager.connect();
        manager.handle_event(SessionEvent::Opened { connection: 1 });

        let payload = r#"{"type":2,"name":"machine","action":"update","data":{"system_id":"abc123","status":"Deployed"}}"#;
        let count = 50_000;

        let start = Instant::now();
        for _ in 0..count {
            manager.handle_event(SessionEvent::Received {
                connection: 1,
                payload: payload.to_string(),
            });
        }
        let elapsed = start.elapsed();

        println!("Handled {} messages in {:?}", count, elapsed);
        assert_eq!(manager.stats().messages_received, count);
        assert!(elapsed < Duration::from_secs(5), "Inbound handling too slow: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_failure_storm_keeps_one_reconnect_timer() {
        let (mut manager, _events) = SessionManager::new(
            SessionSettings::default(),
            SubscriptionSet::default(),
            NullConnector,
        )
        .unwrap();

        for _ in 0..10_000 {
            manager.connect();
            let connection = manager.connection_id().unwrap();
            manager.handle_event(SessionEvent::Failed {
                connection,
                reason: "connection reset".to_string(),
            });
        }

        assert_eq!(manager.status(), ConnectionStatus::Error);
        assert_eq!(manager.reconnect_timers_started(), 1);
        assert_eq!(manager.stats().connect_attempts, 10_000);
    }

    #[tokio::test]
    async fn test_reconnect_cycles_replay_every_time() {
        let (mut manager, _events) = SessionManager::new(
            SessionSettings::default(),
            SubscriptionSet::default(),
            NullConnector,
        )
        .unwrap();

        for _ in 0..1_000 {
            manager.connect();
            let connection = manager.connection_id().unwrap();
            manager.handle_event(SessionEvent::Opened { connection });
            manager.handle_event(SessionEvent::Closed {
                connection,
                code: 1006,
                reason: String::new(),
            });
        }

        assert_eq!(manager.stats().opens, 1_000);
        assert_eq!(manager.stats().messages_sent, 4_000);
        assert!(manager.reconnect_pending());
    }
}
