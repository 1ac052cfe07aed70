use actix::prelude::*;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;

/// Real-time service for managing WebSocket connections and broadcasting
/// ledger changes to viewers (jackpot displays, admin dashboards).
#[derive(Clone)]
pub struct RealtimeService {
    connections: Arc<tokio::sync::RwLock<HashMap<Uuid, ConnectionInfo>>>,
    event_sender: broadcast::Sender<RealtimeEvent>,
    _event_receiver: Arc<broadcast::Receiver<RealtimeEvent>>,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: Uuid,
    pub addr: Recipient<WebSocketMessage>,
    /// None means the connection receives events for every game.
    pub subscribed_game: Option<Uuid>,
    pub connected_at: Instant,
    pub last_ping: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    GameCreated {
        game_id: Uuid,
        name: String,
        created_at: DateTime<Utc>,
    },
    GameCompleted {
        game_id: Uuid,
        total_jackpot_loss: Decimal,
        organization_net_profit: Decimal,
        completed_at: DateTime<Utc>,
    },
    WeekCreated {
        game_id: Uuid,
        week_id: Uuid,
        week_number: i32,
        created_at: DateTime<Utc>,
    },
    WinnerDeclared {
        game_id: Uuid,
        week_id: Uuid,
        week_number: i32,
        winner_name: String,
        card_selected: String,
        is_terminal: bool,
        weekly_payout: Decimal,
        ending_jackpot: Decimal,
        declared_at: DateTime<Utc>,
    },
    SaleRecorded {
        game_id: Uuid,
        week_id: Uuid,
        sale_id: Uuid,
        amount_collected: Decimal,
        recorded_at: DateTime<Utc>,
    },
    SaleUpdated {
        game_id: Uuid,
        week_id: Uuid,
        sale_id: Uuid,
        amount_collected: Decimal,
        updated_at: DateTime<Utc>,
    },
    SaleDeleted {
        game_id: Uuid,
        sale_id: Uuid,
        deleted_at: DateTime<Utc>,
    },
    ExpenseRecorded {
        game_id: Uuid,
        expense_id: Uuid,
        amount: Decimal,
        is_donation: bool,
        recorded_at: DateTime<Utc>,
    },
    /// Pushed after every mutation that changes what viewers should see,
    /// so jackpot displays update without polling.
    JackpotUpdated {
        game_id: Uuid,
        jackpot_contributions: Decimal,
        current_jackpot: Decimal,
        displayed_jackpot: Decimal,
        updated_at: DateTime<Utc>,
    },
    TotalsRefreshed {
        game_id: Uuid,
        total_sales: Decimal,
        organization_net_profit: Decimal,
        refreshed_at: DateTime<Utc>,
    },
}

impl RealtimeEvent {
    fn game_id(&self) -> Uuid {
        match self {
            RealtimeEvent::GameCreated { game_id, .. }
            | RealtimeEvent::GameCompleted { game_id, .. }
            | RealtimeEvent::WeekCreated { game_id, .. }
            | RealtimeEvent::WinnerDeclared { game_id, .. }
            | RealtimeEvent::SaleRecorded { game_id, .. }
            | RealtimeEvent::SaleUpdated { game_id, .. }
            | RealtimeEvent::SaleDeleted { game_id, .. }
            | RealtimeEvent::ExpenseRecorded { game_id, .. }
            | RealtimeEvent::JackpotUpdated { game_id, .. }
            | RealtimeEvent::TotalsRefreshed { game_id, .. } => *game_id,
        }
    }

    fn message_type(&self) -> &'static str {
        match self {
            RealtimeEvent::GameCreated { .. } => "game_created",
            RealtimeEvent::GameCompleted { .. } => "game_completed",
            RealtimeEvent::WeekCreated { .. } => "week_created",
            RealtimeEvent::WinnerDeclared { .. } => "winner_declared",
            RealtimeEvent::SaleRecorded { .. } => "sale_recorded",
            RealtimeEvent::SaleUpdated { .. } => "sale_updated",
            RealtimeEvent::SaleDeleted { .. } => "sale_deleted",
            RealtimeEvent::ExpenseRecorded { .. } => "expense_recorded",
            RealtimeEvent::JackpotUpdated { .. } => "jackpot_updated",
            RealtimeEvent::TotalsRefreshed { .. } => "totals_refreshed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "()")]
pub struct WebSocketMessage {
    pub message_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Messages a connected client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub message_type: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeGameMessage {
    pub game_id: Option<Uuid>,
}

impl RealtimeService {
    /// Create a new realtime service
    pub fn new() -> Self {
        let (event_sender, event_receiver) = broadcast::channel(1000);

        let service = Self {
            connections: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            event_sender,
            _event_receiver: Arc::new(event_receiver),
        };

        // Start background tasks
        let service_clone = service.clone();
        tokio::spawn(async move {
            service_clone.start_event_broadcasting().await;
        });

        let service_clone = service.clone();
        tokio::spawn(async move {
            service_clone.cleanup_stale_connections().await;
        });

        service
    }

    /// Add a new WebSocket connection
    pub async fn add_connection(&self, connection_id: Uuid, addr: Recipient<WebSocketMessage>) {
        let connection = ConnectionInfo {
            id: connection_id,
            addr,
            subscribed_game: None,
            connected_at: Instant::now(),
            last_ping: Instant::now(),
        };

        let mut connections = self.connections.write().await;
        connections.insert(connection_id, connection);

        info!("WebSocket connection added: {}", connection_id);
    }

    /// Remove a WebSocket connection
    pub async fn remove_connection(&self, connection_id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(connection_id).is_some() {
            info!("WebSocket connection removed: {}", connection_id);
        }
    }

    /// Limit a connection's events to a single game, or all games for None
    pub async fn subscribe_to_game(
        &self,
        connection_id: &Uuid,
        game_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.subscribed_game = game_id;
            debug!(
                "Connection {} subscribed to game {:?}",
                connection_id, game_id
            );
            Ok(())
        } else {
            Err(AppError::NotFound("Connection not found".to_string()))
        }
    }

    /// Update ping timestamp for a connection
    pub async fn update_ping(&self, connection_id: &Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.last_ping = Instant::now();
        }
    }

    /// Broadcast an event to all relevant connections
    pub async fn broadcast_event(&self, event: RealtimeEvent) -> Result<(), AppError> {
        let _ = self.event_sender.send(event);
        Ok(())
    }

    /// Number of live connections
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    // Private helper methods

    async fn start_event_broadcasting(&self) {
        let mut event_receiver = self.event_sender.subscribe();

        info!("Started realtime event broadcasting");

        while let Ok(event) = event_receiver.recv().await {
            self.process_and_broadcast_event(event).await;
        }

        warn!("Realtime event broadcasting stopped");
    }

    async fn process_and_broadcast_event(&self, event: RealtimeEvent) {
        let connections = self.connections.read().await;
        let mut failed_connections = Vec::new();

        for (connection_id, connection) in connections.iter() {
            let wanted = match connection.subscribed_game {
                Some(game_id) => game_id == event.game_id(),
                None => true,
            };

            if wanted {
                let message = create_websocket_message(&event);
                if connection.addr.try_send(message).is_err() {
                    failed_connections.push(*connection_id);
                }
            }
        }

        drop(connections);
        if !failed_connections.is_empty() {
            let mut connections = self.connections.write().await;
            for connection_id in failed_connections {
                connections.remove(&connection_id);
                debug!("Removed failed WebSocket connection: {}", connection_id);
            }
        }
    }

    async fn cleanup_stale_connections(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            let mut connections = self.connections.write().await;
            let stale: Vec<Uuid> = connections
                .iter()
                .filter(|(_, c)| c.last_ping.elapsed() > Duration::from_secs(300))
                .map(|(id, _)| *id)
                .collect();

            for connection_id in stale {
                connections.remove(&connection_id);
                debug!("Removed stale WebSocket connection: {}", connection_id);
            }
        }
    }
}

fn create_websocket_message(event: &RealtimeEvent) -> WebSocketMessage {
    WebSocketMessage {
        message_type: event.message_type().to_string(),
        data: serde_json::to_value(event).unwrap_or_default(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_registry_starts_empty() {
        tokio_test::block_on(async {
            let service = RealtimeService::new();
            assert_eq!(service.connection_count().await, 0);
        });
    }

    #[test]
    fn test_subscribing_an_unknown_connection_is_not_found() {
        tokio_test::block_on(async {
            let service = RealtimeService::new();
            let result = service
                .subscribe_to_game(&Uuid::new_v4(), Some(Uuid::new_v4()))
                .await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        });
    }

    #[test]
    fn test_broadcast_succeeds_without_subscribers() {
        tokio_test::block_on(async {
            let service = RealtimeService::new();
            let event = RealtimeEvent::JackpotUpdated {
                game_id: Uuid::new_v4(),
                jackpot_contributions: Decimal::new(28000, 2),
                current_jackpot: Decimal::new(40500, 2),
                displayed_jackpot: Decimal::new(65000, 2),
                updated_at: Utc::now(),
            };
            assert!(service.broadcast_event(event).await.is_ok());
        });
    }

    #[test]
    fn test_websocket_messages_carry_flat_event_payloads() {
        let game_id = Uuid::new_v4();
        let event = RealtimeEvent::WinnerDeclared {
            game_id,
            week_id: Uuid::new_v4(),
            week_number: 3,
            winner_name: "Sam".to_string(),
            card_selected: "Queen of Hearts".to_string(),
            is_terminal: true,
            weekly_payout: Decimal::new(46500, 2),
            ending_jackpot: Decimal::ZERO,
            declared_at: Utc::now(),
        };
        assert_eq!(event.game_id(), game_id);

        let message = create_websocket_message(&event);
        assert_eq!(message.message_type, "winner_declared");
        assert_eq!(message.data["type"], "winner_declared");
        assert_eq!(message.data["winner_name"], "Sam");
        assert_eq!(message.data["game_id"], game_id.to_string());
    }
}
