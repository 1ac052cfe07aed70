use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use queen_of_hearts_shared::{WS_CLIENT_TIMEOUT_SECONDS, WS_HEARTBEAT_INTERVAL_SECONDS};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::realtime_service::{
    ClientMessage, RealtimeService, SubscribeGameMessage, WebSocketMessage,
};

/// WebSocket actor for handling individual connections
pub struct WebSocketActor {
    id: Uuid,
    manager: RealtimeService,
    hb: Instant,
}

impl WebSocketActor {
    pub fn new(manager: RealtimeService) -> Self {
        Self {
            id: Uuid::new_v4(),
            manager,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(
            Duration::from_secs(WS_HEARTBEAT_INTERVAL_SECONDS),
            |act, ctx| {
                if Instant::now().duration_since(act.hb)
                    > Duration::from_secs(WS_CLIENT_TIMEOUT_SECONDS)
                {
                    info!("WebSocket heartbeat failed, disconnecting: {}", act.id);
                    ctx.stop();
                    return;
                }

                ctx.ping(b"");
            },
        );
    }

    fn handle_client_message(&self, msg: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::from_str::<ClientMessage>(msg) {
            Ok(client_msg) => match client_msg.message_type.as_str() {
                "subscribe_game" => {
                    if let Ok(subscribe_msg) =
                        serde_json::from_value::<SubscribeGameMessage>(client_msg.data)
                    {
                        let manager = self.manager.clone();
                        let connection_id = self.id;

                        ctx.spawn(
                            async move {
                                if let Err(e) = manager
                                    .subscribe_to_game(&connection_id, subscribe_msg.game_id)
                                    .await
                                {
                                    warn!("Failed to update game subscription: {}", e);
                                }
                            }
                            .into_actor(self),
                        );
                    }
                }
                "ping" => {
                    let manager = self.manager.clone();
                    let connection_id = self.id;

                    ctx.spawn(
                        async move {
                            manager.update_ping(&connection_id).await;
                        }
                        .into_actor(self),
                    );

                    let pong_msg = WebSocketMessage {
                        message_type: "pong".to_string(),
                        data: serde_json::json!({"timestamp": chrono::Utc::now().timestamp()}),
                        timestamp: chrono::Utc::now(),
                    };

                    if let Ok(json) = serde_json::to_string(&pong_msg) {
                        ctx.text(json);
                    }
                }
                _ => {
                    warn!("Unknown message type: {}", client_msg.message_type);
                }
            },
            Err(e) => {
                warn!("Failed to parse client message: {}", e);
            }
        }
    }
}

impl Actor for WebSocketActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);

        let manager = self.manager.clone();
        let connection_id = self.id;
        let addr = ctx.address().recipient();

        ctx.spawn(
            async move {
                manager.add_connection(connection_id, addr).await;
            }
            .into_actor(self),
        );

        info!("WebSocket connection started: {}", self.id);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let manager = self.manager.clone();
        let connection_id = self.id;

        tokio::spawn(async move {
            manager.remove_connection(&connection_id).await;
        });

        info!("WebSocket connection stopped: {}", self.id);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WebSocketActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_client_message(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket connection closed: {:?}", reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl Handler<WebSocketMessage> for WebSocketActor {
    type Result = ();

    fn handle(&mut self, msg: WebSocketMessage, ctx: &mut Self::Context) {
        if let Ok(json) = serde_json::to_string(&msg) {
            ctx.text(json);
        }
    }
}

/// WebSocket endpoint handler
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    manager: web::Data<RealtimeService>,
) -> Result<HttpResponse, Error> {
    let actor = WebSocketActor::new(manager.get_ref().clone());
    ws::start(actor, &req, stream)
}

/// Get WebSocket connection statistics
pub async fn websocket_stats(
    manager: web::Data<RealtimeService>,
) -> Result<HttpResponse, Error> {
    let connections = manager.connection_count().await;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "active_connections": connections,
    })))
}
