//! Server-streaming order feed.
//!
//! [`OrderEventStream`] bridges one long-lived call to a shop event bus
//! subscription: it applies the caller's status filter and forwards what
//! passes until the call's cancellation token fires. The SSE handler at the
//! bottom is the HTTP front for it.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use bazaar_domain::{OrderEvent, ShopId, StatusFilter};
use bazaar_shared::{OrderEventData, ServerMessage};

use super::http::{authenticate, ApiError};
use crate::app::App;
use crate::infrastructure::event_bus::{ShopEventBus, Subscription};

/// Buffer between the forwarding task and the HTTP response body.
const SSE_CHANNEL_BUFFER: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The caller went away.
    #[error("stream receiver closed")]
    Closed,
    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// Transport-side sink for one streaming call.
#[async_trait]
pub trait EventForwarder: Send {
    async fn forward(&mut self, event: &OrderEvent) -> Result<(), ForwardError>;
}

/// A filtered bus subscription bound to one streaming call.
pub struct OrderEventStream {
    subscription: Subscription,
    filter: StatusFilter,
}

impl OrderEventStream {
    /// Subscribe immediately so no event committed after this call is missed.
    pub fn open(bus: &ShopEventBus, shop_id: ShopId, filter: StatusFilter) -> Self {
        Self {
            subscription: bus.subscribe(shop_id),
            filter,
        }
    }

    pub fn shop_id(&self) -> ShopId {
        self.subscription.shop_id()
    }

    /// Forward matching events until `cancel` fires or the subscription ends.
    ///
    /// Returns the number of events forwarded. A forwarding failure ends the
    /// loop and is returned as-is; the subscription is released either way.
    pub async fn run<F>(
        mut self,
        cancel: CancellationToken,
        forwarder: &mut F,
    ) -> Result<u64, ForwardError>
    where
        F: EventForwarder + ?Sized,
    {
        let shop_id = self.shop_id();
        let mut forwarded = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.subscription.cancel();
                    tracing::debug!(shop_id = %shop_id, forwarded, "Order stream cancelled");
                    return Ok(forwarded);
                }
                next = self.subscription.recv() => {
                    let Some(event) = next else {
                        return Ok(forwarded);
                    };
                    if !self.filter.accepts(&event) {
                        continue;
                    }
                    forwarder.forward(&event).await?;
                    forwarded += 1;
                }
            }
        }
    }
}

/// Forwards events as named SSE events carrying `{kind, order}` JSON.
pub struct SseForwarder {
    tx: mpsc::Sender<Event>,
}

impl SseForwarder {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventForwarder for SseForwarder {
    async fn forward(&mut self, event: &OrderEvent) -> Result<(), ForwardError> {
        let data = OrderEventData::from(event);
        let sse = Event::default()
            .event(ServerMessage::type_name_for(data.kind))
            .json_data(&data)
            .map_err(|e| ForwardError::Encode(e.to_string()))?;
        self.tx.send(sse).await.map_err(|_| ForwardError::Closed)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamQuery {
    status: Option<String>,
}

/// `GET /api/shops/{shop_id}/orders/stream?status=a,b`
pub(crate) async fn stream_orders(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let actor = authenticate(&app, &headers)?;
    let shop_id = ShopId::from_uuid(shop_id);
    if !actor.can_access(shop_id) {
        return Err(ApiError::Forbidden);
    }
    let filter = match query.status.as_deref() {
        Some(raw) => raw
            .parse::<StatusFilter>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => StatusFilter::all(),
    };

    let stream = OrderEventStream::open(&app.events, shop_id, filter);
    let cancel = app.shutdown.child_token();
    let call_guard = cancel.clone().drop_guard();
    let (tx, rx) = mpsc::channel(SSE_CHANNEL_BUFFER);

    tracing::info!(shop_id = %shop_id, user_id = %actor.user_id, "Order stream opened");
    tokio::spawn(async move {
        let mut forwarder = SseForwarder::new(tx);
        match stream.run(cancel, &mut forwarder).await {
            Ok(forwarded) => {
                tracing::info!(shop_id = %shop_id, forwarded, "Order stream ended");
            }
            Err(e) => {
                tracing::debug!(shop_id = %shop_id, error = %e, "Order stream terminated");
            }
        }
    });

    // The response body owns the guard: when the client disconnects, the body
    // is dropped and the forwarding task's token is cancelled.
    let body = ReceiverStream::new(rx).map(move |event| {
        let _held = &call_guard;
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(body).keep_alive(KeepAlive::new()))
}
