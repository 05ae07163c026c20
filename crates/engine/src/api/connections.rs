//! Connection registry for WebSocket clients.
//!
//! A single actor owns the per-shop client table. Registration, removal and
//! broadcast requests all arrive on one command channel and are applied in
//! order by [`Hub::run`]; nothing else touches the table. A count snapshot is
//! kept alongside so size queries never have to go through the loop.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use bazaar_domain::{ClientId, OrderEvent, ShopId, UserId};
use bazaar_shared::{OrderData, ServerMessage};

use crate::infrastructure::ports::OrderEventSink;

/// A registered socket connection.
///
/// Owns the only sender of the connection's outbound queue, so dropping the
/// client closes the queue.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub shop_id: ShopId,
    pub user_id: UserId,
    sender: mpsc::Sender<Utf8Bytes>,
}

impl Client {
    /// Create a client and the receiving end of its outbound queue.
    pub fn new(
        shop_id: ShopId,
        user_id: UserId,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let client = Self {
            id: ClientId::new(),
            shop_id,
            user_id,
            sender,
        };
        (client, receiver)
    }
}

enum HubCommand {
    Register(Client),
    Unregister {
        shop_id: ShopId,
        client_id: ClientId,
    },
    Broadcast {
        shop_id: ShopId,
        frame: Utf8Bytes,
    },
}

/// The registry's control loop. Construct with [`Hub::new`] and drive with
/// [`Hub::run`].
pub struct Hub {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    shops: HashMap<ShopId, HashMap<ClientId, Client>>,
    counts: Arc<DashMap<ShopId, usize>>,
}

impl Hub {
    pub fn new() -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counts = Arc::new(DashMap::new());
        let hub = Self {
            commands: rx,
            shops: HashMap::new(),
            counts: counts.clone(),
        };
        let handle = HubHandle {
            commands: tx,
            counts,
        };
        (hub, handle)
    }

    /// Process commands until every [`HubHandle`] has been dropped.
    ///
    /// Remaining clients are dropped on exit, which closes their queues.
    pub async fn run(mut self) {
        tracing::debug!("Connection hub started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        let remaining: usize = self.shops.values().map(HashMap::len).sum();
        tracing::debug!(remaining, "Connection hub stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(client) => self.register(client),
            HubCommand::Unregister { shop_id, client_id } => self.unregister(shop_id, client_id),
            HubCommand::Broadcast { shop_id, frame } => self.broadcast(shop_id, frame),
        }
    }

    fn register(&mut self, client: Client) {
        let shop_id = client.shop_id;
        let client_id = client.id;
        let user_id = client.user_id;
        let clients = self.shops.entry(shop_id).or_default();
        clients.insert(client_id, client);
        let count = clients.len();
        self.counts.insert(shop_id, count);

        tracing::info!(
            shop_id = %shop_id,
            client_id = %client_id,
            user_id = %user_id,
            clients = count,
            "Client registered"
        );
    }

    fn unregister(&mut self, shop_id: ShopId, client_id: ClientId) {
        let Some(clients) = self.shops.get_mut(&shop_id) else {
            return;
        };
        if clients.remove(&client_id).is_none() {
            return;
        }
        let count = clients.len();
        self.refresh(shop_id);

        tracing::info!(
            shop_id = %shop_id,
            client_id = %client_id,
            clients = count,
            "Client unregistered"
        );
    }

    fn broadcast(&mut self, shop_id: ShopId, frame: Utf8Bytes) {
        let Some(clients) = self.shops.get_mut(&shop_id) else {
            return;
        };

        let mut evicted = Vec::new();
        for (client_id, client) in clients.iter() {
            match client.sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        shop_id = %shop_id,
                        client_id = %client_id,
                        "Client queue full, evicting"
                    );
                    evicted.push(*client_id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        shop_id = %shop_id,
                        client_id = %client_id,
                        "Client queue closed, removing"
                    );
                    evicted.push(*client_id);
                }
            }
        }

        if evicted.is_empty() {
            return;
        }
        for client_id in &evicted {
            clients.remove(client_id);
        }
        self.refresh(shop_id);
    }

    /// Sync the count snapshot for `shop_id` and prune the shop if empty.
    fn refresh(&mut self, shop_id: ShopId) {
        let count = self.shops.get(&shop_id).map(HashMap::len).unwrap_or(0);
        if count == 0 {
            self.shops.remove(&shop_id);
            self.counts.remove(&shop_id);
            tracing::debug!(shop_id = %shop_id, "Pruned empty shop from hub");
        } else {
            self.counts.insert(shop_id, count);
        }
    }
}

/// Cloneable front door to the [`Hub`] loop.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    counts: Arc<DashMap<ShopId, usize>>,
}

impl HubHandle {
    pub fn register(&self, client: Client) {
        self.send(HubCommand::Register(client));
    }

    /// Remove a client and close its queue. Unknown clients are ignored.
    pub fn unregister(&self, shop_id: ShopId, client_id: ClientId) {
        self.send(HubCommand::Unregister { shop_id, client_id });
    }

    /// Serialize `message` once and queue it for every client of `shop_id`.
    pub fn broadcast(&self, shop_id: ShopId, message: &ServerMessage) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(
                    shop_id = %shop_id,
                    message_type = message.type_name(),
                    error = %e,
                    "Failed to serialize broadcast"
                );
                return;
            }
        };
        self.send(HubCommand::Broadcast {
            shop_id,
            frame: Utf8Bytes::from(json),
        });
    }

    /// Clients currently registered for `shop_id`, as of the last processed command.
    pub fn client_count(&self, shop_id: ShopId) -> usize {
        self.counts.get(&shop_id).map(|c| *c).unwrap_or(0)
    }

    pub fn shop_count(&self) -> usize {
        self.counts.len()
    }

    fn send(&self, command: HubCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Connection hub is not running, command dropped");
        }
    }
}

impl OrderEventSink for HubHandle {
    fn deliver(&self, shop_id: ShopId, event: &OrderEvent) {
        let message = ServerMessage::for_event(event.kind, OrderData::from(event.order.as_ref()));
        self.broadcast(shop_id, &message);
    }
}
