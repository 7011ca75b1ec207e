// Wraps/unwraps envelopes on top of the transport layer and dispatches decoded objects by tag.
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus, ObjectMetadata};
use crate::object::envelope::Envelope;
use crate::object::inner::InnerObject;
use crate::object::registry::TypeRegistry;
use crate::transport::TransportLayer;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

struct Inner {
    transport: TransportLayer,
    registry: TypeRegistry,
    events: EventBus,
    background: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct ObjectLayer {
    inner: Arc<Inner>,
}

impl ObjectLayer {
    pub fn new(transport: TransportLayer) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                registry: TypeRegistry::new(),
                events: EventBus::new(),
                background: Mutex::new(None),
            }),
        }
    }

    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    pub fn transport(&self) -> &TransportLayer {
        &self.inner.transport
    }

    /// Starts the transport layer, then subscribes to its event channel and spawns the dispatch
    /// task that decodes envelopes and re-publishes decoded objects (or a diagnostic) one level
    /// up. Once running, announces this node's presence with a broadcast `Ping` so a receiving
    /// peer's object layer decodes it instead of treating it as an opaque message.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.inner.transport.start().await?;

        let mut rx = self.inner.transport.events().subscribe();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => this.dispatch(event).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "object layer dispatch lagged behind transport events");
                    }
                }
            }
        });
        *self.inner.background.lock().await = Some(handle);

        let local_ip = self.inner.transport.local_ip().await?;
        if let Err(e) = self
            .send_broadcast(&InnerObject::Ping { sender_ip: local_ip })
            .await
        {
            warn!(error = %e, "failed to send presence broadcast");
        }

        Ok(())
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.inner.background.lock().await.take() {
            handle.abort();
        }
        self.inner.transport.stop().await;
    }

    async fn dispatch(&self, event: CoreEvent) {
        let CoreEvent::MessageReceived {
            source_ip,
            bytes,
            was_udp,
        } = event
        else {
            self.inner.events.emit(event);
            return;
        };

        let envelope = match Envelope::decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(source_ip, error = %e, "malformed envelope, dropping");
                self.inner.events.emit(CoreEvent::Diagnostic {
                    source_ip: Some(source_ip),
                    message: e.to_string(),
                });
                return;
            }
        };

        match envelope.decode_payload(&self.inner.registry) {
            Ok(object) => self.inner.events.emit(CoreEvent::ObjectReceived {
                metadata: ObjectMetadata {
                    source_ip: envelope.source_ip,
                    type_tag: envelope.type_tag,
                    was_udp,
                },
                object,
            }),
            Err(e) => {
                warn!(source_ip = envelope.source_ip, type_tag = envelope.type_tag, error = %e, "unknown type tag, dropping");
                self.inner.events.emit(CoreEvent::Diagnostic {
                    source_ip: Some(envelope.source_ip),
                    message: e.to_string(),
                });
            }
        }
    }

    pub async fn send_tcp(&self, target_ip: &str, object: &InnerObject) -> Result<(), CoreError> {
        let bytes = self.wrap(object).await?;
        self.inner.transport.send_tcp(target_ip, bytes).await
    }

    pub async fn send_udp(&self, target_ip: &str, object: &InnerObject) -> Result<(), CoreError> {
        let bytes = self.wrap(object).await?;
        self.inner.transport.send_udp(target_ip, bytes).await
    }

    pub async fn send_broadcast(&self, object: &InnerObject) -> Result<(), CoreError> {
        let bytes = self.wrap(object).await?;
        self.inner.transport.send_broadcast(bytes).await
    }

    pub async fn send_tcp_all(&self, object: &InnerObject) -> Result<(), CoreError> {
        let bytes = self.wrap(object).await?;
        self.inner.transport.send_tcp_all(bytes).await;
        Ok(())
    }

    pub async fn send_udp_all(&self, object: &InnerObject) -> Result<(), CoreError> {
        let bytes = self.wrap(object).await?;
        self.inner.transport.send_udp_all(bytes).await;
        Ok(())
    }

    async fn wrap(&self, object: &InnerObject) -> Result<Vec<u8>, CoreError> {
        let local_ip = self.inner.transport.local_ip().await?;
        Ok(Envelope::wrap(&local_ip, object).encode())
    }
}
