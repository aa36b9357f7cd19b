//! In-memory participant slot (§3 "Participant ... In-memory counterpart
//! holds the SFU transports/producers/consumers for this participant").

use std::collections::HashMap;
use uuid::Uuid;

use crate::producer::{ConsumerRecord, ProducerRecord};
use crate::transport::WebRtcTransport;

pub struct ParticipantSlot {
    pub id: Uuid,
    pub display_name: String,
    pub send_transport: Option<WebRtcTransport>,
    pub recv_transport: Option<WebRtcTransport>,
    pub producers: HashMap<Uuid, ProducerRecord>,
    pub consumers: HashMap<Uuid, ConsumerRecord>,
    /// The legacy "consume whatever this participant is sending" pointer
    /// (§4.1 `createProducer`: "if not a bus output, also sets the
    /// participant's 'primary' producer pointer").
    pub primary_producer_id: Option<Uuid>,
}

impl ParticipantSlot {
    pub fn new(id: Uuid, display_name: String) -> Self {
        Self {
            id,
            display_name,
            send_transport: None,
            recv_transport: None,
            producers: HashMap::new(),
            consumers: HashMap::new(),
            primary_producer_id: None,
        }
    }

    pub fn transport_for(&self, direction: crate::transport::TransportDirection) -> Option<&WebRtcTransport> {
        match direction {
            crate::transport::TransportDirection::Send => self.send_transport.as_ref(),
            crate::transport::TransportDirection::Recv => self.recv_transport.as_ref(),
        }
    }

    /// Close every SFU resource owned by this participant. Errors from
    /// individual closes are swallowed by the caller (§4.1 `closeRoom`,
    /// §7 "Cleanup is always attempted").
    pub fn close_all(&mut self) {
        for producer in self.producers.values_mut() {
            producer.closed = true;
        }
        for consumer in self.consumers.values_mut() {
            consumer.closed = true;
        }
        if let Some(t) = &self.send_transport {
            t.close();
        }
        if let Some(t) = &self.recv_transport {
            t.close();
        }
    }
}
