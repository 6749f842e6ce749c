//! Routing of inbound frames
//!
//! Decodes each raw frame and delivers it to exactly one sink: the status
//! model, the console, or the screenshot view. A frame that cannot be
//! processed is reported on the console and dropped; it never affects the
//! session it arrived on.

use hu_core::StatusModel;
use hu_protocol::{decode_first_image, InboundMessage};

use crate::events::{ClientEvent, EventPoster};

/// Decodes frames and posts the results to the control context
#[derive(Debug)]
pub struct MessageRouter {
    model: StatusModel,
    poster: EventPoster,
}

impl MessageRouter {
    /// Create a router holding an offline status model
    pub fn new(poster: EventPoster) -> Self {
        Self {
            model: StatusModel::new(),
            poster,
        }
    }

    /// Route one raw text frame
    pub fn route(&mut self, raw: &str) {
        let message = match InboundMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping frame: {}", e);
                self.poster.log(format!("Error processing message: {}", e));
                return;
            }
        };

        tracing::trace!("Routing {} frame", message.kind_name());

        match message {
            InboundMessage::Text(text) => self.poster.log(text),
            InboundMessage::Reply(reply) => self.poster.log(format!("Received: {}", reply)),
            InboundMessage::Logs(line) => self.poster.log(line),
            InboundMessage::Status(fields) => {
                let snapshot = self.model.apply(&fields).clone();
                self.poster.post(ClientEvent::Status(snapshot));
                if let Some(required) = fields.fixation_required {
                    self.poster.post(ClientEvent::Fixation(required));
                }
            }
            InboundMessage::Screenshot(images) => match decode_first_image(&images) {
                Ok(Some(bytes)) => {
                    tracing::debug!("Screenshot received ({} bytes)", bytes.len());
                    self.poster.post(ClientEvent::Screenshot(bytes));
                }
                Ok(None) => self.poster.log("No screenshot data received"),
                Err(e) => {
                    tracing::warn!("Dropping screenshot: {}", e);
                    self.poster
                        .log(format!("Error processing screenshot: {}", e));
                }
            },
            InboundMessage::Unknown { kind } => {
                tracing::warn!("Unknown message type: {}", kind);
                self.poster.log(format!("Unknown message type: {}", kind));
            }
        }
    }

    /// Reset the status model to its offline defaults and publish it
    pub fn reset(&mut self) {
        self.model.reset();
        self.poster
            .post(ClientEvent::Status(self.model.snapshot().clone()));
    }

    /// Current status model
    pub fn model(&self) -> &StatusModel {
        &self.model
    }
}
