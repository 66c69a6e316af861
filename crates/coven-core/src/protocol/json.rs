//! JSON wire format.
//!
//! One frame is one JSON object:
//! `{"header":{"from":"<addr>","to":"<addr>"},"payload":<T>}`.
//! Blank addresses, unknown header fields, and a missing payload are rejected.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CovenError, Result};

use super::envelope::Envelope;
use super::WireFormat;

pub struct JsonFormat<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonFormat<T> {
    pub fn new() -> Self {
        Self { _payload: PhantomData }
    }
}

impl<T> Default for JsonFormat<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WireFormat<T> for JsonFormat<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, envelope: &Envelope<T>) -> Result<Bytes> {
        serde_json::to_vec(envelope)
            .map(Bytes::from)
            .map_err(|e| CovenError::BadFrame(format!("json encode failed: {e}")))
    }

    fn decode(&self, frame: Bytes) -> Result<Envelope<T>> {
        serde_json::from_slice(&frame).map_err(|e| {
            // Address validation errors surface through serde as custom messages.
            if e.is_data() && e.to_string().starts_with("invalid address") {
                CovenError::InvalidAddress(e.to_string())
            } else {
                CovenError::BadFrame(format!("invalid envelope json: {e}"))
            }
        })
    }
}
