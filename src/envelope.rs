//! Response envelope shared by every endpoint of the service.
//!
//! On the wire an envelope is `{ "code": int, "errorMsg": string?, "data": object? }`.
//! `code` is `0` for a completed request and negative when the handler could
//! not do its job; `errorMsg` is only written for faults and `data` only for
//! completed requests.

use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OK_CODE: i32 = 0;
pub const FAULT_CODE: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The handler completed; the payload may still describe a negative outcome.
    Ok(T),
    /// The handler could not produce an answer.
    Fault { code: i32, message: String },
}

impl<T> Envelope<T> {
    pub fn fault(err: impl fmt::Display) -> Self {
        Envelope::Fault {
            code: FAULT_CODE,
            message: err.to_string(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Envelope::Ok(_) => OK_CODE,
            Envelope::Fault { code, .. } => *code,
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Envelope::Ok(data),
            Err(e) => Envelope::fault(e),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 2)?;
        match self {
            Envelope::Ok(data) => {
                state.serialize_field("code", &OK_CODE)?;
                state.skip_field("errorMsg")?;
                state.serialize_field("data", data)?;
            }
            Envelope::Fault { code, message } => {
                state.serialize_field("code", code)?;
                if message.is_empty() {
                    state.skip_field("errorMsg")?;
                } else {
                    state.serialize_field("errorMsg", message)?;
                }
                state.skip_field("data")?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct WireEnvelope<T> {
    code: i32,
    #[serde(rename = "errorMsg", default)]
    error_msg: String,
    data: Option<T>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEnvelope::<T>::deserialize(deserializer)?;
        match (wire.code, wire.data) {
            (OK_CODE, Some(data)) => Ok(Envelope::Ok(data)),
            // A fault built with a zero code has no payload; keep it a fault.
            (code, _) => Ok(Envelope::Fault {
                code,
                message: wire.error_msg,
            }),
        }
    }
}
