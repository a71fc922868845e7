use crate::callback::{BytesTransform, CallContext};
use crate::error::CallbackError;
use crate::tracing_shim::{info, warn};
use hl7_parser::Message;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Acknowledgment codes written to MSA-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckCode {
    /// `AA`: application accept.
    Accept,
    /// `AE`: application error.
    Error,
    /// `AR`: application reject.
    Reject,
}

impl AckCode {
    /// The two-letter code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "AA",
            Self::Error => "AE",
            Self::Reject => "AR",
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AckCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One repetition of PID-3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientIdentifier {
    /// PID-3.1, the identifier itself.
    pub id: String,
    /// PID-3.6.1, the assigning facility's namespace id.
    pub oid: String,
    /// PID-3.6.2, the assigning facility's universal id.
    pub oi2: String,
}

/// Acknowledges inbound HL7 v2 messages.
///
/// Each payload is parsed with `hl7-parser` and answered with a JSON envelope holding the ack
/// code, the serialized ACK message, and the patient identifiers found in PID-3. The ACK's
/// control id is a per-instance counter, starting at 1.
///
/// Messages are accepted with `AA`, except that a message without a message type (MSH-9) or
/// control id (MSH-10) is rejected with `AR`; a plain acknowledger would accept those too.
/// Payloads that are not UTF-8 or have no MSH header cannot be acknowledged at all and fail.
#[derive(Debug)]
pub struct Hl7Ack {
    application: String,
    facility: String,
    count: AtomicU64,
}

impl Default for Hl7Ack {
    fn default() -> Self {
        Self::new("APPLICATION", "FACILITY")
    }
}

/// The JSON document returned to the caller.
///
/// `pid` is the PID segment as it appeared on the wire, or `null` when the message has none. It
/// is not broken down into fields; `pid_3_list` carries the parts callers need.
#[derive(Debug, Serialize)]
struct AckEnvelope {
    code: AckCode,
    msg: String,
    pid_3_list: Vec<PatientIdentifier>,
    pid: Option<String>,
}

/// MSH-1 and MSH-2, read from the start of the header.
#[derive(Debug)]
struct Encoding {
    field: char,
    component: char,
    characters: String,
}

impl Encoding {
    /// Read the separators from `text`, which must start with `MSH`.
    fn of(text: &str) -> Option<Self> {
        let mut chars = text.strip_prefix("MSH")?.chars();
        let field = chars.next()?;
        let characters: String = chars.take_while(|&c| c != field).collect();
        let component = characters.chars().next()?;
        Some(Self {
            field,
            component,
            characters,
        })
    }
}

/// Drop MLLP framing and make `\r` the only segment terminator.
fn normalize(text: &str) -> String {
    text.trim_matches(|c| matches!(c, '\r' | '\n' | '\x0b' | '\x1c'))
        .replace("\r\n", "\r")
        .replace('\n', "\r")
}

/// The raw value of field `n` of the first `segment`, or `""`.
fn field<'a>(message: &'a Message<'_>, segment: &str, n: usize) -> &'a str {
    message
        .segment(segment)
        .and_then(|segment| segment.field(n))
        .map_or("", |field| field.raw_value())
}

/// Every repetition of PID-3.
fn patient_identifiers(message: &Message<'_>) -> Vec<PatientIdentifier> {
    let Some(pid_3) = message.segment("PID").and_then(|pid| pid.field(3)) else {
        return Vec::new();
    };
    if pid_3.raw_value().is_empty() {
        return Vec::new();
    }

    (1..)
        .map_while(|n| pid_3.repeat(n))
        .map(|repeat| {
            let get = |component, subcomponent| {
                repeat
                    .component(component)
                    .and_then(|component| component.subcomponent(subcomponent))
                    .map_or("", |subcomponent| subcomponent.raw_value())
                    .to_owned()
            };
            PatientIdentifier {
                id: get(1, 1),
                oid: get(6, 1),
                oi2: get(6, 2),
            }
        })
        .collect()
}

impl Hl7Ack {
    /// Acknowledge on behalf of the given sending application and facility.
    pub fn new(application: impl Into<String>, facility: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            facility: facility.into(),
            count: AtomicU64::new(0),
        }
    }

    /// Pick the ack code, take the next control id, and build the envelope.
    fn acknowledge(&self, message: &Message<'_>, encoding: &Encoding) -> AckEnvelope {
        let control_id = self.count.fetch_add(1, Ordering::Relaxed) + 1;

        let original_id = field(message, "MSH", 10);
        let code = if field(message, "MSH", 9).is_empty() || original_id.is_empty() {
            warn!(control_id, "rejecting message without type or control id");
            AckCode::Reject
        } else {
            AckCode::Accept
        };
        info!(control_id, %code, original_id, "acknowledging message");

        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        AckEnvelope {
            code,
            msg: self.ack_message(message, encoding, code, control_id, &timestamp),
            pid_3_list: patient_identifiers(message),
            pid: message
                .segment("PID")
                .map(|segment| segment.raw_value().to_owned()),
        }
    }

    /// Serialize an MSH + MSA acknowledgment of `message`.
    ///
    /// The sender is this acknowledger, the receiver is the original sender, MSH-9 is
    /// `ACK^<original trigger event>^ACK`, and MSA-2 echoes the original control id.
    fn ack_message(
        &self,
        message: &Message<'_>,
        encoding: &Encoding,
        code: AckCode,
        control_id: u64,
        timestamp: &str,
    ) -> String {
        let trigger = message
            .segment("MSH")
            .and_then(|msh| msh.field(9))
            .and_then(|field| field.component(2))
            .map_or("", |component| component.raw_value());
        let message_type = format!("ACK{c}{trigger}{c}ACK", c = encoding.component);
        let control_id = control_id.to_string();

        let header: [&str; 11] = [
            &encoding.characters,
            &self.application,
            &self.facility,
            field(message, "MSH", 3),
            field(message, "MSH", 4),
            timestamp,
            "",
            &message_type,
            &control_id,
            field(message, "MSH", 11),
            field(message, "MSH", 12),
        ];
        let f = encoding.field;
        let separator = f.to_string();
        format!(
            "MSH{f}{}\rMSA{f}{code}{f}{}",
            header.join(separator.as_str()),
            field(message, "MSH", 10),
        )
    }
}

impl BytesTransform for Hl7Ack {
    async fn transform(
        &self,
        payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<Vec<u8>, CallbackError> {
        let text = std::str::from_utf8(&payload)
            .map_err(|err| CallbackError::Internal(format!("HL7 payload is not UTF-8: {err}")))?;
        let text = normalize(text);
        let encoding = Encoding::of(&text).ok_or_else(|| {
            CallbackError::Internal("HL7 payload does not start with an MSH header".to_owned())
        })?;
        let message = Message::parse(&text)
            .map_err(|err| CallbackError::Internal(format!("could not parse HL7 payload: {err}")))?;
        serde_json::to_vec(&self.acknowledge(&message, &encoding)).map_err(CallbackError::internal)
    }
}
