//! JSON-Codec fuer Signaling-Nachrichten
//!
//! `decode` und `encode` sind rein und zustandslos. Dekodieren entnimmt die
//! bekannten Felder einem JSON-Objekt; was uebrig bleibt, landet in
//! `optional_items`. Enkodieren schreibt erst die typisierten Felder und
//! mischt danach die optionalen Felder ein, wobei typisierte Schluessel
//! Vorrang haben.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sora_core::{ChannelId, ClientId, SoraError};

use crate::error::{DecodeError, DecodeResult};
use crate::keys;
use crate::message::*;

// ---------------------------------------------------------------------------
// Bekannte Schluessel pro Nachrichtentyp
// ---------------------------------------------------------------------------

const STREAMING_SCHLUESSEL: [&str; 3] = [keys::ROLE, keys::CLIENT_ID, keys::CHANNEL_ID];

/// Schluessel, die ein Nachrichtentyp selbst belegt
///
/// Gleichnamige Eintraege in `optional_items` werden beim Enkodieren
/// verworfen, auch wenn das typisierte Feld fehlt (z.B. `access_token: None`).
pub fn bekannte_schluessel(typ: MessageType) -> Vec<&'static str> {
    let mut schluessel = vec![keys::TYPE];
    match typ {
        MessageType::Connect => schluessel.extend([
            keys::ROLE,
            keys::CHANNEL_ID,
            keys::ACCESS_TOKEN,
            keys::VIDEO,
            keys::AUDIO,
            keys::VIDEO_CODEC_TYPE,
            keys::AUDIO_CODEC_TYPE,
            keys::METADATA,
        ]),
        MessageType::Offer => schluessel.extend([keys::CLIENT_ID, keys::SDP, keys::CONFIG]),
        MessageType::Answer => schluessel.push(keys::SDP),
        MessageType::Candidate => schluessel.push(keys::CANDIDATE),
        MessageType::Error => schluessel.extend([keys::REASON, keys::ERROR_REASON]),
        MessageType::SignalingConnected | MessageType::SignalingUpdated => {
            schluessel.extend(STREAMING_SCHLUESSEL);
            schluessel.extend([
                keys::MINUTES,
                keys::CHANNEL_CONNECTIONS,
                keys::UPSTREAM_CONNECTIONS,
                keys::DOWNSTREAM_CONNECTIONS,
            ]);
        }
        MessageType::SignalingDisconnected => schluessel.extend(STREAMING_SCHLUESSEL),
        MessageType::SignalingFailed => {
            schluessel.extend(STREAMING_SCHLUESSEL);
            schluessel.push(keys::REASON);
        }
        MessageType::ArchiveFinished => {
            schluessel.extend(STREAMING_SCHLUESSEL);
            schluessel.extend([
                keys::CREATED_AT,
                keys::FILE_PATH,
                keys::FILE_NAME,
                keys::SIZE,
                keys::VIDEO_CODEC_TYPE,
                keys::AUDIO_CODEC_TYPE,
            ]);
        }
        MessageType::ArchiveFailed => {
            schluessel.extend([keys::CLIENT_ID, keys::CHANNEL_ID, keys::REASON])
        }
        MessageType::TransportEncrypted => {}
    }
    schluessel
}

// ---------------------------------------------------------------------------
// Feldleser
// ---------------------------------------------------------------------------

/// Entnimmt Felder aus einem JSON-Objekt; der Rest wird zu `optional_items`
struct Felder {
    map: Map<String, Value>,
}

impl Felder {
    fn neu(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Entnimmt einen Wert, `null` zaehlt als fehlend
    fn nehmen(&mut self, key: &'static str) -> Option<Value> {
        match self.map.remove(key) {
            Some(Value::Null) | None => None,
            Some(wert) => Some(wert),
        }
    }

    /// Entnimmt einen opaken JSON-Wert unveraendert, auch `null`
    fn roh(&mut self, key: &'static str) -> Option<Value> {
        self.map.remove(key)
    }

    fn string(&mut self, key: &'static str) -> DecodeResult<String> {
        self.string_opt(key)?.ok_or(DecodeError::MissingField(key))
    }

    fn string_opt(&mut self, key: &'static str) -> DecodeResult<Option<String>> {
        match self.nehmen(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(anderes) => Err(DecodeError::ungueltig(key, anderes)),
        }
    }

    fn bool_oder(&mut self, key: &'static str, standard: bool) -> DecodeResult<bool> {
        match self.nehmen(key) {
            None => Ok(standard),
            Some(Value::Bool(b)) => Ok(b),
            Some(anderes) => Err(DecodeError::ungueltig(key, anderes)),
        }
    }

    /// Nicht-negative Ganzzahl; negative Werte, Brueche und Ueberlauf sind ungueltig
    fn zahl(&mut self, key: &'static str) -> DecodeResult<u64> {
        let wert = self.nehmen(key).ok_or(DecodeError::MissingField(key))?;
        wert.as_u64().ok_or_else(|| DecodeError::ungueltig(key, wert))
    }

    fn parsen<T>(&mut self, key: &'static str) -> DecodeResult<T>
    where
        T: FromStr<Err = SoraError>,
    {
        let s = self.string(key)?;
        Ok(s.parse::<T>()?)
    }

    fn parsen_oder_standard<T>(&mut self, key: &'static str) -> DecodeResult<T>
    where
        T: FromStr<Err = SoraError> + Default,
    {
        match self.string_opt(key)? {
            Some(s) => Ok(s.parse::<T>()?),
            None => Ok(T::default()),
        }
    }

    fn kanal(&mut self) -> DecodeResult<ChannelId> {
        self.parsen(keys::CHANNEL_ID)
    }

    fn client(&mut self) -> DecodeResult<ClientId> {
        Ok(ClientId::from(self.string(keys::CLIENT_ID)?))
    }

    fn zeitpunkt(&mut self, key: &'static str) -> DecodeResult<DateTime<Utc>> {
        let s = self.string(key)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| DecodeError::ungueltig(key, s))
    }

    fn streaming(&mut self) -> DecodeResult<StreamingInfo> {
        Ok(StreamingInfo {
            role: self.parsen(keys::ROLE)?,
            client_id: self.client()?,
            channel_id: self.kanal()?,
        })
    }

    fn rest(self) -> OptionalItems {
        self.map
    }
}

// ---------------------------------------------------------------------------
// Dekodieren
// ---------------------------------------------------------------------------

/// Dekodiert ein JSON-Objekt zu einer typisierten Nachricht
///
/// Unbekannte Felder fuehren nie zu einem Fehler, sie werden in
/// `optional_items` uebernommen.
pub fn decode(objekt: &Value) -> DecodeResult<Message> {
    let map = match objekt {
        Value::Object(map) => map.clone(),
        anderes => {
            return Err(DecodeError::nutzlast(format!(
                "JSON-Objekt erwartet, erhalten: {}",
                json_art(anderes)
            )))
        }
    };
    decode_map(map)
}

/// Wie [`decode`], uebernimmt das Objekt ohne Kopie
pub fn decode_map(mut map: Map<String, Value>) -> DecodeResult<Message> {
    let typ = match map.remove(keys::TYPE) {
        Some(Value::String(name)) => {
            MessageType::from_wire(&name).ok_or(DecodeError::UnknownMessageType(Some(name)))?
        }
        Some(anderes) => return Err(DecodeError::UnknownMessageType(Some(anderes.to_string()))),
        None => return Err(DecodeError::UnknownMessageType(None)),
    };

    let mut f = Felder::neu(map);
    let nachricht = match typ {
        MessageType::Connect => {
            let role = f.parsen(keys::ROLE)?;
            let channel_id = f.kanal()?;
            Message::Connect(ConnectRequest {
                role,
                channel_id,
                access_token: f.string_opt(keys::ACCESS_TOKEN)?,
                video_codec: f.parsen_oder_standard(keys::VIDEO_CODEC_TYPE)?,
                audio_codec: f.parsen_oder_standard(keys::AUDIO_CODEC_TYPE)?,
                video_enabled: f.bool_oder(keys::VIDEO, true)?,
                audio_enabled: f.bool_oder(keys::AUDIO, true)?,
                metadata: f.roh(keys::METADATA),
                optional_items: f.rest(),
            })
        }
        MessageType::Offer => {
            let client_id = f.client()?;
            // Leeres SDP ist hier erlaubt, der Negotiator lehnt es ab
            let sdp = f.string(keys::SDP)?;
            Message::Offer(OfferMessage {
                client_id,
                sdp,
                config: f.roh(keys::CONFIG),
                optional_items: f.rest(),
            })
        }
        MessageType::Answer => Message::Answer(AnswerMessage {
            sdp: f.string(keys::SDP)?,
            optional_items: f.rest(),
        }),
        MessageType::Candidate => Message::Candidate(CandidateMessage {
            candidate: f.string(keys::CANDIDATE)?,
            optional_items: f.rest(),
        }),
        MessageType::Error => Message::Error(ErrorResponse {
            reason: f.string(keys::REASON)?,
            verbose_reason: f.string_opt(keys::ERROR_REASON)?,
            optional_items: f.rest(),
        }),
        MessageType::SignalingConnected | MessageType::SignalingUpdated => {
            let status = SignalingStatus {
                streaming: f.streaming()?,
                counts: ConnectionCounts {
                    minutes: f.zahl(keys::MINUTES)?,
                    channel_connections: f.zahl(keys::CHANNEL_CONNECTIONS)?,
                    upstream_connections: f.zahl(keys::UPSTREAM_CONNECTIONS)?,
                    downstream_connections: f.zahl(keys::DOWNSTREAM_CONNECTIONS)?,
                },
                optional_items: f.rest(),
            };
            if typ == MessageType::SignalingConnected {
                Message::SignalingConnected(status)
            } else {
                Message::SignalingUpdated(status)
            }
        }
        MessageType::SignalingDisconnected => {
            Message::SignalingDisconnected(SignalingDisconnected {
                streaming: f.streaming()?,
                optional_items: f.rest(),
            })
        }
        MessageType::SignalingFailed => Message::SignalingFailed(SignalingFailed {
            streaming: f.streaming()?,
            reason: f.parsen(keys::REASON)?,
            optional_items: f.rest(),
        }),
        MessageType::ArchiveFinished => Message::ArchiveFinished(ArchiveFinished {
            streaming: f.streaming()?,
            created_at: f.zeitpunkt(keys::CREATED_AT)?,
            file_path: f.string(keys::FILE_PATH)?,
            file_name: f.string(keys::FILE_NAME)?,
            size: f.zahl(keys::SIZE)?,
            video_codec: f.parsen(keys::VIDEO_CODEC_TYPE)?,
            audio_codec: f.parsen(keys::AUDIO_CODEC_TYPE)?,
            optional_items: f.rest(),
        }),
        MessageType::ArchiveFailed => {
            let client_id = f.client()?;
            Message::ArchiveFailed(ArchiveFailed {
                client_id,
                channel_id: f.kanal()?,
                reason: f.parsen(keys::REASON)?,
                optional_items: f.rest(),
            })
        }
        MessageType::TransportEncrypted => Message::TransportEncrypted(TransportEncrypted {
            optional_items: f.rest(),
        }),
    };
    Ok(nachricht)
}

fn json_art(wert: &Value) -> &'static str {
    match wert {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "zahl",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "objekt",
    }
}

// ---------------------------------------------------------------------------
// Enkodieren
// ---------------------------------------------------------------------------

/// Enkodiert eine Nachricht als JSON-Objekt
pub fn encode(nachricht: &Message) -> Value {
    let typ = nachricht.message_type();
    let mut map = Map::new();
    map.insert(keys::TYPE.into(), typ.wire_name().into());

    match nachricht {
        Message::Connect(m) => {
            map.insert(keys::ROLE.into(), m.role.as_str().into());
            map.insert(keys::CHANNEL_ID.into(), m.channel_id.as_str().into());
            if let Some(token) = &m.access_token {
                map.insert(keys::ACCESS_TOKEN.into(), token.as_str().into());
            }
            map.insert(keys::VIDEO.into(), m.video_enabled.into());
            map.insert(keys::AUDIO.into(), m.audio_enabled.into());
            map.insert(keys::VIDEO_CODEC_TYPE.into(), m.video_codec.as_str().into());
            map.insert(keys::AUDIO_CODEC_TYPE.into(), m.audio_codec.as_str().into());
            if let Some(metadata) = &m.metadata {
                map.insert(keys::METADATA.into(), metadata.clone());
            }
        }
        Message::Offer(m) => {
            map.insert(keys::CLIENT_ID.into(), m.client_id.as_str().into());
            map.insert(keys::SDP.into(), m.sdp.as_str().into());
            if let Some(config) = &m.config {
                map.insert(keys::CONFIG.into(), config.clone());
            }
        }
        Message::Answer(m) => {
            map.insert(keys::SDP.into(), m.sdp.as_str().into());
        }
        Message::Candidate(m) => {
            map.insert(keys::CANDIDATE.into(), m.candidate.as_str().into());
        }
        Message::Error(m) => {
            map.insert(keys::REASON.into(), m.reason.as_str().into());
            if let Some(verbose) = &m.verbose_reason {
                map.insert(keys::ERROR_REASON.into(), verbose.as_str().into());
            }
        }
        Message::SignalingConnected(m) | Message::SignalingUpdated(m) => {
            streaming_schreiben(&mut map, &m.streaming);
            map.insert(keys::MINUTES.into(), m.counts.minutes.into());
            map.insert(
                keys::CHANNEL_CONNECTIONS.into(),
                m.counts.channel_connections.into(),
            );
            map.insert(
                keys::UPSTREAM_CONNECTIONS.into(),
                m.counts.upstream_connections.into(),
            );
            map.insert(
                keys::DOWNSTREAM_CONNECTIONS.into(),
                m.counts.downstream_connections.into(),
            );
        }
        Message::SignalingDisconnected(m) => {
            streaming_schreiben(&mut map, &m.streaming);
        }
        Message::SignalingFailed(m) => {
            streaming_schreiben(&mut map, &m.streaming);
            map.insert(keys::REASON.into(), m.reason.as_str().into());
        }
        Message::ArchiveFinished(m) => {
            streaming_schreiben(&mut map, &m.streaming);
            map.insert(
                keys::CREATED_AT.into(),
                m.created_at
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                    .into(),
            );
            map.insert(keys::FILE_PATH.into(), m.file_path.as_str().into());
            map.insert(keys::FILE_NAME.into(), m.file_name.as_str().into());
            map.insert(keys::SIZE.into(), m.size.into());
            map.insert(keys::VIDEO_CODEC_TYPE.into(), m.video_codec.as_str().into());
            map.insert(keys::AUDIO_CODEC_TYPE.into(), m.audio_codec.as_str().into());
        }
        Message::ArchiveFailed(m) => {
            map.insert(keys::CLIENT_ID.into(), m.client_id.as_str().into());
            map.insert(keys::CHANNEL_ID.into(), m.channel_id.as_str().into());
            map.insert(keys::REASON.into(), m.reason.as_str().into());
        }
        Message::TransportEncrypted(_) => {}
    }

    let bekannt = bekannte_schluessel(typ);
    for (key, wert) in nachricht.optional_items() {
        if bekannt.contains(&key.as_str()) || map.contains_key(key) {
            tracing::trace!(schluessel = %key, typ = %typ, "Optionales Feld verdeckt typisiertes Feld");
            continue;
        }
        map.insert(key.clone(), wert.clone());
    }

    Value::Object(map)
}

fn streaming_schreiben(map: &mut Map<String, Value>, streaming: &StreamingInfo) {
    map.insert(keys::ROLE.into(), streaming.role.as_str().into());
    map.insert(keys::CLIENT_ID.into(), streaming.client_id.as_str().into());
    map.insert(keys::CHANNEL_ID.into(), streaming.channel_id.as_str().into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use sora_core::{AudioCodec, FailureReason, Role, VideoCodec};

    fn extras() -> OptionalItems {
        let mut m = OptionalItems::new();
        m.insert("x_custom".into(), json!({"a": [1, 2, 3]}));
        m.insert("spotlight".into(), json!(true));
        m
    }

    fn streaming() -> StreamingInfo {
        StreamingInfo {
            role: Role::Downstream,
            client_id: ClientId::from("c1"),
            channel_id: ChannelId::neu("room-1").unwrap(),
        }
    }

    fn rundreise(m: Message) {
        let wert = encode(&m);
        let zurueck = decode(&wert).expect("Dekodieren muss gelingen");
        assert_eq!(zurueck, m, "Rundreise veraendert {}", m.message_type());
    }

    #[test]
    fn connect_enthaelt_immer_codecs_und_flags() {
        let req = ConnectRequest::neu(Role::Downstream, ChannelId::neu("room-1").unwrap());
        let wert = encode(&Message::Connect(req));
        assert_eq!(
            wert,
            json!({
                "type": "connect",
                "role": "downstream",
                "channel_id": "room-1",
                "video": true,
                "audio": true,
                "video_codec_type": "VP8",
                "audio_codec_type": "OPUS",
            })
        );
    }

    #[test]
    fn connect_ohne_codecs_nutzt_standardwerte() {
        let m = decode(&json!({"type": "connect", "role": "upstream", "channel_id": "r"})).unwrap();
        let Message::Connect(req) = m else {
            panic!("Erwartet Connect");
        };
        assert_eq!(req.video_codec, VideoCodec::Vp8);
        assert_eq!(req.audio_codec, AudioCodec::Opus);
        assert!(req.video_enabled && req.audio_enabled);
    }

    #[test]
    fn rundreise_alle_nachrichtentypen() {
        let mut connect = ConnectRequest::neu(Role::Upstream, ChannelId::neu("room-1").unwrap())
            .mit_access_token("token")
            .mit_video_codec(VideoCodec::H264)
            .mit_metadata(json!({"user": "alice"}));
        connect.audio_enabled = false;
        connect.optional_items = extras();
        rundreise(Message::Connect(connect));

        rundreise(Message::Offer(OfferMessage {
            client_id: ClientId::from("c1"),
            sdp: "v=0\r\n".into(),
            config: Some(json!({"iceServers": [{"urls": ["stun:example.org"]}]})),
            optional_items: extras(),
        }));
        rundreise(Message::Offer(OfferMessage {
            client_id: ClientId::from("c1"),
            sdp: String::new(),
            config: None,
            optional_items: OptionalItems::new(),
        }));
        rundreise(Message::Connect(
            ConnectRequest::neu(Role::Downstream, ChannelId::neu("room-1").unwrap())
                .mit_metadata(Value::Null),
        ));
        rundreise(Message::Offer(OfferMessage {
            client_id: ClientId::from("c1"),
            sdp: "v=0".into(),
            config: Some(Value::Null),
            optional_items: OptionalItems::new(),
        }));
        rundreise(Message::Answer(AnswerMessage::neu("v=0")));
        rundreise(Message::Candidate(CandidateMessage::neu("candidate:1 1 udp 1 1.2.3.4 5 typ host")));
        rundreise(Message::Error(ErrorResponse {
            reason: "AUTH".into(),
            verbose_reason: Some("token expired".into()),
            optional_items: extras(),
        }));
        rundreise(Message::Error(ErrorResponse {
            reason: "AUTH".into(),
            verbose_reason: None,
            optional_items: OptionalItems::new(),
        }));
        let status = SignalingStatus {
            streaming: streaming(),
            counts: ConnectionCounts {
                minutes: 12,
                channel_connections: 3,
                upstream_connections: 1,
                downstream_connections: 2,
            },
            optional_items: extras(),
        };
        rundreise(Message::SignalingConnected(status.clone()));
        rundreise(Message::SignalingUpdated(status));
        rundreise(Message::SignalingDisconnected(SignalingDisconnected {
            streaming: streaming(),
            optional_items: OptionalItems::new(),
        }));
        rundreise(Message::SignalingFailed(SignalingFailed {
            streaming: streaming(),
            reason: FailureReason::DuplicatedChannelId,
            optional_items: extras(),
        }));
        rundreise(Message::ArchiveFinished(ArchiveFinished {
            streaming: streaming(),
            created_at: Utc.with_ymd_and_hms(2016, 5, 20, 12, 30, 0).unwrap(),
            file_path: "/var/sora/archive/a.webm".into(),
            file_name: "a.webm".into(),
            size: 4_294_967_296,
            video_codec: VideoCodec::Vp9,
            audio_codec: AudioCodec::Opus,
            optional_items: extras(),
        }));
        rundreise(Message::ArchiveFailed(ArchiveFailed {
            client_id: ClientId::from("c1"),
            channel_id: ChannelId::neu("room-1").unwrap(),
            reason: FailureReason::SdpParseFailure,
            optional_items: OptionalItems::new(),
        }));
        rundreise(Message::TransportEncrypted(TransportEncrypted {
            optional_items: extras(),
        }));
    }

    #[test]
    fn unbekannte_felder_bleiben_erhalten() {
        let wire = json!({
            "type": "offer",
            "client_id": "c1",
            "sdp": "v=0",
            "mid": {"audio": "0"},
            "encodings": [],
        });
        let m = decode(&wire).unwrap();
        assert_eq!(m.optional_items().len(), 2);
        assert_eq!(encode(&m), wire);
    }

    #[test]
    fn typisierte_felder_gewinnen() {
        let mut answer = AnswerMessage::neu("echtes sdp");
        answer.optional_items.insert("sdp".into(), json!("falsch"));
        answer.optional_items.insert("type".into(), json!("offer"));
        let wert = encode(&Message::Answer(answer));
        assert_eq!(wert, json!({"type": "answer", "sdp": "echtes sdp"}));
    }

    #[test]
    fn fehlender_oder_unbekannter_typ() {
        assert_eq!(
            decode(&json!({"sdp": "v=0"})),
            Err(DecodeError::UnknownMessageType(None))
        );
        assert_eq!(
            decode(&json!({"type": "ping"})),
            Err(DecodeError::UnknownMessageType(Some("ping".into())))
        );
        assert!(matches!(
            decode(&json!({"type": 7})),
            Err(DecodeError::UnknownMessageType(Some(_)))
        ));
    }

    #[test]
    fn fehlendes_pflichtfeld() {
        assert_eq!(
            decode(&json!({"type": "offer", "sdp": "v=0"})),
            Err(DecodeError::MissingField("client_id"))
        );
        assert_eq!(
            decode(&json!({"type": "candidate"})),
            Err(DecodeError::MissingField("candidate"))
        );
    }

    #[test]
    fn rolle_wird_exakt_geprueft() {
        let e = decode(&json!({
            "type": "signaling-disconnected",
            "role": "Upstream",
            "client_id": "c1",
            "channel_id": "room",
        }))
        .unwrap_err();
        assert_eq!(
            e,
            DecodeError::InvalidEnumValue {
                key: "role",
                value: "Upstream".into()
            }
        );
    }

    #[test]
    fn negative_oder_gebrochene_zahlen_sind_ungueltig() {
        let mut wire = json!({
            "type": "signaling-updated",
            "role": "upstream",
            "client_id": "c1",
            "channel_id": "room",
            "minutes": -1,
            "channel_connections": 1,
            "upstream_connections": 1,
            "downstream_connections": 0,
        });
        assert!(matches!(
            decode(&wire),
            Err(DecodeError::InvalidEnumValue { key: "minutes", .. })
        ));
        wire["minutes"] = json!(1.5);
        assert!(matches!(
            decode(&wire),
            Err(DecodeError::InvalidEnumValue { key: "minutes", .. })
        ));
    }

    #[test]
    fn kein_objekt_ist_ungueltige_nutzlast() {
        assert!(matches!(
            decode(&json!([1, 2])),
            Err(DecodeError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode(&json!("offer")),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn fehlergrund_in_grossschreibung() {
        let m = decode(&json!({
            "type": "archive-failed",
            "client_id": "c1",
            "channel_id": "room",
            "reason": "AUTHENTICATION-FAILURE",
        }))
        .unwrap();
        assert_eq!(m.failure_reason(), Some(FailureReason::AuthenticationFailure));
    }

    #[test]
    fn ungueltiger_zeitstempel() {
        let e = decode(&json!({
            "type": "archive-finished",
            "role": "upstream",
            "client_id": "c1",
            "channel_id": "room",
            "created_at": "gestern",
            "file_path": "/a",
            "file_name": "a",
            "size": 1,
            "video_codec_type": "VP8",
            "audio_codec_type": "OPUS",
        }))
        .unwrap_err();
        assert!(matches!(
            e,
            DecodeError::InvalidEnumValue { key: "created_at", .. }
        ));
    }
}
