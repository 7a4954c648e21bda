//! Wire contract between the Harbor Drive engine and the file-browser
//! extension.
//!
//! This crate is shared by the extension bridge and the engine-side listener
//! to prevent schema drift. Command field names, push-notification names and
//! the badge vocabulary are a versioned contract: both processes must agree
//! on them, so they live here as constants rather than inline strings.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// URL scheme registered by the desktop client for engine triggers.
pub const URL_SCHEME: &str = "harbordrive";

/// Localhost port the engine's one-shot command listener binds.
pub const ENGINE_PORT: u16 = 50675;

pub const SYNC_STATUS_NOTIFICATION: &str = "syncStatus";
pub const WATCH_FOLDER_NOTIFICATION: &str = "watchFolder";
pub const SET_CONFIG_NOTIFICATION: &str = "setConfig";

/// Context-menu label slots a `setConfig` push may replace, in order:
/// access-online, copy-share-link, edit-metadata, direct-transfer.
pub const MENU_LABEL_SLOTS: usize = 4;

pub fn default_engine_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), ENGINE_PORT)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown notification `{0}`")]
    UnknownNotification(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown sync status `{0}`")]
    UnknownStatus(String),
    #[error("unknown watch operation `{0}`")]
    UnknownOperation(String),
}

/// Badge vocabulary. Each status maps 1:1 to a badge image/label pair the
/// extension registers once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Syncing,
    Conflicted,
    Error,
    Locked,
    Unsynced,
}

impl SyncStatus {
    /// Every status, in badge-registration order.
    pub const ALL: [SyncStatus; 6] = [
        SyncStatus::Synced,
        SyncStatus::Syncing,
        SyncStatus::Conflicted,
        SyncStatus::Error,
        SyncStatus::Locked,
        SyncStatus::Unsynced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Conflicted => "conflicted",
            SyncStatus::Error => "error",
            SyncStatus::Locked => "locked",
            SyncStatus::Unsynced => "unsynced",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "synced" => Some(SyncStatus::Synced),
            "syncing" => Some(SyncStatus::Syncing),
            "conflicted" => Some(SyncStatus::Conflicted),
            "error" => Some(SyncStatus::Error),
            "locked" => Some(SyncStatus::Locked),
            "unsynced" => Some(SyncStatus::Unsynced),
            _ => None,
        }
    }

    /// Human-readable label shown next to the badge image.
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "Synced",
            SyncStatus::Syncing => "Syncing",
            SyncStatus::Conflicted => "Conflicted",
            SyncStatus::Error => "Error",
            SyncStatus::Locked => "Locked",
            SyncStatus::Unsynced => "Not synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot command the extension writes to the engine's localhost listener.
/// The engine replies asynchronously over the push channel, never on this
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum EngineCommand {
    GetStatus { path: String },
    TriggerWatch,
}

impl EngineCommand {
    pub fn get_status(path: impl Into<String>) -> Self {
        EngineCommand::GetStatus { path: path.into() }
    }

    /// Serialized envelope, without the transport's newline framing.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// One `(path, status)` pair from a `syncStatus` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStatus {
    pub path: String,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOperation {
    Watch,
    Unwatch,
}

impl WatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchOperation::Watch => "watch",
            WatchOperation::Unwatch => "unwatch",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "watch" => Some(WatchOperation::Watch),
            "unwatch" => Some(WatchOperation::Unwatch),
            _ => None,
        }
    }
}

/// A decoded push notification from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    SyncStatus(Vec<PathStatus>),
    WatchFolder {
        operation: WatchOperation,
        path: String,
    },
    SetConfig(Vec<String>),
}

/// Decodes a named push notification. A payload missing a required field
/// fails as a whole; callers drop the notification rather than apply part
/// of it.
pub fn parse_push(name: &str, payload: &Value) -> Result<PushEvent, ProtocolError> {
    match name {
        SYNC_STATUS_NOTIFICATION => parse_sync_status(payload),
        WATCH_FOLDER_NOTIFICATION => parse_watch_folder(payload),
        SET_CONFIG_NOTIFICATION => parse_set_config(payload),
        other => Err(ProtocolError::UnknownNotification(other.to_string())),
    }
}

fn parse_sync_status(payload: &Value) -> Result<PushEvent, ProtocolError> {
    if let Some(items) = payload.get("statuses") {
        let items = items
            .as_array()
            .ok_or(ProtocolError::MissingField("statuses"))?;
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            pairs.push(parse_pair(item)?);
        }
        return Ok(PushEvent::SyncStatus(pairs));
    }
    // Engines predating the batch shape send one flat pair per notification.
    let pair = parse_pair(payload)?;
    Ok(PushEvent::SyncStatus(vec![pair]))
}

fn parse_pair(value: &Value) -> Result<PathStatus, ProtocolError> {
    let path = require_string(value, "path")?;
    let raw = require_string(value, "status")?;
    let status =
        SyncStatus::from_str(raw).ok_or_else(|| ProtocolError::UnknownStatus(raw.to_string()))?;
    Ok(PathStatus {
        path: path.to_string(),
        status,
    })
}

fn parse_watch_folder(payload: &Value) -> Result<PushEvent, ProtocolError> {
    let raw = require_string(payload, "operation")?;
    let operation = WatchOperation::from_str(raw)
        .ok_or_else(|| ProtocolError::UnknownOperation(raw.to_string()))?;
    let path = require_string(payload, "path")?.to_string();
    Ok(PushEvent::WatchFolder { operation, path })
}

fn parse_set_config(payload: &Value) -> Result<PushEvent, ProtocolError> {
    let entries = payload
        .get("entries")
        .and_then(Value::as_array)
        .ok_or(ProtocolError::MissingField("entries"))?;
    let mut labels = Vec::with_capacity(entries.len());
    for entry in entries {
        let label = entry
            .as_str()
            .ok_or(ProtocolError::MissingField("entries"))?;
        labels.push(label.to_string());
    }
    Ok(PushEvent::SetConfig(labels))
}

fn require_string<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ProtocolError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|candidate| !candidate.trim().is_empty())
        .ok_or(ProtocolError::MissingField(field))
}

/// Verbs understood by the engine's URL-scheme handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlCommand {
    AccessOnline,
    CopyShareLink,
    EditMetadata,
    DirectTransfer,
    SyncStatus,
    TriggerWatch,
}

impl UrlCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            UrlCommand::AccessOnline => "access-online",
            UrlCommand::CopyShareLink => "copy-share-link",
            UrlCommand::EditMetadata => "edit-metadata",
            UrlCommand::DirectTransfer => "direct-transfer",
            // Historical underscore form; the engine matches it verbatim.
            UrlCommand::SyncStatus => "sync_status",
            UrlCommand::TriggerWatch => "trigger-watch",
        }
    }

    pub fn from_verb(value: &str) -> Option<Self> {
        match value {
            "access-online" => Some(UrlCommand::AccessOnline),
            "copy-share-link" => Some(UrlCommand::CopyShareLink),
            "edit-metadata" => Some(UrlCommand::EditMetadata),
            "direct-transfer" => Some(UrlCommand::DirectTransfer),
            "sync_status" => Some(UrlCommand::SyncStatus),
            "trigger-watch" => Some(UrlCommand::TriggerWatch),
            _ => None,
        }
    }
}

// Escapes for the path component of a trigger URL. `/` separators stay
// literal so the engine sees the original path shape; non-ASCII bytes are
// always escaped by the encoder.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?');

/// Builds the fire-and-forget navigation URL for a command on one path,
/// e.g. `harbordrive://access-online/tmp/a%20file.txt`.
pub fn trigger_url(command: UrlCommand, path: &Path) -> String {
    let raw = path.to_string_lossy();
    let encoded = utf8_percent_encode(raw.trim_start_matches('/'), PATH_ESCAPES);
    format!("{}://{}/{}", URL_SCHEME, command.verb(), encoded)
}
