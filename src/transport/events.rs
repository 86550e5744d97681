//! Lifecycle events delivered by a session transport.
//!
//! Transports push these through the [`super::EventSink`] they were handed at
//! connect time. The controller routes every variant through one exhaustive
//! match, so adding a variant here is a compile error until it is handled.

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    /// Network or protocol failure.
    Error,
    /// Removed by the server (kick).
    Kicked,
    /// Removed and banned by the server.
    Banned,
    /// Closed locally.
    User,
}

impl DisconnectKind {
    /// Only connection errors get a reason in the log; every other cause is
    /// reported generically.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            DisconnectKind::Error => Some("connection error"),
            _ => None,
        }
    }
}

/// Bit-coded description of what changed about a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserChangeKind(pub u32);

impl UserChangeKind {
    pub const CONNECTED: Self = Self(1 << 0);
    pub const DISCONNECTED: Self = Self(1 << 1);
    pub const KICKED: Self = Self(1 << 2);
    pub const BANNED: Self = Self(1 << 3);
    pub const REGISTERED: Self = Self(1 << 4);
    pub const UNREGISTERED: Self = Self(1 << 5);
    pub const NAME: Self = Self(1 << 6);
    pub const CHANNEL: Self = Self(1 << 7);
    pub const COMMENT: Self = Self(1 << 8);
    pub const AUDIO: Self = Self(1 << 9);
    pub const TEXTURE: Self = Self(1 << 10);
    pub const PRIORITY_SPEAKER: Self = Self(1 << 11);
    pub const RECORDING: Self = Self(1 << 12);
    pub const STATS: Self = Self(1 << 13);

    /// Human-readable description; unmapped codes (including combined bits)
    /// describe as an empty string.
    pub fn description(&self) -> &'static str {
        match *self {
            Self::CONNECTED => "connected",
            Self::DISCONNECTED => "disconnected",
            Self::KICKED => "kicked",
            Self::BANNED => "banned",
            Self::REGISTERED => "registered",
            Self::UNREGISTERED => "unregistered",
            Self::NAME => "changed name",
            Self::CHANNEL => "changed channel",
            Self::COMMENT => "changed comment",
            Self::AUDIO => "changed audio",
            Self::PRIORITY_SPEAKER => "is priority speaker",
            Self::RECORDING => "changed recording status",
            Self::STATS => "changed stats",
            _ => "",
        }
    }
}

/// Reason code attached to a permission-denied notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionDeniedKind(pub u32);

impl PermissionDeniedKind {
    pub const OTHER: Self = Self(0);
    pub const PERMISSION: Self = Self(1);
    pub const SUPER_USER: Self = Self(2);
    pub const INVALID_CHANNEL_NAME: Self = Self(3);
    pub const TEXT_TOO_LONG: Self = Self(4);
    pub const H9K: Self = Self(5);
    pub const TEMPORARY_CHANNEL: Self = Self(6);
    pub const MISSING_CERTIFICATE: Self = Self(7);
    pub const INVALID_USER_NAME: Self = Self(8);
    pub const CHANNEL_FULL: Self = Self(9);
    pub const NESTING_LIMIT: Self = Self(10);

    /// Fixed description for the code. `OTHER` carries free text from the
    /// server instead, so it is handled by the caller.
    pub fn description(&self) -> &'static str {
        match *self {
            Self::PERMISSION => "insufficient permissions",
            Self::SUPER_USER => "cannot modify SuperUser",
            Self::INVALID_CHANNEL_NAME => "invalid channel name",
            Self::TEXT_TOO_LONG => "text too long",
            Self::TEMPORARY_CHANNEL => "temporary channel",
            Self::MISSING_CERTIFICATE => "missing certificate",
            Self::INVALID_USER_NAME => "invalid user name",
            Self::CHANNEL_FULL => "channel full",
            Self::NESTING_LIMIT => "nesting limit",
            _ => "",
        }
    }
}

/// Everything a transport can report about the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The session is established and authenticated.
    Connected {
        /// Remote socket address as reported by the transport.
        remote_addr: String,
        /// Optional server banner (HTML).
        welcome_message: Option<String>,
    },

    /// The session ended.
    Disconnected {
        kind: DisconnectKind,
    },

    /// Chat text addressed to us or our channel.
    TextMessage {
        /// `None` when the server itself sent the message.
        sender: Option<String>,
        /// Message body (HTML).
        message: String,
    },

    /// Some user's state changed.
    UserChanged {
        user: String,
        change: UserChangeKind,
    },

    /// A channel was created, removed, or edited.
    ChannelChanged {
        channel: String,
    },

    /// The server refused a request.
    PermissionDenied {
        kind: PermissionDeniedKind,
        /// Free text sent with `PermissionDeniedKind::OTHER`.
        message: Option<String>,
    },

    UserList,
    Acl,
    BanList,
    ContextActionChange,
    ServerConfig,
}

impl TransportEvent {
    /// Short name used in debug logs.
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Connected { .. } => "connected",
            TransportEvent::Disconnected { .. } => "disconnected",
            TransportEvent::TextMessage { .. } => "text-message",
            TransportEvent::UserChanged { .. } => "user-changed",
            TransportEvent::ChannelChanged { .. } => "channel-changed",
            TransportEvent::PermissionDenied { .. } => "permission-denied",
            TransportEvent::UserList => "user-list",
            TransportEvent::Acl => "acl",
            TransportEvent::BanList => "ban-list",
            TransportEvent::ContextActionChange => "context-action-change",
            TransportEvent::ServerConfig => "server-config",
        }
    }
}
