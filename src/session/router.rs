//! Transport event routing.
//!
//! [`route`] turns each [`TransportEvent`] into the line the operator sees and
//! the follow-up the controller owes it. Lifecycle events carry no line here
//! because their wording depends on controller state.

use crate::sanitize;
use crate::transport::{ChannelInfo, DisconnectKind, PermissionDeniedKind, TransportEvent};

/// What the controller has to do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Connected {
        remote_addr: String,
        welcome_message: Option<String>,
    },
    Disconnected {
        kind: DisconnectKind,
    },
    /// Announce the participant count once the roster settles.
    CheckParticipants,
    None,
}

/// Result of routing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub line: Option<String>,
    pub action: Action,
}

impl Routed {
    fn action(action: Action) -> Self {
        Self { line: None, action }
    }

    fn log(line: String, action: Action) -> Self {
        Self {
            line: Some(line),
            action,
        }
    }
}

pub fn route(event: TransportEvent) -> Routed {
    match event {
        TransportEvent::Connected {
            remote_addr,
            welcome_message,
        } => Routed::action(Action::Connected {
            remote_addr,
            welcome_message,
        }),

        TransportEvent::Disconnected { kind } => Routed::action(Action::Disconnected { kind }),

        TransportEvent::TextMessage { sender, message } => {
            let sender = sender.unwrap_or_else(|| "server".to_string());
            let text = sanitize::html(&message);
            Routed::log(
                format!("Message from {}: {}", sender, text.trim()),
                Action::None,
            )
        }

        TransportEvent::UserChanged { user, change } => Routed::log(
            format!(
                "Change event for {}: {} ({})",
                user,
                change.description(),
                change.0
            ),
            Action::CheckParticipants,
        ),

        TransportEvent::ChannelChanged { .. } => Routed::action(Action::CheckParticipants),

        TransportEvent::PermissionDenied { kind, message } => {
            let info = if kind == PermissionDeniedKind::OTHER {
                message.unwrap_or_default()
            } else {
                kind.description().to_string()
            };
            Routed::log(format!("Permission denied: {}", info), Action::None)
        }

        TransportEvent::UserList
        | TransportEvent::Acl
        | TransportEvent::BanList
        | TransportEvent::ContextActionChange
        | TransportEvent::ServerConfig => Routed::action(Action::None),
    }
}

/// Line announcing who else is in our channel.
pub fn participant_line(channel: &ChannelInfo) -> String {
    if channel.user_count > 1 {
        format!(
            "Channel '{}' has {} participants",
            channel.name, channel.user_count
        )
    } else {
        format!("Channel '{}' has no other participants", channel.name)
    }
}
