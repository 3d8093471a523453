//! Buddy identity resolution.
//!
//! Maps a channel-scoped participant handle to a stable identity. Shared
//! channels go through the presence directory; direct links only ask the
//! connection for a display alias, because the remote peer is not
//! necessarily a known presence-service participant.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::ChannelTopology;
use crate::constants::{group_flags, DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR};
use crate::error::{Error, Result};
use crate::transport::{Connection, ParticipantHandle, PresenceDirectory};

/// Stroke and fill colors used to draw a buddy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub stroke: String,
    pub fill: String,
}

impl Default for ColorPair {
    fn default() -> Self {
        Self {
            stroke: DEFAULT_STROKE_COLOR.to_string(),
            fill: DEFAULT_FILL_COLOR.to_string(),
        }
    }
}

impl fmt::Display for ColorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.stroke, self.fill)
    }
}

/// A resolved sender identity.
///
/// Produced fresh on every resolution; never cached here, since group
/// membership can change between calls. Callers cache at their own layer if
/// they want to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuddyIdentity {
    /// A participant of a shared channel, keyed by a global handle in the
    /// presence directory.
    Presence {
        nick: String,
        colors: ColorPair,
        handle: ParticipantHandle,
    },
    /// The remote end of a one-to-one link.
    DirectPeer { nick: String, colors: ColorPair },
}

impl BuddyIdentity {
    /// Display name of the buddy.
    pub fn nick(&self) -> &str {
        match self {
            BuddyIdentity::Presence { nick, .. } => nick,
            BuddyIdentity::DirectPeer { nick, .. } => nick,
        }
    }

    /// Stroke/fill colors of the buddy.
    pub fn colors(&self) -> &ColorPair {
        match self {
            BuddyIdentity::Presence { colors, .. } => colors,
            BuddyIdentity::DirectPeer { colors, .. } => colors,
        }
    }

    /// Global handle, when the identity came from a shared channel.
    pub fn global_handle(&self) -> Option<ParticipantHandle> {
        match self {
            BuddyIdentity::Presence { handle, .. } => Some(*handle),
            BuddyIdentity::DirectPeer { .. } => None,
        }
    }
}

/// Stateless resolver from participant handles to buddy identities.
pub struct IdentityResolver {
    directory: Arc<dyn PresenceDirectory>,
    connection: Arc<dyn Connection>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn PresenceDirectory>, connection: Arc<dyn Connection>) -> Self {
        Self {
            directory,
            connection,
        }
    }

    /// Resolve a channel-scoped handle under the given topology.
    pub async fn resolve(
        &self,
        handle: ParticipantHandle,
        topology: ChannelTopology,
    ) -> Result<BuddyIdentity> {
        match topology {
            ChannelTopology::Group => self.resolve_group(handle).await,
            ChannelTopology::Direct => self.resolve_direct(handle).await,
        }
    }

    /// Shared-channel path: map the handle to a global handle, then consult
    /// the presence directory.
    async fn resolve_group(&self, handle: ParticipantHandle) -> Result<BuddyIdentity> {
        let conn = self.connection.as_ref();

        let global = if handle == conn.self_group_handle() {
            conn.self_handle()
        } else if conn.group_flags().await? & group_flags::CHANNEL_SPECIFIC_HANDLES != 0 {
            let owner = conn.handle_owner(handle).await?;
            if owner == 0 {
                return Err(Error::UnresolvedHandle(handle));
            }
            owner
        } else {
            // No per-channel remapping on this group: the handle already is
            // a global handle.
            handle
        };

        let entry =
            self.directory
                .lookup_buddy(conn.service_name(), conn.object_path(), global);
        match entry {
            Some(entry) => Ok(BuddyIdentity::Presence {
                nick: entry.nick,
                colors: entry.colors,
                handle: global,
            }),
            None => {
                debug!("👤 No presence entry for handle {}, using anonymous buddy", global);
                Ok(BuddyIdentity::Presence {
                    nick: "???".to_string(),
                    colors: ColorPair::default(),
                    handle: global,
                })
            }
        }
    }

    /// One-to-one path: the alias reported by the connection is the whole
    /// identity.
    async fn resolve_direct(&self, handle: ParticipantHandle) -> Result<BuddyIdentity> {
        let nick = self.connection.request_alias(handle).await?;
        Ok(BuddyIdentity::DirectPeer {
            nick,
            colors: ColorPair::default(),
        })
    }
}
