//! Out-of-band commands posted to the agent by its pages.

/// Command to activate a waiting agent right away
pub const FORCE_ACTIVATE: &str = "force-activate";
/// Command to fetch every asset not cached yet
pub const DOWNLOAD_OFFLINE: &str = "download-offline";

// Spellings used by pages generated by older build tools.
const SKIP_WAITING_LEGACY: &str = "skipWaiting";
const DOWNLOAD_OFFLINE_LEGACY: &str = "downloadOffline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMessage {
    ForceActivate,
    DownloadOffline,
}

impl AgentMessage {
    /// Match a raw message by exact value; anything unknown is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            FORCE_ACTIVATE | SKIP_WAITING_LEGACY => Some(Self::ForceActivate),
            DOWNLOAD_OFFLINE | DOWNLOAD_OFFLINE_LEGACY => Some(Self::DownloadOffline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceActivate => FORCE_ACTIVATE,
            Self::DownloadOffline => DOWNLOAD_OFFLINE,
        }
    }
}
