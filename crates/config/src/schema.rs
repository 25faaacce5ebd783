//! Config schema.

use serde::{Deserialize, Serialize};

use parley_protocol::{BOT_FALLBACK_MS, BOT_REPLY_DELAY_MS};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub gateway: GatewaySection,
    pub matching: MatchingSection,
}

/// HTTP/WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 9870,
        }
    }
}

/// Matchmaking timing knobs. Defaults come from the protocol constants;
/// deployments rarely touch these, tests shrink them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    /// Milliseconds a waiter sits in the queue before the bot steps in.
    pub bot_fallback_ms: u64,
    /// Milliseconds of simulated thinking before a bot reply.
    pub bot_reply_delay_ms: u64,
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            bot_fallback_ms: BOT_FALLBACK_MS,
            bot_reply_delay_ms: BOT_REPLY_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let cfg = ParleyConfig::default();
        assert_eq!(cfg.matching.bot_fallback_ms, 15_000);
        assert_eq!(cfg.matching.bot_reply_delay_ms, 700);
        assert_eq!(cfg.gateway.bind, "127.0.0.1");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: ParleyConfig = toml::from_str("[gateway]\nport = 8080\n").unwrap();
        assert_eq!(cfg.gateway.port, 8080);
        assert_eq!(cfg.gateway.bind, "127.0.0.1");
        assert_eq!(cfg.matching.bot_fallback_ms, 15_000);
    }
}
