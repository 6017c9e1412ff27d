/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public wallet-to-identity auth bridge crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod bridge;
pub mod config;
pub mod error;
pub mod identity;
pub mod provider;
pub mod telemetry;
pub mod wallet;

// Re-export commonly used types from bridge
pub use bridge::{AttemptGuard, AuthBridge, AuthMethod, AuthState, ChallengeMessage, Session};

pub use crate::config::{BridgeConfig, IdentityConfig, LoggingConfig, Settings};

pub use error::{AuthError, IdentityError, ProviderError, Result, WalletError};

// Re-export commonly used types from identity
pub use identity::{
    AccessTokenStore,
    HttpIdentityService,
    IdentityService,
    LinkedSocials,
    Profile,
    SimulatedIdentityService,
    UsageStats,
};

pub use provider::OriginProvider;
pub use telemetry::{TelemetryGuard, init_tracing};

// Re-export commonly used types from wallet
pub use wallet::{LocalEvmWallet, MockWallet, WalletCapability, WalletState};
