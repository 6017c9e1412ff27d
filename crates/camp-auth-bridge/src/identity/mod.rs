/*
[INPUT]:  Signed challenges from the auth bridge
[OUTPUT]: Identity sessions and account snapshots (usage, profile, socials)
[POS]:    Identity layer - backing identity service integrations
[UPDATE]: When adding identity backends or endpoints
*/

pub mod http;
pub mod service;
pub mod simulated;
pub mod token;

pub use http::{HttpIdentityService, VerifyResponse};
pub use service::{IdentityService, LinkedSocials, Profile, UsageStats};
pub use simulated::SimulatedIdentityService;
pub use token::AccessTokenStore;
