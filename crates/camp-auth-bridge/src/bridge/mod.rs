/*
[INPUT]:  Wallet connection state, signatures and identity service verdicts
[OUTPUT]: Authenticated sessions, errors as state, throttled attempts
[POS]:    Bridge layer - wallet-to-identity authentication
[UPDATE]: When the auth state machine changes
*/

pub mod attempt;
pub mod challenge;
pub mod manager;
pub mod session;

pub use attempt::AttemptGuard;
pub use challenge::ChallengeMessage;
pub use manager::AuthBridge;
pub use session::{AuthMethod, AuthState, Session};
