//! Interactive Spotify authorization.
//!
//! - [`callback_server`]: loopback HTTP server receiving the OAuth redirect
//! - [`rendezvous`]: single-use handoff from the callback handler to the flow
//! - [`browser`]: system browser launcher
//! - [`orchestrator`]: the Authorization Code + PKCE flow tying them together

pub mod browser;
pub mod callback_server;
pub mod orchestrator;
pub mod rendezvous;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use callback_server::{CallbackGuard, CallbackServer, RedirectTarget};
pub use orchestrator::Authenticator;
pub use rendezvous::{rendezvous, AuthResult, RendezvousReceiver, RendezvousSender, WaitError};
