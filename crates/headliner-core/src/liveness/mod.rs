//! Liveness endpoint and the self-ping loop that keeps an idle host awake.
//!
//! Neither touches the news store or the mail relay.

mod pinger;
mod server;

pub use pinger::{ping_url, KeepAlive};
pub use server::{bind, create_app, serve, PING_BODY, ROOT_BODY};
