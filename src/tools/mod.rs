//! Built-in tools served by the standalone binary and used as test
//! fixtures. Anything beyond these ships outside this crate, implementing
//! [`crate::tool::Tool`].

pub mod clock;
pub mod echo;

pub use clock::ClockTool;
pub use echo::EchoTool;
