//! Public types for the Colloquy API.

mod credentials;
mod page;
mod protocol;
mod render;

pub use credentials::{CredentialSet, ProviderKind};
pub use page::Page;
pub use protocol::{Request, Response};
pub use render::RenderEvent;
