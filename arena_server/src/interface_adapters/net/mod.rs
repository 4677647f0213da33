// Network adapter modules split by external client sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::{spawn_match_serializer, ws_handler};
pub use internal::{create_match_handler, remove_match_handler};
