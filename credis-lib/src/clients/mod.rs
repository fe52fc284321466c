mod client;
pub use client::Client;

mod keys;
pub use keys::{KeyType, Ttl};

mod strings;

mod lists;

mod sets;

mod zsets;

mod blocking_client;
pub use blocking_client::BlockingClient;
