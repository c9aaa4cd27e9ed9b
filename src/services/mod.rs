pub mod shopify;
pub mod publer;
pub mod chatwoot;

pub use shopify::{ShopifySettings, create_shopify_client};
pub use publer::{PublerSettings, create_publer_client};
pub use chatwoot::{ChatwootSettings, create_chatwoot_client};
