/// External HTTP APIs
pub mod client;
pub mod nightscout;

pub use client::HttpClient;
pub use nightscout::NightscoutClient;
