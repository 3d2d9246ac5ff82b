mod http;
mod ping;
mod ssl;
mod tcp;

pub use http::HttpProbe;
pub use ping::PingProbe;
pub use ssl::SslProbe;
pub use tcp::TcpProbe;
