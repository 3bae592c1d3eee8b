pub mod server;

/// Actions the CLI can dispatch.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        idp_url: String,
        public_url: String,
        session_ttl_seconds: i64,
        submit_timeout_seconds: u64,
    },
}
