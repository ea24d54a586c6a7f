//! pcdoc daemon - HTTP front end for the diagnosis engine

pub mod routes;
pub mod server;
