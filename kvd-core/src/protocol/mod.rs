//! Wire protocols: the whitespace-delimited `\r\n`-terminated line
//! protocol used by the TCP server, and the length-prefixed `bincode`
//! framing used by the RPC server.

pub mod line;
pub mod rpc;
