//! Network transfer parameters (§6.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Udt,
    /// UDP with a 64-bit sequence number prefix on every datagram.
    Udps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetParms {
    pub protocol: Protocol,
    pub blocksize: u32,
    pub nblock: u32,
    pub mtu: u32,
    pub interpacket_delay_ns: u64,
    pub rcvbufsize: u32,
    pub sndbufsize: u32,
}

impl Default for NetParms {
    fn default() -> Self {
        NetParms {
            protocol: Protocol::Tcp,
            blocksize: 128 * 1024,
            nblock: 8,
            mtu: 1500,
            interpacket_delay_ns: 0,
            rcvbufsize: 4 * 1024 * 1024,
            sndbufsize: 4 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_netparms_use_tcp() {
        assert_eq!(NetParms::default().protocol, Protocol::Tcp);
    }
}
