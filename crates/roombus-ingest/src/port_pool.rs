//! LISTENER-mode port allocation (§4.5, §6, §8).
//!
//! SRT/RIST listener sources need a free UDP port in a configured range.
//! There is no reservation table beyond the database's `listener_port`
//! column, so allocation is a probe-bind: try to bind each candidate port,
//! keep it only long enough to know it's free, then hand the number back
//! for the child process to bind for real.

use std::collections::HashSet;
use std::net::SocketAddr;

use socket2::{Domain, Socket, Type};

fn probe_bind(port: u16) -> bool {
    let Ok(socket) = Socket::new(Domain::IPV4, Type::DGRAM, None) else {
        return false;
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    socket.bind(&addr.into()).is_ok()
}

/// Scans `[min, max]` for the first port that is neither in `taken` nor
/// already bound by something else on the host.
pub async fn allocate_port(min: u16, max: u16, taken: HashSet<u16>) -> Option<u16> {
    tokio::task::spawn_blocking(move || (min..=max).find(|port| !taken.contains(port) && probe_bind(*port)))
        .await
        .unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_taken_ports_even_if_bindable() {
        let mut taken = HashSet::new();
        taken.insert(40000);
        taken.insert(40001);
        let port = allocate_port(40000, 40010, taken).await.unwrap();
        assert!(port >= 40002);
    }
}
