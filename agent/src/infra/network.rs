//! Network infrastructure: implements `PortAllocator` by asking the kernel.

use std::net::{Ipv4Addr, TcpListener};

use anyhow::{Context, Result};

use crate::application::ports::PortAllocator;

/// Binds port 0 on all interfaces and reports what the kernel picked.
///
/// The scratch socket is closed before returning so the broker can bind the
/// port itself; the port is free at allocation time, not reserved.
pub struct EphemeralPortAllocator;

impl PortAllocator for EphemeralPortAllocator {
    fn allocate(&self) -> Result<u16> {
        let listener =
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).context("binding scratch socket")?;
        let port = listener
            .local_addr()
            .context("reading scratch socket address")?
            .port();
        Ok(port)
    }
}
