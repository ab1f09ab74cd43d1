//! Network-interface settings record.
//!
//! | Offset | Width | Field          |
//! |--------|-------|----------------|
//! | 0      | 4     | magic `NETX`   |
//! | 4      | 1     | DHCP enable    |
//! | 5      | 4     | IPv4 address   |
//! | 9      | 4     | subnet mask    |
//! | 13     | 4     | gateway        |
//! | 17     | 1     | checksum       |
//!
//! Addresses are stored as octets in network order.  Defaults: DHCP on,
//! all addresses `0.0.0.0`.

use core::any::Any;
use core::net::Ipv4Addr;

use super::{MAGIC_LEN, Record, RecordError, RecordImage};

pub const NET_MAGIC: [u8; MAGIC_LEN] = *b"NETX";
pub const NET_RECORD_SIZE: usize = 18;

const OFF_DHCP: usize = 4;
const OFF_IP: usize = 5;
const OFF_MASK: usize = 9;
const OFF_GATEWAY: usize = 13;

/// DHCP flag and static IPv4 configuration of the station interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkRecord {
    image: RecordImage<NET_RECORD_SIZE>,
}

impl NetworkRecord {
    /// Zero-initialised (not yet sane) record.
    pub fn new() -> Self {
        Self::default()
    }

    /// A record already reset to defaults.
    pub fn with_defaults() -> Self {
        let mut rec = Self::new();
        rec.reset_dflt();
        rec
    }

    pub fn dhcp_enabled(&self) -> bool {
        self.image.u8_at(OFF_DHCP) != 0
    }

    pub fn set_dhcp_enabled(&mut self, enabled: bool) {
        self.image.set_u8(OFF_DHCP, u8::from(enabled));
    }

    pub fn ip_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.image.array_at::<4>(OFF_IP))
    }

    pub fn set_ip_addr(&mut self, addr: Ipv4Addr) {
        self.image.set_bytes(OFF_IP, &addr.octets());
    }

    pub fn subnet_mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.image.array_at::<4>(OFF_MASK))
    }

    pub fn set_subnet_mask(&mut self, mask: Ipv4Addr) {
        self.image.set_bytes(OFF_MASK, &mask.octets());
    }

    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.image.array_at::<4>(OFF_GATEWAY))
    }

    pub fn set_gateway(&mut self, gateway: Ipv4Addr) {
        self.image.set_bytes(OFF_GATEWAY, &gateway.octets());
    }

    /// Raw image, mainly for diagnostics.
    pub fn as_bytes(&self) -> &[u8; NET_RECORD_SIZE] {
        self.image.bytes()
    }
}

impl Record for NetworkRecord {
    fn name(&self) -> &'static str {
        "net"
    }

    fn magic(&self) -> &'static [u8; MAGIC_LEN] {
        &NET_MAGIC
    }

    fn is_sane(&self) -> bool {
        self.image.is_sane(&NET_MAGIC)
    }

    fn is_dirty(&self) -> bool {
        self.image.is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.image.clear_dirty();
    }

    fn reset_dflt(&mut self) {
        self.image.reset(&NET_MAGIC, |img| {
            img.put(OFF_DHCP, &[1]);
            // Addresses stay 0.0.0.0 from the zero fill.
        });
    }

    fn rec_size(&self) -> usize {
        NET_RECORD_SIZE
    }

    fn serialize(&self, out: &mut [u8]) -> Result<usize, RecordError> {
        self.image.store(out)
    }

    fn deserialize(&mut self, src: &[u8]) -> Result<(), RecordError> {
        self.image.load(src)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
