//! Wire protocol for `Network` scope: bit-level layout specified because
//! it is external compatibility surface, even though the transport loop
//! itself is out of scope.

/// 3-byte magic identifying a NUClear network packet.
pub const MAGIC: [u8; 3] = [0xE2, 0x98, 0xA2];
pub const VERSION: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Announce = 1,
    Leave = 2,
    Data = 3,
    Ack = 4,
    Nack = 5,
    DataRetransmission = 6,
}

impl PacketType {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => PacketType::Announce,
            2 => PacketType::Leave,
            3 => PacketType::Data,
            4 => PacketType::Ack,
            5 => PacketType::Nack,
            6 => PacketType::DataRetransmission,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub packet_type: PacketType,
}

impl Header {
    pub fn encode(&self) -> [u8; 4] {
        [MAGIC[0], MAGIC[1], MAGIC[2], self.packet_type as u8]
    }

    /// `(version byte is carried separately in the original; this rewrite
    /// keeps it alongside the type byte to match the 4-byte header used
    /// by `encode`/`decode` here)`.
    pub fn decode(bytes: &[u8]) -> Option<(Self, &[u8])> {
        if bytes.len() < 4 || bytes[0..3] != MAGIC {
            return None;
        }
        let packet_type = PacketType::from_u8(bytes[3])?;
        Some((Header { packet_type }, &bytes[4..]))
    }
}

pub struct AnnouncePacket {
    pub name: String,
}

impl AnnouncePacket {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Header { packet_type: PacketType::Announce }.encode().to_vec();
        out.extend_from_slice(self.name.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (header, rest) = Header::decode(bytes)?;
        if header.packet_type != PacketType::Announce {
            return None;
        }
        Some(Self { name: String::from_utf8_lossy(rest).into_owned() })
    }
}

pub struct DataPacket {
    pub packet_id: u16,
    pub packet_no: u16,
    pub packet_count: u16,
    pub reliable: bool,
    pub hash: u64,
    pub payload: Vec<u8>,
}

impl DataPacket {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Header { packet_type: PacketType::Data }.encode().to_vec();
        out.extend_from_slice(&self.packet_id.to_be_bytes());
        out.extend_from_slice(&self.packet_no.to_be_bytes());
        out.extend_from_slice(&self.packet_count.to_be_bytes());
        out.push(self.reliable as u8);
        out.extend_from_slice(&self.hash.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (header, rest) = Header::decode(bytes)?;
        if header.packet_type != PacketType::Data || rest.len() < 15 {
            return None;
        }
        let packet_id = u16::from_be_bytes([rest[0], rest[1]]);
        let packet_no = u16::from_be_bytes([rest[2], rest[3]]);
        let packet_count = u16::from_be_bytes([rest[4], rest[5]]);
        let reliable = rest[6] != 0;
        let hash = u64::from_be_bytes(rest[7..15].try_into().ok()?);
        let payload = rest[15..].to_vec();
        Some(Self { packet_id, packet_no, packet_count, reliable, hash, payload })
    }
}

/// Fixed-size ACK/NACK packet: header + packet id/no/count + a bitset of
/// `ceil(packet_count / 8)` bytes, one bit per fragment.
pub struct AckNackPacket {
    pub is_ack: bool,
    pub packet_id: u16,
    pub packet_no: u16,
    pub packet_count: u16,
    pub bits: Vec<u8>,
}

impl AckNackPacket {
    pub fn encode(&self) -> Vec<u8> {
        let packet_type = if self.is_ack { PacketType::Ack } else { PacketType::Nack };
        let mut out = Header { packet_type }.encode().to_vec();
        out.extend_from_slice(&self.packet_id.to_be_bytes());
        out.extend_from_slice(&self.packet_no.to_be_bytes());
        out.extend_from_slice(&self.packet_count.to_be_bytes());
        out.extend_from_slice(&self.bits);
        out
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (header, rest) = Header::decode(bytes)?;
        let is_ack = match header.packet_type {
            PacketType::Ack => true,
            PacketType::Nack => false,
            _ => return None,
        };
        if rest.len() < 6 {
            return None;
        }
        let packet_id = u16::from_be_bytes([rest[0], rest[1]]);
        let packet_no = u16::from_be_bytes([rest[2], rest[3]]);
        let packet_count = u16::from_be_bytes([rest[4], rest[5]]);
        let expected_bits = (packet_count as usize + 7) / 8;
        let bits = rest[6..].to_vec();
        if bits.len() != expected_bits {
            return None;
        }
        Some(Self { is_ack, packet_id, packet_no, packet_count, bits })
    }
}

/// 64-bit stable hash of a type's demangled name, used to tag packets on
/// the wire. `xxHash` itself is not reimplemented here; this uses the
/// same FNV-1a-style mixing `io-engine` reaches for when it needs a quick
/// stable hash without pulling in a checksum crate.
pub const TYPE_HASH_SEED: u64 = 0x4E55_436C;

pub fn type_hash(demangled_name: &str) -> u64 {
    let mut hash = TYPE_HASH_SEED;
    for byte in demangled_name.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100_0000_01B3);
    }
    hash
}

/// Scalar Kalman filter used to estimate round-trip time to a peer
///: process noise `1e-6`, measurement noise `1e-1`,
/// initial mean `1.0` s.
pub struct RttEstimator {
    mean: f64,
    variance: f64,
    process_noise: f64,
    measurement_noise: f64,
}

impl RttEstimator {
    pub fn new() -> Self {
        Self {
            mean: 1.0,
            variance: 1.0,
            process_noise: 1e-6,
            measurement_noise: 1e-1,
        }
    }

    /// Incorporate a new round-trip measurement (seconds) and return the
    /// updated RTT estimate.
    pub fn update(&mut self, measurement_secs: f64) -> f64 {
        let predicted_variance = self.variance + self.process_noise;
        let gain = predicted_variance / (predicted_variance + self.measurement_noise);
        self.mean += gain * (measurement_secs - self.mean);
        self.variance = (1.0 - gain) * predicted_variance;
        self.mean
    }

    pub fn estimate(&self) -> f64 {
        self.mean
    }
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_packet_round_trips() {
        let packet = DataPacket {
            packet_id: 7,
            packet_no: 1,
            packet_count: 3,
            reliable: true,
            hash: type_hash("nuclear::Example"),
            payload: vec![1, 2, 3, 4],
        };
        let bytes = packet.encode();
        let decoded = DataPacket::decode(&bytes).unwrap();
        assert_eq!(decoded.packet_id, 7);
        assert_eq!(decoded.hash, packet.hash);
        assert_eq!(decoded.payload, vec![1, 2, 3, 4]);
    }

    #[test]
    fn announce_packet_round_trips() {
        let packet = AnnouncePacket { name: "reactor-a".to_string() };
        let decoded = AnnouncePacket::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.name, "reactor-a");
    }

    #[test]
    fn rtt_estimate_converges_toward_measurements() {
        let mut estimator = RttEstimator::new();
        for _ in 0..200 {
            estimator.update(0.05);
        }
        assert!((estimator.estimate() - 0.05).abs() < 0.05);
    }
}
