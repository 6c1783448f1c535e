use core::fmt;

/// A 64-bit time-ordered unique ID.
///
/// - 1 bit reserved (always zero, so the value is non-negative as an `i64`)
/// - 41 bits timestamp (ms since the generator's epoch, e.g. [`DEFAULT_EPOCH`])
/// - 5 bits datacenter ID
/// - 5 bits server ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              17 16            12 11             0
///              +--------------+----------------+------------------+---------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter ID (5)| server ID (5) | sequence (12) |
///              +--------------+----------------+------------------+---------------+---------------+
///              |<------------------ MSB ----------- 64 bits ------------ LSB -------------------->|
/// ```
///
/// Because the timestamp occupies the highest value bits, numeric order equals
/// issuance order for IDs from a single generator, and roughly equals wall
/// clock order across generators.
///
/// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FloeId {
    id: u64,
}

impl FloeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit datacenter ID field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit server ID field. Occupies bits 12
    /// through 16.
    pub const SERVER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the datacenter ID to its correct position
    /// (bit 17).
    pub const DATACENTER_ID_SHIFT: u64 = 17;

    /// Number of bits to shift the server ID to its correct position (bit 12).
    pub const SERVER_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the four fields into an ID, masking each to its field width.
    pub const fn from_parts(
        timestamp: u64,
        datacenter_id: u64,
        server_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let server_id = (server_id & Self::SERVER_ID_MASK) << Self::SERVER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | server_id | sequence,
        }
    }

    /// Constructs an ID from its components, asserting that each fits its
    /// field.
    ///
    /// Out-of-range components are a contract violation by the caller, not a
    /// runtime condition, so this asserts in debug builds and masks in
    /// release builds.
    pub fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        server_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            datacenter_id <= Self::DATACENTER_ID_MASK,
            "datacenter_id overflow"
        );
        debug_assert!(server_id <= Self::SERVER_ID_MASK, "server_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from_parts(timestamp, datacenter_id, server_id, sequence)
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter ID from the packed ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the server ID from the packed ID.
    pub const fn server_id(&self) -> u64 {
        (self.id >> Self::SERVER_ID_SHIFT) & Self::SERVER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the raw 64-bit representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Reconstructs an ID from its raw representation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a signed 64-bit value.
    ///
    /// The reserved top bit is always zero, so the result is non-negative and
    /// can be stored directly in a signed column such as a SQL `BIGINT`
    /// primary key.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns true if the sequence field can be incremented without wrapping.
    pub(crate) const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::SEQUENCE_MASK
    }

    /// Returns a new ID with the sequence incremented.
    pub(crate) const fn increment_sequence(&self) -> Self {
        Self::from_parts(
            self.timestamp(),
            self.datacenter_id(),
            self.server_id(),
            self.sequence() + 1,
        )
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to zero.
    pub(crate) const fn rollover_to(&self, timestamp: u64) -> Self {
        Self::from_parts(timestamp, self.datacenter_id(), self.server_id(), 0)
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<FloeId> for u64 {
    fn from(id: FloeId) -> Self {
        id.id
    }
}

impl From<u64> for FloeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for FloeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FloeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("server_id", &self.server_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
