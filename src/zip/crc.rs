const fn gen_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let poly = 0xEDB88320; // Polynomial used in CRC-32

    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ poly;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }

    table
}

static CRC_TABLE: [u32; 256] = gen_crc_table();

/// Incremental CRC-32 (IEEE) over a run of bytes.
///
/// One accumulator covers exactly one entry extraction: feed every payload
/// byte through [`update`](Self::update) and read the result with
/// [`finalize`](Self::finalize).
#[derive(Debug, Clone)]
pub struct ChecksumAccumulator {
    state: u32,
}

impl ChecksumAccumulator {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.state = data.iter().fold(self.state, |crc, &b| {
            CRC_TABLE[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8)
        });
    }

    pub fn finalize(&self) -> u32 {
        !self.state
    }
}

impl Default for ChecksumAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the CRC-32 of a byte slice in one go.
pub fn crc32(data: &[u8]) -> u32 {
    let mut acc = ChecksumAccumulator::new();
    acc.update(data);
    acc.finalize()
}
