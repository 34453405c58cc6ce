/// Piece sizing thresholds.
///
/// Inserted text is cut into pieces of at most `max_piece_len` bytes, and
/// two neighbouring pieces whose combined length is at most
/// `min_piece_len` are merged after every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    pub min_piece_len: usize,
    pub max_piece_len: usize,
}

impl TreeConfig {
    const MIN_AVERAGE: usize = 128;
    const MAX_AVERAGE: usize = 64 * 1024;
    const SMALLEST_MAX: usize = 8;

    pub fn new(min_piece_len: usize, max_piece_len: usize) -> Self {
        let max_piece_len = max_piece_len.max(Self::SMALLEST_MAX);
        Self {
            min_piece_len: min_piece_len.min(max_piece_len),
            max_piece_len,
        }
    }

    /// Derive thresholds from the average length of the loaded chunks.
    pub fn from_average_chunk_len(average: usize) -> Self {
        let average = average.clamp(Self::MIN_AVERAGE, Self::MAX_AVERAGE);
        let min = average - average / 3;
        Self::new(min, min * 2)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::from_average_chunk_len(Self::MAX_AVERAGE)
    }
}
