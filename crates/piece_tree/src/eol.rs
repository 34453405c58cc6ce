use std::fmt;

/// A line terminator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminator a slice of text ends with, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    #[default]
    None,
    Cr,
    Lf,
    CrLf,
}

impl LineBreak {
    pub fn at_end_of(bytes: &[u8]) -> Self {
        match bytes {
            [.., b'\r', b'\n'] => Self::CrLf,
            [.., b'\n'] => Self::Lf,
            [.., b'\r'] => Self::Cr,
            _ => Self::None,
        }
    }
}

/// Per-style terminator counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EolStats {
    pub lf: usize,
    pub crlf: usize,
    pub cr: usize,
}

impl EolStats {
    pub fn merge(&mut self, other: &EolStats) {
        self.lf += other.lf;
        self.crlf += other.crlf;
        self.cr += other.cr;
    }

    /// The most frequent terminator; ties go to LF, then CRLF, then CR.
    /// Text without any terminator reports LF.
    pub fn dominant(&self) -> LineEnding {
        if self.lf >= self.crlf && self.lf >= self.cr {
            LineEnding::Lf
        } else if self.crlf >= self.cr {
            LineEnding::CrLf
        } else {
            LineEnding::Cr
        }
    }
}

/// Offsets just past every terminator in `bytes`, plus per-style counts.
///
/// A trailing `\r` counts as a terminator of its own: callers guarantee
/// that the byte following this slice in the document is never `\n`.
pub fn scan_line_starts(bytes: &[u8]) -> (Vec<usize>, EolStats) {
    let mut line_starts = Vec::new();
    let mut stats = EolStats::default();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\r' => {
                if i + 1 < len && bytes[i + 1] == b'\n' {
                    // \r\n case
                    line_starts.push(i + 2);
                    stats.crlf += 1;
                    i += 1; // skip the \n
                } else {
                    // \r case
                    line_starts.push(i + 1);
                    stats.cr += 1;
                }
            }
            b'\n' => {
                line_starts.push(i + 1);
                stats.lf += 1;
            }
            _ => {}
        }

        i += 1;
    }

    (line_starts, stats)
}
