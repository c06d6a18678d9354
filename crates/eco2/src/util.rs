//! # General utilities

use std::fmt;

/// A simple byte buffer
///
/// Formats as a hex dump, which keeps undecodable header fields readable
/// in log output.
pub struct Buf<'a>(pub &'a [u8]);

impl fmt::Debug for Buf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max = self.0.len();
        if f.alternate() {
            writeln!(f, "Buf[{}]", max)?;
            write!(f, "  ")?;
        }
        for (index, byte) in self.0.iter().cloned().enumerate() {
            write!(f, "{:02X}", byte)?;
            if index + 1 < max {
                if f.alternate() && (index + 1) % 16 == 0 && index > 0 {
                    write!(f, "\n  ")?;
                } else {
                    write!(f, " ")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Buf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Buf as fmt::Debug>::fmt(self, f)
    }
}

/// Convert the LF line endings used in memory to the CRLF of wire bodies.
///
/// Existing CRLF sequences are normalized first, so mixed input does not
/// end up with doubled carriage returns.
pub fn lf_to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Convert wire CRLF line endings to the LF used in memory.
pub fn crlf_to_lf(text: &str) -> String {
    text.replace("\r\n", "\n")
}
