//! Message boundary detection for bytes accumulated from a socket.

/// Result of looking for a complete request in a byte prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// More bytes are needed before a request can be parsed.
    Incomplete,
    /// The first `len` bytes hold exactly one request.
    Complete(usize),
}

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Locate the end of the header block; returns the offset just past `\r\n\r\n`.
pub fn head_end(input: &[u8]) -> Option<usize> {
    input
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
        .map(|pos| pos + HEAD_TERMINATOR.len())
}

/// Find the boundary of the first request in `input`.
///
/// A request ends after its header block plus `content-length` body bytes.
/// When the length header cannot be read the frame ends at the header block
/// and the parser reports the error. Anything after the returned length
/// belongs to the next request.
pub fn frame(input: &[u8]) -> Frame {
    match required_len(input) {
        Some(total) if input.len() >= total => Frame::Complete(total),
        _ => Frame::Incomplete,
    }
}

/// The total size a request will need once fully received, if the header
/// block is already present.
pub fn required_len(input: &[u8]) -> Option<usize> {
    let head_len = head_end(input)?;
    let body_len = declared_length(&input[..head_len]).unwrap_or(0);
    Some(head_len.saturating_add(body_len))
}

/// The declared body length. Unparseable or conflicting `content-length`
/// values yield `None`, so the message frames at the head end and the parser
/// rejects it.
fn declared_length(head: &[u8]) -> Option<usize> {
    let mut declared = None;
    for line in head.split(|b| *b == b'\n').skip(1) {
        let Some((name, value)) = std::str::from_utf8(line)
            .ok()
            .and_then(|line| line.split_once(':'))
        else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("content-length") {
            continue;
        }
        let length: usize = value.trim().parse().ok()?;
        if declared.is_some_and(|previous| previous != length) {
            return None;
        }
        declared = Some(length);
    }
    declared
}
