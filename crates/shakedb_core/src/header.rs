//! The version header that opens every database file.
//!
//! ```text
//! SHAKE-DATABASE-<format>-<user_version>\r\n
//! ```
//!
//! The header must be an exact byte prefix of the file. Any difference,
//! including a different user version, invalidates everything after it.

/// Fixed tag at the start of the header.
pub const DATABASE_TAG: &str = "SHAKE-DATABASE";

/// On-disk format version.
pub const FORMAT_VERSION: u32 = 4;

/// Maximum length of a header excerpt in diagnostics.
pub const EXCERPT_LIMIT: usize = 50;

/// Builds the header for the given caller version.
#[must_use]
pub fn database_header(user_version: i64) -> Vec<u8> {
    format!("{DATABASE_TAG}-{FORMAT_VERSION}-{user_version}\r\n").into_bytes()
}

/// A header decoded from the start of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Format version found in the header.
    pub format_version: u32,
    /// Caller version found in the header.
    pub user_version: i64,
    /// Header length in bytes, including the line terminator.
    pub len: usize,
}

/// Parses a header of any format or user version from the start of `bytes`.
///
/// Returns `None` if `bytes` does not start with a well-formed header line.
#[must_use]
pub fn parse_header(bytes: &[u8]) -> Option<ParsedHeader> {
    let rest = bytes
        .strip_prefix(DATABASE_TAG.as_bytes())?
        .strip_prefix(b"-")?;
    let line_end = rest.windows(2).position(|w| w == b"\r\n")?;
    let line = std::str::from_utf8(&rest[..line_end]).ok()?;
    let (format, user) = line.split_once('-')?;

    Some(ParsedHeader {
        format_version: format.parse().ok()?,
        user_version: user.parse().ok()?,
        len: DATABASE_TAG.len() + 1 + line_end + 2,
    })
}

/// Renders the start of `bytes` for a diagnostic message.
///
/// Keeps the leading run of ASCII alphanumerics, `-`, `_` and spaces, up to
/// [`EXCERPT_LIMIT`] bytes.
#[must_use]
pub fn header_excerpt(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(EXCERPT_LIMIT)
        .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b' '))
        .map(|&b| char::from(b))
        .collect()
}
