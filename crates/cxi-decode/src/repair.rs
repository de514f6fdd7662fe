use std::borrow::Cow;

/// How the export writes a CDATA terminator nested inside CDATA text.
pub const BROKEN_TERMINATOR: &str = "]] >";

/// The terminator the text actually contained.
pub const TERMINATOR: &str = "]]>";

/// Undo the export's CDATA terminator escaping.
///
/// Borrows when there is nothing to repair.
pub fn repair(text: &str) -> Cow<'_, str> {
    if text.contains(BROKEN_TERMINATOR) {
        Cow::Owned(text.replace(BROKEN_TERMINATOR, TERMINATOR))
    } else {
        Cow::Borrowed(text)
    }
}
