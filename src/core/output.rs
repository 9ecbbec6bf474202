//! Rendering of material drop-off histories.
//!
//! Commit notes accumulate per line item for the life of a project, but a
//! report line has to stay readable on one terminal row. Only the most recent
//! context matters, so the renderer shows the first few notes and folds the
//! rest into a count.

/// Notes shown per line item before folding into `(+N more)`.
const SHOWN_NOTES: usize = 3;
/// Character budget per note; longer notes are clipped with an ellipsis.
const NOTE_WIDTH: usize = 24;

/// Render a drop-off history as a single `note | note (+N more)` fragment.
/// Empty history renders empty so callers can skip the field entirely.
pub fn history_line(notes: &[String]) -> String {
    let mut line = String::new();
    for note in notes.iter().take(SHOWN_NOTES) {
        if !line.is_empty() {
            line.push_str(" | ");
        }
        line.push_str(&clip_note(note));
    }
    if notes.len() > SHOWN_NOTES {
        line.push_str(&format!(" (+{} more)", notes.len() - SHOWN_NOTES));
    }
    line
}

/// Squash internal whitespace (notes may arrive with newlines from chat) and
/// clip to the note width, counting characters rather than bytes.
fn clip_note(note: &str) -> String {
    let mut clipped = String::new();
    let mut chars = 0usize;
    for token in note.split_whitespace() {
        if !clipped.is_empty() {
            clipped.push(' ');
            chars += 1;
        }
        for ch in token.chars() {
            if chars == NOTE_WIDTH {
                clipped.push_str("...");
                return clipped;
            }
            clipped.push(ch);
            chars += 1;
        }
    }
    clipped
}
