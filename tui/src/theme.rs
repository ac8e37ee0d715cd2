//! Theme and Colors
//!
//! Quill's palette: parchment neutrals with an ink-blue accent.

use ratatui::style::Color;

// ============================================================================
// Conversation Colors
// ============================================================================

/// Human prefix and input caret
pub const USER: Color = Color::Rgb(140, 200, 140);

/// Assistant prefix
pub const ASSISTANT: Color = Color::Rgb(130, 170, 255);

/// Body text
pub const TEXT: Color = Color::Rgb(210, 210, 200);

/// Error payloads (rendered verbatim)
pub const ERROR: Color = Color::Rgb(255, 100, 100);

// ============================================================================
// Markdown Accents
// ============================================================================

/// Headings
pub const HEADING: Color = Color::Rgb(240, 200, 120);

/// List markers ("1.", "-", ...)
pub const MARKER: Color = Color::Rgb(240, 200, 120);

/// Inline code spans
pub const CODE: Color = Color::Rgb(180, 220, 180);

/// Block quotes
pub const QUOTE: Color = Color::Rgb(150, 150, 140);

// ============================================================================
// Chrome
// ============================================================================

/// Titles and key hints
pub const ACCENT: Color = Color::Rgb(130, 170, 255);

/// De-emphasized chrome (borders, hints)
pub const DIM: Color = Color::Rgb(110, 110, 105);

/// Filter-match highlight in the story picker
pub const HIGHLIGHT: Color = Color::Rgb(240, 200, 120);

/// Spinner while the model is responding
pub const SPINNER: Color = Color::Rgb(130, 170, 255);
