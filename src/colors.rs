//! Deterministic label colors for tags.

use ratatui::style::{Color, Style};

/// Palette a tag label is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagColor {
    Gray,
    Pink,
    Red,
    Blue,
    Purple,
    Yellow,
    Green,
    Indigo,
}

impl TagColor {
    pub const PALETTE: [TagColor; 8] = [
        TagColor::Gray,
        TagColor::Pink,
        TagColor::Red,
        TagColor::Blue,
        TagColor::Purple,
        TagColor::Yellow,
        TagColor::Green,
        TagColor::Indigo,
    ];

    /// Web style class for this color.
    pub fn class(self) -> &'static str {
        match self {
            TagColor::Gray => "bg-gray-500 text-white",
            TagColor::Pink => "bg-pink-500 text-white",
            TagColor::Red => "bg-red-500 text-white",
            TagColor::Blue => "bg-blue-500 text-white",
            TagColor::Purple => "bg-purple-500 text-white",
            TagColor::Yellow => "bg-yellow-500 text-black",
            TagColor::Green => "bg-green-500 text-white",
            TagColor::Indigo => "bg-indigo-500 text-white",
        }
    }

    /// Terminal style for this color.
    pub fn style(self) -> Style {
        let (bg, fg) = match self {
            TagColor::Gray => (Color::Gray, Color::White),
            TagColor::Pink => (Color::LightMagenta, Color::White),
            TagColor::Red => (Color::Red, Color::White),
            TagColor::Blue => (Color::Blue, Color::White),
            TagColor::Purple => (Color::Magenta, Color::White),
            TagColor::Yellow => (Color::Yellow, Color::Black),
            TagColor::Green => (Color::Green, Color::White),
            TagColor::Indigo => (Color::Indexed(61), Color::White),
        };
        Style::default().bg(bg).fg(fg)
    }
}

/// DJB2 variant over UTF-16 code units: `hash = hash * 33 ^ unit`, 32-bit wrapping.
fn djb2_xor(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(5381u32, |hash, unit| hash.wrapping_mul(33) ^ u32::from(unit))
}

/// Color for a tag name. Same name, same color; collisions are accepted.
pub fn tag_color(tag: &str) -> TagColor {
    let index = djb2_xor(tag) as usize % TagColor::PALETTE.len();
    TagColor::PALETTE[index]
}
