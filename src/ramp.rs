/// Ordered glyph sequence from darkest-appearing to lightest-appearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterRamp {
    name: &'static str,
    glyphs: &'static [char],
}

impl CharacterRamp {
    /// `glyphs` must not be empty
    pub const fn new(name: &'static str, glyphs: &'static [char]) -> Self {
        assert!(!glyphs.is_empty(), "character ramp needs at least one glyph");
        Self { name, glyphs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn glyphs(&self) -> &'static [char] {
        self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph at `index`, clamped to the last glyph
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }

    pub fn to_display_string(&self) -> String {
        self.glyphs.iter().collect()
    }
}

/// Built-in ramps, selected by index
pub static RAMPS: &[CharacterRamp] = &[
    CharacterRamp::new("Standard", &['@', '%', '#', '*', '+', '=', '-', ':', '.', ' ']),
    CharacterRamp::new("Block", &['█', '▉', '▊', '▋', '▌', '▍', '▎', '▏', ' ']),
    CharacterRamp::new(
        "Extended",
        &['@', '&', '%', '$', '#', '+', '=', '*', ':', '~', '-', ',', '.', ' '],
    ),
    CharacterRamp::new("Simple", &['#', '*', '+', '=', '-', ':', '.', ' ']),
    CharacterRamp::new("Shaded", &['█', '█', '▓', '▒', '░', ' ', ' ']),
    CharacterRamp::new(
        "Classic",
        &['@', '#', 'S', '%', '?', '*', '+', ';', ':', ',', '.', ' '],
    ),
];

/// Look up a ramp in `ramps`, `None` when the index is out of range
pub fn get(ramps: &[CharacterRamp], index: usize) -> Option<&CharacterRamp> {
    ramps.get(index)
}

/// One line per ramp, `index: name - "glyphs"`
pub fn describe(ramps: &[CharacterRamp]) -> Vec<String> {
    ramps
        .iter()
        .enumerate()
        .map(|(i, ramp)| format!("{}: {} - \"{}\"", i, ramp.name(), ramp.to_display_string()))
        .collect()
}
