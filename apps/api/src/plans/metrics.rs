//! Static font-metric tables for the two PDF base fonts used by the exporter.
//!
//! Character widths are in em units (relative to font size), taken from the
//! standard Helvetica AFM files. Tables cover ASCII 0x20..=0x7E (95 printable
//! characters). Index = (char as usize) - 32.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// Resource name the exporter registers this font under.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn table(self) -> &'static FontMetricTable {
        match self {
            Font::Helvetica => &HELVETICA_TABLE,
            Font::HelveticaBold => &HELVETICA_BOLD_TABLE,
        }
    }
}

/// Static character-width table for a font.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    average_char_width: f32,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }
}

/// Rendered width of `s` in points at `size_pt`.
pub fn measure(s: &str, font: Font, size_pt: f32) -> f32 {
    let table = font.table();
    s.chars().map(|c| table.char_width(c)).sum::<f32>() * size_pt
}

/// Greedy word-wrap of `text` into lines no wider than `max_width_pt`.
///
/// Words wider than a full line are split by character. Blank input yields no lines.
pub fn wrap(text: &str, font: Font, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let space = measure(" ", font, size_pt);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        for piece in split_long_word(word, font, size_pt, max_width_pt) {
            let piece_width = measure(&piece, font, size_pt);
            if current.is_empty() {
                current = piece;
                current_width = piece_width;
            } else if current_width + space + piece_width > max_width_pt {
                lines.push(std::mem::take(&mut current));
                current = piece;
                current_width = piece_width;
            } else {
                current.push(' ');
                current.push_str(&piece);
                current_width += space + piece_width;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, font: Font, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    if measure(word, font, size_pt) <= max_width_pt {
        return vec![word.to_string()];
    }
    let table = font.table();
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = table.char_width(c) * size_pt;
        if !piece.is_empty() && width + w > max_width_pt {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_scales_with_size() {
        let w10 = measure("Tax", Font::Helvetica, 10.0);
        let w20 = measure("Tax", Font::Helvetica, 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
        assert!(measure("Tax", Font::HelveticaBold, 10.0) > w10);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "File Form GST RFD-11 before raising the first export invoice of the year";
        let lines = wrap(text, Font::Helvetica, 10.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure(line, Font::Helvetica, 10.0) <= 120.0, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        assert_eq!(wrap("Short line", Font::Helvetica, 10.0, 500.0), vec!["Short line"]);
        assert!(wrap("   ", Font::Helvetica, 10.0, 500.0).is_empty());
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let word = "x".repeat(200);
        let lines = wrap(&word, Font::Helvetica, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }
}
