use {
    crate::stats::Severity,
    crossterm::style::{self, Color, StyledContent, Stylize},
    std::{
        fmt::Display,
        io::{self, Write},
        iter::{once, repeat, repeat_n},
    },
};

/// a horizontal bar showing a percentage.
pub struct Meter<'a> {
    pub name: &'a str,
    /// percent, from 0 to 100.
    pub value: f64,
    /// width of the bar, in cells, excluding its borders.
    pub width: usize,
    pub severity: Severity,
}

// === impl Meter ===

impl Meter<'_> {
    pub fn draw(&self, writer: &mut impl Write) -> io::Result<()> {
        const ACTIVE: char = '█';
        const IDLE: char = ' ';
        const BORDER_L: char = '[';
        const BORDER_R: char = ']';

        let Self {
            name,
            value,
            width,
            severity,
        } = self;

        let filled = Self::cells(*value, *width);
        let meter = {
            let active = repeat_n(ACTIVE, filled);
            let idle = repeat(IDLE);
            active.chain(idle).take(*width).collect::<String>()
        };

        write!(writer, "{name}: {BORDER_L}")?;
        write!(writer, "{}", meter.with(severity.color()))?;
        write!(writer, "{BORDER_R} {value:>3.0}%")
    }

    /// how many cells of a `width`-wide bar a percentage fills.
    fn cells(value: f64, width: usize) -> usize {
        let fraction = (value / 100.0).clamp(0.0, 1.0);
        ((fraction * width as f64).round() as usize).min(width)
    }
}

// === impl Severity ===

impl Severity {
    /// the terminal color for this band.
    pub fn color(self) -> Color {
        match self {
            Self::Normal => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Critical => Color::Red,
        }
    }

    /// styles a value with this band's color.
    pub fn paint<D: Display>(self, value: D) -> StyledContent<D> {
        style::style(value).with(self.color())
    }
}

/// joins the parts of a status line, e.g. `a | b | c`.
pub fn joined<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .zip(once("").chain(repeat(" | ")))
        .fold(String::new(), |mut line, (part, sep)| {
            line.push_str(sep);
            line.push_str(part);
            line
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(value: f64, width: usize) -> String {
        let meter = Meter {
            name: "CPU Usage",
            value,
            width,
            severity: Severity::Normal,
        };
        let mut out = Vec::new();
        meter.draw(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cells() {
        assert_eq!(Meter::cells(0.0, 40), 0);
        assert_eq!(Meter::cells(50.0, 40), 20);
        assert_eq!(Meter::cells(100.0, 40), 40);
        assert_eq!(Meter::cells(140.0, 40), 40);
        assert_eq!(Meter::cells(-3.0, 40), 0);
    }

    #[test]
    fn draws_label_and_percentage() {
        let out = draw(50.0, 10);
        assert!(out.starts_with("CPU Usage: ["));
        assert!(out.ends_with("]  50%"));
        assert_eq!(out.matches('█').count(), 5);
    }

    #[test]
    fn joins_parts() {
        assert_eq!(joined(["a", "b", "c"]), "a | b | c");
        assert_eq!(joined(["only"]), "only");
        assert_eq!(joined(Vec::<&str>::new()), "");
    }
}
