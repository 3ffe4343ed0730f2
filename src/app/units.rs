use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    #[default]
    #[value(name = "kB")]
    Kb,
    #[value(name = "MB")]
    Mb,
}

impl Unit {
    /// Renders a kB amount in this unit.
    pub fn format(self, kb: u64) -> String {
        match self {
            Unit::Kb => format!("{kb} kB"),
            Unit::Mb => format!("{:.2} MB", kb as f64 / 1024.0),
        }
    }

    /// Same as `format`, with `n/a` for a field the report did not carry.
    pub fn format_field(self, kb: Option<u64>) -> String {
        kb.map_or_else(|| "n/a".to_string(), |kb| self.format(kb))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Kb => write!(f, "kB"),
            Unit::Mb => write!(f, "MB"),
        }
    }
}
