use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle bucket width, in the provider's own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D,
    W,
    M,
}

impl Granularity {
    pub const ALL: [Granularity; 9] = [
        Granularity::M1,
        Granularity::M5,
        Granularity::M15,
        Granularity::M30,
        Granularity::H1,
        Granularity::H4,
        Granularity::D,
        Granularity::W,
        Granularity::M,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M5 => "M5",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H4 => "H4",
            Granularity::D => "D",
            Granularity::W => "W",
            Granularity::M => "M",
        }
    }

    pub fn step_seconds(&self) -> i64 {
        match self {
            Granularity::M1 => 60,
            Granularity::M5 => 300,
            Granularity::M15 => 900,
            Granularity::M30 => 1800,
            Granularity::H1 => 3600,
            Granularity::H4 => 14400,
            Granularity::D => 86400,
            Granularity::W => 604800,
            Granularity::M => 2592000,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "M1" => Ok(Granularity::M1),
            "M5" => Ok(Granularity::M5),
            "M15" => Ok(Granularity::M15),
            "M30" => Ok(Granularity::M30),
            "H1" => Ok(Granularity::H1),
            "H4" => Ok(Granularity::H4),
            "D" => Ok(Granularity::D),
            "W" => Ok(Granularity::W),
            "M" => Ok(Granularity::M),
            _ => Err(format!("unsupported granularity: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Granularity;

    #[test]
    fn parse_accepts_provider_labels() {
        assert_eq!("H1".parse::<Granularity>().unwrap(), Granularity::H1);
        assert_eq!("m15".parse::<Granularity>().unwrap(), Granularity::M15);
        assert_eq!("d".parse::<Granularity>().unwrap(), Granularity::D);
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        let err = "H2".parse::<Granularity>().expect_err("unsupported");
        assert!(err.contains("unsupported granularity"));
    }

    #[test]
    fn step_seconds_are_monotonic_over_all() {
        let steps: Vec<i64> = Granularity::ALL.iter().map(|g| g.step_seconds()).collect();
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }
}
