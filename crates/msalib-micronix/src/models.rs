//! MSA400 family model definitions.
//!
//! All members of the family speak the same command set over a USB virtual
//! COM port. The baud rate is fixed at 9600 8N1.
//!
//! | Model    | Baud |
//! |----------|------|
//! | MSA438   | 9600 |
//! | MSA458   | 9600 |
//! | MSA438E  | 9600 |

use std::fmt;
use std::str::FromStr;

use msalib_core::{Error, Result};

/// Factory line speed for every MSA400 model.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// A supported MSA400 family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Model {
    #[default]
    Msa438,
    Msa458,
    Msa438E,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Msa438, Model::Msa458, Model::Msa438E];

    /// Model designation as printed on the instrument.
    pub fn name(self) -> &'static str {
        match self {
            Model::Msa438 => "MSA438",
            Model::Msa458 => "MSA458",
            Model::Msa438E => "MSA438E",
        }
    }

    pub fn default_baud_rate(self) -> u32 {
        DEFAULT_BAUD_RATE
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Model::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "unknown model {wanted:?}: expected MSA438, MSA458 or MSA438E"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_model_names() {
        assert_eq!("msa438".parse::<Model>().unwrap(), Model::Msa438);
        assert_eq!("MSA458".parse::<Model>().unwrap(), Model::Msa458);
        assert_eq!("msa438e".parse::<Model>().unwrap(), Model::Msa438E);
        assert!(matches!(
            "MSA999".parse::<Model>(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn all_models_default_to_9600() {
        for m in Model::ALL {
            assert_eq!(m.default_baud_rate(), 9600);
            assert_eq!(m.to_string(), m.name());
        }
    }
}
