use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    #[serde(rename = "A")]
    Acute,
    #[serde(rename = "H")]
    Urgent,
    #[serde(rename = "V")]
    Regular,
    #[serde(rename = "V1")]
    RegularUnplanned,
    #[serde(rename = "V2")]
    RegularPlanned,
}

impl UrgencyLevel {
    pub fn code(&self) -> &'static str {
        match self {
            UrgencyLevel::Acute => "A",
            UrgencyLevel::Urgent => "H",
            UrgencyLevel::Regular => "V",
            UrgencyLevel::RegularUnplanned => "V1",
            UrgencyLevel::RegularPlanned => "V2",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, UrgencyLevel::Acute | UrgencyLevel::Urgent)
    }
}

impl Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UrgencyLevel {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(UrgencyLevel::Acute),
            "H" => Ok(UrgencyLevel::Urgent),
            "V" => Ok(UrgencyLevel::Regular),
            "V1" => Ok(UrgencyLevel::RegularUnplanned),
            "V2" => Ok(UrgencyLevel::RegularPlanned),
            _ => Err(ParamsError::UnknownName {
                kind: "urgency level",
                value: s.to_owned(),
            }),
        }
    }
}
