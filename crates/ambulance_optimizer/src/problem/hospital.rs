use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::location::LocationIdx;

define_index_newtype!(HospitalIdx, Hospital);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    name: String,
    location: LocationIdx,
}

impl Hospital {
    pub fn new(name: impl Into<String>, location: LocationIdx) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }
}
