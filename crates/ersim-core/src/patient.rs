//! Hardcoded demo patient.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

/// Patient record shown on both views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub blood_type: String,
    pub condition: String,
}

impl Patient {
    /// The fixed patient every session starts with.
    pub fn demo() -> Self {
        Self {
            id: "M00001".to_string(),
            name: "Kim Cheol-su".to_string(),
            age: 63,
            gender: Gender::M,
            blood_type: "A+".to_string(),
            condition: "Metabolic syndrome, acute hypertension risk".to_string(),
        }
    }

    /// Short form used in headers, e.g. `M00001 (Kim, C.)`.
    pub fn short_tag(&self) -> String {
        let mut parts = self.name.split_whitespace();
        let family = parts.next().unwrap_or("");
        let initial = parts.next().and_then(|g| g.chars().next());
        match initial {
            Some(c) => format!("{} ({family}, {c}.)", self.id),
            None => format!("{} ({family})", self.id),
        }
    }
}

impl Default for Patient {
    fn default() -> Self {
        Self::demo()
    }
}
