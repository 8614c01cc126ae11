use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Classifier output order: alphabetical class folders, so
    /// index 0 is FEMALE and index 1 is MALE.
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Gender::Female),
            1 => Some(Gender::Male),
            _ => None,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
        }
    }
}

/// One gender classification of a face crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderPrediction {
    pub gender: Gender,
    pub confidence: f64,
}

impl GenderPrediction {
    pub fn new(gender: Gender, confidence: f64) -> Self {
        Self { gender, confidence }
    }

    /// Argmax over per-class probabilities in classifier order.
    ///
    /// Ties go to the lower index. `None` for an empty or unknown output.
    pub fn from_probabilities(probabilities: &[f32]) -> Option<Self> {
        let (index, &best) = probabilities
            .iter()
            .enumerate()
            .fold(None, |acc: Option<(usize, &f32)>, (i, p)| match acc {
                Some((_, bp)) if bp >= p => acc,
                _ => Some((i, p)),
            })?;
        let gender = Gender::from_class_index(index)?;
        Some(Self::new(gender, best as f64))
    }
}
