use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Candidate,
    Guardian,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub id: String,
    pub role: ModelRole,
}

impl ModelDescriptor {
    pub fn new_candidate(id: String) -> Self {
        ModelDescriptor {
            id,
            role: ModelRole::Candidate,
        }
    }

    pub fn new_guardian(id: String) -> Self {
        ModelDescriptor {
            id,
            role: ModelRole::Guardian,
        }
    }

    pub fn to_string(&self) -> String {
        format!("({:?}@{})", self.role, self.id)
    }
}

/// The static set of backend models: an ordered list of race candidates
/// and one guardian used for post-review.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    candidates: Vec<ModelDescriptor>,
    guardian: ModelDescriptor,
}

impl ModelRegistry {
    pub fn new(candidate_ids: Vec<String>, guardian_id: String) -> Self {
        ModelRegistry {
            candidates: candidate_ids
                .into_iter()
                .map(ModelDescriptor::new_candidate)
                .collect(),
            guardian: ModelDescriptor::new_guardian(guardian_id),
        }
    }

    pub fn candidates(&self) -> &[ModelDescriptor] {
        &self.candidates
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidates.iter().map(|m| m.id.clone()).collect()
    }

    pub fn guardian(&self) -> &ModelDescriptor {
        &self.guardian
    }

    pub fn is_candidate(&self, model_id: &str) -> bool {
        self.candidates.iter().any(|m| m.id == model_id)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn total_count(&self) -> usize {
        self.candidates.len() + 1
    }
}
