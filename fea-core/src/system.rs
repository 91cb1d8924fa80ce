//! Host analysis system: a working solution plus named vector storage

use ndarray::Array1;
use std::collections::HashMap;

/// Analysis system holding the working solution and persistent named vectors
#[derive(Debug, Clone)]
pub struct AnalysisSystem {
    name: String,
    n_dofs: usize,
    solution: Array1<f64>,
    vectors: HashMap<String, Array1<f64>>,
}

impl AnalysisSystem {
    pub fn new(name: impl Into<String>, n_dofs: usize) -> Self {
        Self {
            name: name.into(),
            n_dofs,
            solution: Array1::zeros(n_dofs),
            vectors: HashMap::new(),
        }
    }

    /// System name, used as prefix of its persisted vectors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Working solution
    pub fn solution(&self) -> &Array1<f64> {
        &self.solution
    }

    /// Overwrite the working solution
    ///
    /// # Panics
    ///
    /// Panics if the length differs from the system size.
    pub fn set_solution(&mut self, values: &Array1<f64>) {
        assert_eq!(values.len(), self.n_dofs, "Solution size mismatch");
        self.solution.assign(values);
    }

    /// Whether a named vector exists
    pub fn have_vector(&self, name: &str) -> bool {
        self.vectors.contains_key(name)
    }

    /// Add a zero-filled named vector, returning it; existing vectors are kept
    pub fn add_vector(&mut self, name: &str) -> &mut Array1<f64> {
        let n = self.n_dofs;
        self.vectors
            .entry(name.to_string())
            .or_insert_with(|| Array1::zeros(n))
    }

    /// Named vector, if present
    pub fn vector(&self, name: &str) -> Option<&Array1<f64>> {
        self.vectors.get(name)
    }

    /// Mutable named vector, if present
    pub fn vector_mut(&mut self, name: &str) -> Option<&mut Array1<f64>> {
        self.vectors.get_mut(name)
    }

    /// Named vector, created zero-filled on first access
    pub fn get_or_add_vector(&mut self, name: &str) -> &mut Array1<f64> {
        if !self.have_vector(name) {
            log::debug!("Adding vector {name} to system {}", self.name);
        }
        self.add_vector(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_named_vectors() {
        let mut system = AnalysisSystem::new("plate", 3);
        assert!(!system.have_vector("plate_modes"));
        assert!(system.vector("plate_modes").is_none());

        system.get_or_add_vector("plate_modes")[1] = 2.0;
        assert!(system.have_vector("plate_modes"));

        // a second add keeps the stored values
        system.add_vector("plate_modes");
        assert_eq!(system.vector("plate_modes"), Some(&array![0.0, 2.0, 0.0]));

        if let Some(v) = system.vector_mut("plate_modes") {
            v.fill(1.0);
        }
        assert_eq!(system.vector("plate_modes").map(|v| v.sum()), Some(3.0));
    }

    #[test]
    fn test_working_solution() {
        let mut system = AnalysisSystem::new("s", 2);
        system.set_solution(&array![1.0, -1.0]);
        assert_eq!(system.solution(), &array![1.0, -1.0]);
        assert_eq!(system.name(), "s");
    }

    #[test]
    #[should_panic(expected = "Solution size mismatch")]
    fn test_solution_size_checked() {
        AnalysisSystem::new("s", 2).set_solution(&array![1.0]);
    }
}
