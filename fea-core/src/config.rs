//! JSON configuration for complex frequency-domain analyses

use crate::solver::{
    AlternatingConfig, BlockRepresentation, ComplexSolver, ComplexStrategy, FieldSplitOptions,
    GmresConfigF64, LinearSolverConfig, LinearSolverType, MonolithicConfig, NewtonConfig,
};
use crate::verification::VerificationConfig;
use serde::{Deserialize, Serialize};
use solvers::{FieldSplitType, SubSolver};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete analysis configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Name of the analysis system, prefix of its solution vectors
    #[serde(default = "default_system_name")]
    pub system_name: String,
    /// Complex solver strategy
    #[serde(default)]
    pub complex_solver: ComplexSolverConfig,
    /// Element Jacobian verification settings
    #[serde(default)]
    pub verification: VerificationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            system_name: default_system_name(),
            complex_solver: ComplexSolverConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

fn default_system_name() -> String {
    "complex".to_string()
}

impl AnalysisConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system_name.is_empty() {
            return Err(ConfigError::Invalid("system_name must not be empty".into()));
        }
        self.complex_solver.validate()?;
        if self.verification.delta <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "verification delta must be positive, got {}",
                self.verification.delta
            )));
        }
        Ok(())
    }

    /// Complex solver for this configuration
    pub fn to_solver(&self) -> ComplexSolver {
        ComplexSolver::new(self.complex_solver.to_strategy())
    }
}

/// Complex solver strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComplexSolverConfig {
    #[serde(rename = "alternating")]
    /// Alternating real/imaginary Newton solves
    Alternating {
        /// Combined residual tolerance
        #[serde(default = "default_tol")]
        tol: f64,
        /// Maximum outer passes
        #[serde(default = "default_max_iters")]
        max_iters: usize,
        /// Under-relaxation factor of each part update
        #[serde(default = "default_relaxation")]
        relaxation: f64,
        /// Newton settings of the part solves
        #[serde(default)]
        newton: NewtonSettings,
    },
    #[serde(rename = "monolithic")]
    /// Single solve of the real block system
    Monolithic {
        /// Block layout
        #[serde(default)]
        representation: RepresentationConfig,
        /// Linear solver of the block system
        #[serde(default)]
        linear: LinearSolverSettings,
    },
}

impl Default for ComplexSolverConfig {
    fn default() -> Self {
        ComplexSolverConfig::Alternating {
            tol: default_tol(),
            max_iters: default_max_iters(),
            relaxation: default_relaxation(),
            newton: NewtonSettings::default(),
        }
    }
}

fn default_tol() -> f64 {
    1e-3
}

fn default_max_iters() -> usize {
    20
}

fn default_relaxation() -> f64 {
    1.0
}

impl ComplexSolverConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ComplexSolverConfig::Alternating {
                tol,
                max_iters,
                relaxation,
                newton,
            } => {
                if *tol <= 0.0 {
                    return Err(ConfigError::Invalid(format!("tol must be positive, got {tol}")));
                }
                if *max_iters == 0 {
                    return Err(ConfigError::Invalid("max_iters must be at least 1".into()));
                }
                if !(*relaxation > 0.0 && *relaxation <= 1.0) {
                    return Err(ConfigError::Invalid(format!(
                        "relaxation must lie in (0, 1], got {relaxation}"
                    )));
                }
                newton.linear.validate()?;
                newton.linear.reject_solvers(
                    &[LinearSolverKind::GmresBlockJacobi, LinearSolverKind::GmresFieldSplit],
                    "the scalar Newton solves",
                )
            }
            ComplexSolverConfig::Monolithic {
                representation,
                linear,
            } => {
                linear.validate()?;
                match representation {
                    RepresentationConfig::FieldSplit => linear
                        .reject_solvers(&[LinearSolverKind::GmresBlockJacobi], "field_split"),
                    RepresentationConfig::Interleaved => linear
                        .reject_solvers(&[LinearSolverKind::GmresFieldSplit], "interleaved"),
                }
            }
        }
    }

    /// Convert to the runtime strategy
    pub fn to_strategy(&self) -> ComplexStrategy {
        match self {
            ComplexSolverConfig::Alternating {
                tol,
                max_iters,
                relaxation,
                newton,
            } => ComplexStrategy::Alternating(AlternatingConfig {
                tol: *tol,
                max_iters: *max_iters,
                relaxation: *relaxation,
                newton: newton.to_newton_config(),
            }),
            ComplexSolverConfig::Monolithic {
                representation,
                linear,
            } => {
                let representation = BlockRepresentation::from(*representation);
                let default_type = LinearSolverConfig::for_representation(representation).solver_type;
                ComplexStrategy::Monolithic(MonolithicConfig {
                    representation,
                    linear: linear.to_linear_config(default_type),
                })
            }
        }
    }
}

/// Block layout of the monolithic strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationConfig {
    #[default]
    FieldSplit,
    Interleaved,
}

impl From<RepresentationConfig> for BlockRepresentation {
    fn from(value: RepresentationConfig) -> Self {
        match value {
            RepresentationConfig::FieldSplit => BlockRepresentation::FieldSplit,
            RepresentationConfig::Interleaved => BlockRepresentation::Interleaved,
        }
    }
}

/// Newton settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewtonSettings {
    #[serde(default = "default_newton_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_abs_tolerance")]
    pub abs_tolerance: f64,
    #[serde(default = "default_rel_tolerance")]
    pub rel_tolerance: f64,
    #[serde(default)]
    pub linear: LinearSolverSettings,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_newton_max_iterations(),
            abs_tolerance: default_abs_tolerance(),
            rel_tolerance: default_rel_tolerance(),
            linear: LinearSolverSettings::default(),
        }
    }
}

fn default_newton_max_iterations() -> usize {
    25
}

fn default_abs_tolerance() -> f64 {
    1e-10
}

fn default_rel_tolerance() -> f64 {
    1e-8
}

impl NewtonSettings {
    pub fn to_newton_config(&self) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            abs_tolerance: self.abs_tolerance,
            rel_tolerance: self.rel_tolerance,
            linear: self.linear.to_linear_config(LinearSolverType::GmresIlu),
        }
    }
}

/// Linear solver choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    Direct,
    Gmres,
    GmresJacobi,
    GmresIlu,
    GmresBlockJacobi,
    GmresFieldSplit,
}

impl From<LinearSolverKind> for LinearSolverType {
    fn from(value: LinearSolverKind) -> Self {
        match value {
            LinearSolverKind::Direct => LinearSolverType::Direct,
            LinearSolverKind::Gmres => LinearSolverType::Gmres,
            LinearSolverKind::GmresJacobi => LinearSolverType::GmresJacobi,
            LinearSolverKind::GmresIlu => LinearSolverType::GmresIlu,
            LinearSolverKind::GmresBlockJacobi => LinearSolverType::GmresBlockJacobi,
            LinearSolverKind::GmresFieldSplit => LinearSolverType::GmresFieldSplit,
        }
    }
}

/// Linear solver settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearSolverSettings {
    /// Solver type; the context default applies when absent
    #[serde(default)]
    pub solver: Option<LinearSolverKind>,
    #[serde(default)]
    pub gmres: GmresSettings,
    #[serde(default)]
    pub field_split: FieldSplitSettings,
}

impl LinearSolverSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gmres.restart == 0 {
            return Err(ConfigError::Invalid("gmres restart must be at least 1".into()));
        }
        if self.gmres.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gmres tolerance must be positive, got {}",
                self.gmres.tolerance
            )));
        }
        Ok(())
    }

    fn reject_solvers(&self, unsupported: &[LinearSolverKind], context: &str) -> Result<(), ConfigError> {
        match self.solver {
            Some(kind) if unsupported.contains(&kind) => Err(ConfigError::Invalid(format!(
                "linear solver {kind:?} is not available for {context}"
            ))),
            _ => Ok(()),
        }
    }

    /// Convert to the runtime configuration, using `default_type` when no
    /// solver is named
    pub fn to_linear_config(&self, default_type: LinearSolverType) -> LinearSolverConfig {
        LinearSolverConfig {
            solver_type: self.solver.map_or(default_type, LinearSolverType::from),
            gmres: GmresConfigF64 {
                max_iterations: self.gmres.max_iterations,
                restart: self.gmres.restart,
                tolerance: self.gmres.tolerance,
                print_interval: self.gmres.print_interval,
            },
            field_split: self.field_split.to_options(),
        }
    }
}

/// GMRES solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmresSettings {
    /// Maximum number of iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Restart parameter
    #[serde(default = "default_restart")]
    pub restart: usize,
    /// Relative convergence tolerance
    #[serde(default = "default_gmres_tolerance")]
    pub tolerance: f64,
    /// Log progress every this many iterations (0 = quiet)
    #[serde(default)]
    pub print_interval: usize,
}

impl Default for GmresSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            restart: default_restart(),
            tolerance: default_gmres_tolerance(),
            print_interval: 0,
        }
    }
}

fn default_max_iterations() -> usize {
    100
}

fn default_restart() -> usize {
    50
}

fn default_gmres_tolerance() -> f64 {
    1e-10
}

/// Field-split preconditioner configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FieldSplitSettings {
    #[serde(default)]
    pub split_type: SplitTypeConfig,
    #[serde(default)]
    pub sub_solver: SubSolverConfig,
}

impl FieldSplitSettings {
    fn to_options(self) -> FieldSplitOptions {
        FieldSplitOptions {
            split_type: match self.split_type {
                SplitTypeConfig::Additive => FieldSplitType::Additive,
                SplitTypeConfig::Multiplicative => FieldSplitType::Multiplicative,
            },
            sub_solver: match self.sub_solver {
                SubSolverConfig::Jacobi => SubSolver::Jacobi,
                SubSolverConfig::Ilu => SubSolver::Ilu,
                SubSolverConfig::Lu => SubSolver::Lu,
            },
        }
    }
}

/// Field combination of the field-split preconditioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitTypeConfig {
    Additive,
    #[default]
    Multiplicative,
}

/// Per-field solver of the field-split preconditioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubSolverConfig {
    Jacobi,
    #[default]
    Ilu,
    Lu,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config.system_name, "complex");
        assert_relative_eq!(config.verification.delta, 1e-8);

        let ComplexStrategy::Alternating(alternating) = config.to_solver().strategy().clone() else {
            panic!("default strategy should be alternating");
        };
        assert_relative_eq!(alternating.tol, 1e-3);
        assert_eq!(alternating.max_iters, 20);
        assert_relative_eq!(alternating.relaxation, 1.0);
        assert_eq!(alternating.newton.max_iterations, 25);
    }

    #[test]
    fn test_monolithic_defaults_follow_representation() {
        let json = r#"{
            "system_name": "duct",
            "complex_solver": { "type": "monolithic", "representation": "interleaved" }
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        let ComplexStrategy::Monolithic(monolithic) = config.complex_solver.to_strategy() else {
            panic!("expected monolithic strategy");
        };
        assert_eq!(monolithic.representation, BlockRepresentation::Interleaved);
        assert_eq!(monolithic.linear.solver_type, LinearSolverType::GmresBlockJacobi);
    }

    #[test]
    fn test_explicit_linear_solver() {
        let json = r#"{
            "complex_solver": {
                "type": "monolithic",
                "linear": {
                    "solver": "gmres_field_split",
                    "gmres": { "restart": 10, "tolerance": 1e-8 },
                    "field_split": { "split_type": "additive", "sub_solver": "lu" }
                }
            }
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        let ComplexStrategy::Monolithic(monolithic) = config.complex_solver.to_strategy() else {
            panic!("expected monolithic strategy");
        };
        let linear = monolithic.linear;
        assert_eq!(linear.solver_type, LinearSolverType::GmresFieldSplit);
        assert_eq!(linear.gmres.restart, 10);
        assert_eq!(linear.gmres.max_iterations, 100);
        assert_eq!(linear.field_split.split_type, FieldSplitType::Additive);
        assert_eq!(linear.field_split.sub_solver, SubSolver::Lu);
    }

    #[test]
    fn test_json_round_trip() {
        let config = AnalysisConfig {
            system_name: "plate".into(),
            complex_solver: ComplexSolverConfig::Alternating {
                tol: 1e-6,
                max_iters: 50,
                relaxation: 0.5,
                newton: NewtonSettings::default(),
            },
            verification: VerificationConfig::default(),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""type":"alternating""#));
        let parsed = AnalysisConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.system_name, "plate");
        let ComplexStrategy::Alternating(alternating) = parsed.complex_solver.to_strategy() else {
            panic!("expected alternating strategy");
        };
        assert_eq!(alternating.max_iters, 50);
        assert_relative_eq!(alternating.relaxation, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let json = r#"{ "complex_solver": { "type": "alternating", "relaxation": 1.5 } }"#;
        assert!(matches!(
            AnalysisConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "system_name": 3 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/analysis.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_solver_must_match_layout() {
        let mismatched = [
            r#"{ "complex_solver": { "type": "monolithic", "representation": "field_split",
                 "linear": { "solver": "gmres_block_jacobi" } } }"#,
            r#"{ "complex_solver": { "type": "monolithic", "representation": "interleaved",
                 "linear": { "solver": "gmres_field_split" } } }"#,
            r#"{ "complex_solver": { "type": "alternating",
                 "newton": { "linear": { "solver": "gmres_field_split" } } } }"#,
        ];
        for json in mismatched {
            assert!(
                matches!(AnalysisConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "accepted {json}"
            );
        }

        let matched = r#"{ "complex_solver": { "type": "monolithic", "representation": "interleaved",
                 "linear": { "solver": "gmres_block_jacobi" } } }"#;
        assert!(AnalysisConfig::from_json_str(matched).is_ok());
    }
}
