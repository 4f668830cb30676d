//! Acceptance criterion entity
//!
//! A criterion ties requirement IDs to a statistical demand: either an
//! attribute (pass/fail) confidence/reliability target, or a variable-data
//! tolerance interval against specification limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::error::AnalysisError;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::stats::tolerance::{Sidedness, SpecLimits};

/// Statistical analysis type for a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Pass/fail (binomial) data
    Attribute,
    /// Continuous measured data
    Variable,
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisType::Attribute => write!(f, "attribute"),
            AnalysisType::Variable => write!(f, "variable"),
        }
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attribute" => Ok(AnalysisType::Attribute),
            "variable" => Ok(AnalysisType::Variable),
            _ => Err(format!("Unknown analysis type: {}", s)),
        }
    }
}

fn new_criterion_id() -> EntityId {
    EntityId::new(EntityPrefix::Crit)
}

fn default_created() -> DateTime<Utc> {
    Utc::now()
}

fn default_author() -> String {
    "unknown".to_string()
}

/// An acceptance criterion from a protocol's acceptance-criteria section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    /// Unique identifier (CRIT-...); generated when the criteria file
    /// omits it
    #[serde(default = "new_criterion_id")]
    pub id: EntityId,

    /// Criterion description as stated in the protocol
    pub title: String,

    /// Requirement IDs this criterion verifies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    /// Attribute or variable analysis
    pub analysis: AnalysisType,

    /// Target confidence, in (0, 1)
    pub confidence: f64,

    /// Target reliability (population proportion), in (0, 1)
    pub reliability: f64,

    /// Bound direction, required for variable criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidedness: Option<Sidedness>,

    /// Specification limits, required for variable criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<SpecLimits>,

    /// Classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    #[serde(default = "default_created")]
    pub created: DateTime<Utc>,

    /// Author name
    #[serde(default = "default_author")]
    pub author: String,
}

impl Entity for AcceptanceCriterion {
    const PREFIX: &'static str = "CRIT";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Review => "review",
            Status::Approved => "approved",
            Status::Released => "released",
            Status::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl AcceptanceCriterion {
    /// Create an attribute criterion
    pub fn attribute(
        title: impl Into<String>,
        confidence: f64,
        reliability: f64,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: new_criterion_id(),
            title: title.into(),
            requirements: Vec::new(),
            analysis: AnalysisType::Attribute,
            confidence,
            reliability,
            sidedness: None,
            limits: None,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
        }
    }

    /// Create a variable criterion
    pub fn variable(
        title: impl Into<String>,
        confidence: f64,
        reliability: f64,
        sidedness: Sidedness,
        limits: SpecLimits,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: new_criterion_id(),
            title: title.into(),
            requirements: Vec::new(),
            analysis: AnalysisType::Variable,
            confidence,
            reliability,
            sidedness: Some(sidedness),
            limits: Some(limits),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
        }
    }

    /// Attach a requirement ID
    pub fn with_requirement(mut self, req: impl Into<String>) -> Self {
        self.requirements.push(req.into());
        self
    }

    /// Check the criterion is fully specified before evaluation.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (value, name) in [(self.confidence, "confidence"), (self.reliability, "reliability")] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(AnalysisError::invalid(format!(
                    "criterion '{}': {} must be in (0, 1), got {}",
                    self.title, name, value
                )));
            }
        }

        if self.analysis == AnalysisType::Variable {
            let sidedness = self.sidedness.ok_or_else(|| {
                AnalysisError::invalid(format!(
                    "criterion '{}': variable analysis requires a sidedness",
                    self.title
                ))
            })?;
            let limits = self.limits.ok_or_else(|| {
                AnalysisError::invalid(format!(
                    "criterion '{}': variable analysis requires specification limits",
                    self.title
                ))
            })?;
            let missing = match sidedness {
                Sidedness::Lower => limits.lower.is_none(),
                Sidedness::Upper => limits.upper.is_none(),
                Sidedness::TwoSided => limits.lower.is_none() || limits.upper.is_none(),
            };
            if missing {
                return Err(AnalysisError::invalid(format!(
                    "criterion '{}': {} bound requires the matching specification limit(s)",
                    self.title, sidedness
                )));
            }
            if let (Some(lsl), Some(usl)) = (limits.lower, limits.upper) {
                if lsl >= usl {
                    return Err(AnalysisError::invalid(format!(
                        "criterion '{}': lower limit {} is not below upper limit {}",
                        self.title, lsl, usl
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_criterion() {
        let crit = AcceptanceCriterion::attribute("Seal integrity", 0.90, 0.90, "author")
            .with_requirement("REQ-001");
        assert!(crit.id.to_string().starts_with("CRIT-"));
        assert_eq!(crit.analysis, AnalysisType::Attribute);
        assert!(crit.validate().is_ok());
    }

    #[test]
    fn test_variable_criterion_validation() {
        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: Some(2.0),
                upper: None,
            },
            "author",
        );
        assert!(crit.validate().is_ok());
    }

    #[test]
    fn test_variable_missing_limit_rejected() {
        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: None,
                upper: Some(4.0),
            },
            "author",
        );
        assert!(matches!(
            crit.validate(),
            Err(AnalysisError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_two_sided_requires_both_limits() {
        let crit = AcceptanceCriterion::variable(
            "Diameter",
            0.90,
            0.95,
            Sidedness::TwoSided,
            SpecLimits {
                lower: Some(2.0),
                upper: None,
            },
            "author",
        );
        assert!(crit.validate().is_err());
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let crit = AcceptanceCriterion::variable(
            "Diameter",
            0.90,
            0.95,
            Sidedness::TwoSided,
            SpecLimits {
                lower: Some(4.0),
                upper: Some(2.0),
            },
            "author",
        );
        assert!(crit.validate().is_err());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut crit = AcceptanceCriterion::attribute("Bad", 0.90, 0.90, "author");
        crit.confidence = 1.5;
        assert!(crit.validate().is_err());
        crit.confidence = 0.0;
        assert!(crit.validate().is_err());
        crit.confidence = 0.9;
        crit.reliability = -0.1;
        assert!(crit.validate().is_err());
    }

    #[test]
    fn test_yaml_ingestion_with_defaults() {
        // A criteria file may omit id, created, author and status
        let yaml = r#"
title: Battery life meets spec
requirements: [REQ-001]
analysis: attribute
confidence: 0.90
reliability: 0.90
"#;
        let crit: AcceptanceCriterion = serde_yml::from_str(yaml).unwrap();
        assert!(crit.id.to_string().starts_with("CRIT-"));
        assert_eq!(crit.author, "unknown");
        assert_eq!(crit.analysis, AnalysisType::Attribute);
        assert!(crit.validate().is_ok());
    }

    #[test]
    fn test_variable_yaml_roundtrip() {
        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::TwoSided,
            SpecLimits {
                lower: Some(2.0),
                upper: Some(4.0),
            },
            "author",
        );
        let yaml = serde_yml::to_string(&crit).unwrap();
        let parsed: AcceptanceCriterion = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, crit.id);
        assert_eq!(parsed.sidedness, Some(Sidedness::TwoSided));
        assert_eq!(parsed.limits.unwrap().upper, Some(4.0));
    }

    #[test]
    fn test_entity_trait_implementation() {
        let crit = AcceptanceCriterion::attribute("Seal integrity", 0.90, 0.90, "author");
        assert_eq!(AcceptanceCriterion::PREFIX, "CRIT");
        assert_eq!(crit.title(), "Seal integrity");
        assert_eq!(crit.status(), "draft");
        assert_eq!(crit.author(), "author");
    }
}
