//! Structured intake record collected by the patient-entry screen.
//!
//! Field names and enum spellings follow the clinical records API, so a record
//! serialised here can be posted as-is.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Yes/no answers as the records API spells them.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanChoice {
    #[serde(rename = "是")]
    Yes,
    #[default]
    #[serde(rename = "否")]
    No,
}

impl BooleanChoice {
    pub fn is_yes(self) -> bool {
        self == BooleanChoice::Yes
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSide {
    #[serde(rename = "OS")]
    Left,
    #[serde(rename = "OD")]
    Right,
    #[serde(rename = "OU")]
    Both,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct LifestyleInfo {
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub smoking_history: Option<String>,
    #[serde(default)]
    pub drinking_history: Option<String>,
    #[serde(default)]
    pub diet_habit: Option<String>,
    pub daily_outdoor_hours: f64,
    pub daily_screen_hours: f64,
    pub daily_sleep_hours: f64,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct SystemicHistory {
    pub hypertension: BooleanChoice,
    pub diabetes: BooleanChoice,
    pub cardiovascular_disease: BooleanChoice,
    pub rheumatoid_arthritis: BooleanChoice,
    pub thyroid_disease: BooleanChoice,
    pub skin_disease: BooleanChoice,
    #[serde(default)]
    pub long_term_medication: Option<String>,
}

impl SystemicHistory {
    /// Number of systemic conditions answered "yes".
    pub fn condition_count(&self) -> usize {
        [
            self.hypertension,
            self.diabetes,
            self.cardiovascular_disease,
            self.rheumatoid_arthritis,
            self.thyroid_disease,
            self.skin_disease,
        ]
        .iter()
        .filter(|c| c.is_yes())
        .count()
    }
}

/// OSDI questionnaire items, each scored 0 (none of the time) to 4 (all of the time).
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct OcularSymptoms {
    pub sensitivity_light: u8,
    pub grittiness: u8,
    pub pain_soreness: u8,
    pub blurred_vision: u8,
    pub poor_vision: u8,
    pub reading_difficulty: u8,
    pub driving_difficulty: u8,
    pub computer_difficulty: u8,
    pub wind_discomfort: u8,
    pub dry_air_discomfort: u8,
    pub ac_discomfort: u8,
    #[serde(default)]
    pub osdi_total_score: Option<f64>,
}

pub const OSDI_MAX_ITEM_SCORE: u8 = 4;

impl OcularSymptoms {
    fn items(&self) -> [(&'static str, u8); 11] {
        [
            ("sensitivity_light", self.sensitivity_light),
            ("grittiness", self.grittiness),
            ("pain_soreness", self.pain_soreness),
            ("blurred_vision", self.blurred_vision),
            ("poor_vision", self.poor_vision),
            ("reading_difficulty", self.reading_difficulty),
            ("driving_difficulty", self.driving_difficulty),
            ("computer_difficulty", self.computer_difficulty),
            ("wind_discomfort", self.wind_discomfort),
            ("dry_air_discomfort", self.dry_air_discomfort),
            ("ac_discomfort", self.ac_discomfort),
        ]
    }

    /// OSDI = sum of item scores × 25 / number of answered items, on a 0–100 scale.
    pub fn osdi_score(&self) -> f64 {
        let items = self.items();
        let sum: u32 = items.iter().map(|(_, score)| u32::from(*score)).sum();
        f64::from(sum) * 25.0 / items.len() as f64
    }

    pub fn severity(&self) -> OsdiSeverity {
        OsdiSeverity::classify(self.osdi_score())
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OsdiSeverity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl OsdiSeverity {
    pub fn classify(score: f64) -> Self {
        if score < 13.0 {
            OsdiSeverity::Normal
        } else if score < 23.0 {
            OsdiSeverity::Mild
        } else if score < 33.0 {
            OsdiSeverity::Moderate
        } else {
            OsdiSeverity::Severe
        }
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct EyeExamination {
    #[serde(default)]
    pub visual_acuity_od: Option<f64>,
    #[serde(default)]
    pub visual_acuity_os: Option<f64>,
    /// Intraocular pressure, mmHg.
    #[serde(default)]
    pub iop_od: Option<f64>,
    #[serde(default)]
    pub iop_os: Option<f64>,

    // Slit lamp
    #[serde(default)]
    pub conjunctival_congestion: Option<String>,
    #[serde(default)]
    pub corneal_staining_score: Option<f64>,

    // Dry eye workup
    /// Tear film break-up time, seconds.
    #[serde(default)]
    pub but_od: Option<f64>,
    #[serde(default)]
    pub but_os: Option<f64>,
    /// Schirmer test, mm wetting in 5 minutes.
    #[serde(default)]
    pub schirmer_od: Option<f64>,
    #[serde(default)]
    pub schirmer_os: Option<f64>,

    /// Meibography input for the diagnosis model, percent.
    #[serde(default)]
    pub meibomian_loss_rate: Option<f64>,
    #[serde(default)]
    pub meibomian_status: Option<String>,
}

impl EyeExamination {
    fn check_range(
        issues: &mut Vec<String>,
        field: &str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) {
        if let Some(v) = value {
            if !v.is_finite() || v < min || v > max {
                issues.push(format!("{} must be within {}..={}, got {}", field, min, max, v));
            }
        }
    }

    fn validate_into(&self, issues: &mut Vec<String>) {
        Self::check_range(issues, "visual_acuity_od", self.visual_acuity_od, 0.0, 2.0);
        Self::check_range(issues, "visual_acuity_os", self.visual_acuity_os, 0.0, 2.0);
        Self::check_range(issues, "iop_od", self.iop_od, 0.0, 80.0);
        Self::check_range(issues, "iop_os", self.iop_os, 0.0, 80.0);
        Self::check_range(issues, "corneal_staining_score", self.corneal_staining_score, 0.0, 15.0);
        Self::check_range(issues, "but_od", self.but_od, 0.0, 60.0);
        Self::check_range(issues, "but_os", self.but_os, 0.0, 60.0);
        Self::check_range(issues, "schirmer_od", self.schirmer_od, 0.0, 35.0);
        Self::check_range(issues, "schirmer_os", self.schirmer_os, 0.0, 35.0);
        Self::check_range(issues, "meibomian_loss_rate", self.meibomian_loss_rate, 0.0, 100.0);
    }
}

/// The complete intake form.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct ClinicalRecordForm {
    pub patient_id: String,
    pub doctor_id: String,
    /// ISO date, `YYYY-MM-DD`.
    pub record_date: String,
    pub lifestyle: LifestyleInfo,
    pub systemic_history: SystemicHistory,
    pub symptoms: OcularSymptoms,
    pub examination: EyeExamination,
}

impl ClinicalRecordForm {
    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.patient_id.trim().is_empty() {
            issues.push("patient_id is required".to_string());
        }
        if self.doctor_id.trim().is_empty() {
            issues.push("doctor_id is required".to_string());
        }
        if NaiveDate::parse_from_str(&self.record_date, "%Y-%m-%d").is_err() {
            issues.push(format!(
                "record_date must be YYYY-MM-DD, got '{}'",
                self.record_date
            ));
        }

        let lifestyle = &self.lifestyle;
        let hours = [
            ("daily_outdoor_hours", lifestyle.daily_outdoor_hours),
            ("daily_screen_hours", lifestyle.daily_screen_hours),
            ("daily_sleep_hours", lifestyle.daily_sleep_hours),
        ];
        for (field, value) in hours {
            if !value.is_finite() || !(0.0..=24.0).contains(&value) {
                issues.push(format!("{} must be within 0..=24, got {}", field, value));
            }
        }
        let total: f64 = hours.iter().map(|(_, v)| v).sum();
        if total > 24.0 {
            issues.push(format!("daily hours add up to {} (more than 24)", total));
        }

        for (field, score) in self.symptoms.items() {
            if score > OSDI_MAX_ITEM_SCORE {
                issues.push(format!(
                    "{} must be within 0..={}, got {}",
                    field, OSDI_MAX_ITEM_SCORE, score
                ));
            }
        }

        self.examination.validate_into(&mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Validates the form and fills in the OSDI total.
    pub fn finalize(mut self) -> Result<Self, Vec<String>> {
        self.validate()?;
        let score = self.symptoms.osdi_score();
        self.symptoms.osdi_total_score = Some((score * 100.0).round() / 100.0);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "patient_id": "P-0001",
            "doctor_id": "D-7",
            "record_date": "2025-03-14",
            "lifestyle": {
                "occupation": "engineer",
                "daily_outdoor_hours": 1.5,
                "daily_screen_hours": 9,
                "daily_sleep_hours": 7
            },
            "systemic_history": {
                "hypertension": "否",
                "diabetes": "是",
                "cardiovascular_disease": "否",
                "rheumatoid_arthritis": "否",
                "thyroid_disease": "是",
                "skin_disease": "否"
            },
            "symptoms": {
                "sensitivity_light": 2,
                "grittiness": 3,
                "pain_soreness": 1,
                "blurred_vision": 2,
                "poor_vision": 0,
                "reading_difficulty": 2,
                "driving_difficulty": 1,
                "computer_difficulty": 4,
                "wind_discomfort": 3,
                "dry_air_discomfort": 2,
                "ac_discomfort": 2
            },
            "examination": {
                "visual_acuity_od": 0.8,
                "iop_od": 15.5,
                "but_od": 4,
                "schirmer_os": 6,
                "meibomian_loss_rate": 35
            }
        }"#
    }

    #[test]
    fn test_parse_and_finalize() {
        let form: ClinicalRecordForm =
            serde_json::from_str(sample_json()).expect("sample should parse");
        assert_eq!(form.systemic_history.condition_count(), 2);

        let form = form.finalize().expect("sample should validate");
        // 22 points over 11 items.
        assert_eq!(form.symptoms.osdi_total_score, Some(50.0));
        assert_eq!(form.symptoms.severity(), OsdiSeverity::Severe);
    }

    #[test]
    fn test_boolean_choice_wire_values() {
        assert_eq!(serde_json::to_string(&BooleanChoice::Yes).unwrap(), "\"是\"");
        assert_eq!(serde_json::to_string(&EyeSide::Right).unwrap(), "\"OD\"");
    }

    #[test]
    fn test_osdi_severity_bands() {
        assert_eq!(OsdiSeverity::classify(0.0), OsdiSeverity::Normal);
        assert_eq!(OsdiSeverity::classify(12.9), OsdiSeverity::Normal);
        assert_eq!(OsdiSeverity::classify(13.0), OsdiSeverity::Mild);
        assert_eq!(OsdiSeverity::classify(22.99), OsdiSeverity::Mild);
        assert_eq!(OsdiSeverity::classify(23.0), OsdiSeverity::Moderate);
        assert_eq!(OsdiSeverity::classify(33.0), OsdiSeverity::Severe);
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut form: ClinicalRecordForm = serde_json::from_str(sample_json()).unwrap();
        form.patient_id = " ".to_string();
        form.record_date = "14/03/2025".to_string();
        form.symptoms.grittiness = 7;
        form.lifestyle.daily_screen_hours = 20.0;
        form.examination.iop_os = Some(120.0);

        let issues = form.validate().expect_err("form should be rejected");
        assert_eq!(issues.len(), 5, "unexpected issues: {:?}", issues);
        assert!(issues.iter().any(|i| i.starts_with("patient_id")));
        assert!(issues.iter().any(|i| i.starts_with("record_date")));
        assert!(issues.iter().any(|i| i.starts_with("grittiness")));
        assert!(issues.iter().any(|i| i.contains("more than 24")));
        assert!(issues.iter().any(|i| i.starts_with("iop_os")));
    }
}
