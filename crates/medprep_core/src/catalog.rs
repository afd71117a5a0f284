//! crates/medprep_core/src/catalog.rs
//!
//! The subject -> topic table the planner allocates from.
//!
//! The catalog is an immutable value built once at startup and injected
//! wherever it is needed, so tests can run against alternate tables.

/// An ordered collection of subjects, each with an ordered topic list.
#[derive(Debug, Clone)]
pub struct TopicCatalog {
    subjects: Vec<(String, Vec<String>)>,
}

impl TopicCatalog {
    /// Builds a catalog from `(subject, topics)` pairs, preserving order.
    pub fn new<S: Into<String>>(subjects: Vec<(S, Vec<S>)>) -> Self {
        Self {
            subjects: subjects
                .into_iter()
                .map(|(name, topics)| {
                    (name.into(), topics.into_iter().map(Into::into).collect())
                })
                .collect(),
        }
    }

    /// The default MBBS catalog the service ships with.
    pub fn mbbs() -> Self {
        Self::new(vec![
            (
                "Anatomy",
                vec![
                    "Upper Limb",
                    "Lower Limb",
                    "Thorax",
                    "Abdomen & Pelvis",
                    "Head & Neck",
                    "Neuroanatomy",
                    "Embryology",
                    "Histology",
                ],
            ),
            (
                "Physiology",
                vec![
                    "General Physiology",
                    "Blood",
                    "Nerve & Muscle",
                    "Cardiovascular System",
                    "Respiratory System",
                    "Renal Physiology",
                    "Gastrointestinal Physiology",
                    "Endocrinology",
                    "Central Nervous System",
                    "Reproductive Physiology",
                ],
            ),
            (
                "Biochemistry",
                vec![
                    "Biomolecules",
                    "Enzymes",
                    "Carbohydrate Metabolism",
                    "Lipid Metabolism",
                    "Protein & Amino Acid Metabolism",
                    "Molecular Biology",
                    "Vitamins & Minerals",
                    "Organ Function Tests",
                ],
            ),
            (
                "Pathology",
                vec![
                    "Cell Injury & Adaptation",
                    "Inflammation & Repair",
                    "Hemodynamic Disorders",
                    "Neoplasia",
                    "Immunopathology",
                    "Hematopathology",
                    "Systemic Pathology",
                ],
            ),
            (
                "Pharmacology",
                vec![
                    "General Pharmacology",
                    "Autonomic Nervous System",
                    "Cardiovascular Drugs",
                    "Antimicrobials",
                    "CNS Pharmacology",
                    "Endocrine Pharmacology",
                    "Chemotherapy",
                ],
            ),
            (
                "Microbiology",
                vec![
                    "General Microbiology",
                    "Immunology",
                    "Bacteriology",
                    "Virology",
                    "Mycology",
                    "Parasitology",
                ],
            ),
            (
                "Forensic Medicine",
                vec![
                    "Thanatology",
                    "Injuries & Wounds",
                    "Toxicology",
                    "Medical Jurisprudence",
                ],
            ),
            (
                "Community Medicine",
                vec![
                    "Epidemiology",
                    "Biostatistics",
                    "Nutrition",
                    "Maternal & Child Health",
                    "National Health Programmes",
                    "Environmental Health",
                ],
            ),
            (
                "Medicine",
                vec![
                    "Cardiology",
                    "Respiratory Medicine",
                    "Gastroenterology",
                    "Nephrology",
                    "Neurology",
                    "Endocrine & Metabolic Disease",
                    "Infectious Diseases",
                    "Rheumatology",
                ],
            ),
            (
                "Surgery",
                vec![
                    "Wound Healing & Surgical Infection",
                    "Fluid & Electrolyte Management",
                    "Trauma",
                    "Gastrointestinal Surgery",
                    "Hepatobiliary Surgery",
                    "Urology",
                    "Orthopaedics",
                ],
            ),
            (
                "Obstetrics & Gynaecology",
                vec![
                    "Normal Pregnancy",
                    "Antenatal Care",
                    "Labour & Delivery",
                    "Obstetric Emergencies",
                    "Menstrual Disorders",
                    "Gynaecological Oncology",
                ],
            ),
            (
                "Pediatrics",
                vec![
                    "Growth & Development",
                    "Neonatology",
                    "Pediatric Nutrition",
                    "Immunization",
                    "Common Pediatric Illnesses",
                ],
            ),
        ])
    }

    /// True if the catalog knows the subject.
    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.iter().any(|(name, _)| name == subject)
    }

    /// Subject names in declaration order.
    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The ordered topic list of one subject, if known.
    pub fn topics_of(&self, subject: &str) -> Option<&[String]> {
        self.subjects
            .iter()
            .find(|(name, _)| name == subject)
            .map(|(_, topics)| topics.as_slice())
    }

    /// Flattens the topics of the given subjects, in the input order, with
    /// each subject's internal order preserved. Unrecognized names
    /// contribute nothing; validating them is the caller's job.
    pub fn topics_for<S: AsRef<str>>(&self, subjects: &[S]) -> Vec<String> {
        let mut out = Vec::new();
        for subject in subjects {
            if let Some(topics) = self.topics_of(subject.as_ref()) {
                out.extend(topics.iter().cloned());
            }
        }
        out
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::mbbs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_catalog() -> TopicCatalog {
        TopicCatalog::new(vec![
            ("Anatomy", vec!["Upper Limb", "Thorax"]),
            ("Physiology", vec!["Blood", "CVS", "Renal"]),
        ])
    }

    #[test]
    fn flattens_in_input_order() {
        let catalog = small_catalog();
        let topics = catalog.topics_for(&["Physiology", "Anatomy"]);
        assert_eq!(topics, vec!["Blood", "CVS", "Renal", "Upper Limb", "Thorax"]);
    }

    #[test]
    fn unknown_subject_contributes_nothing() {
        let catalog = small_catalog();
        let topics = catalog.topics_for(&["Anatomy", "Astrology"]);
        assert_eq!(topics, vec!["Upper Limb", "Thorax"]);
    }

    #[test]
    fn mbbs_catalog_has_unique_subjects() {
        let catalog = TopicCatalog::mbbs();
        let names = catalog.subject_names();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert!(catalog.contains("Anatomy"));
        assert!(catalog.contains("Obstetrics & Gynaecology"));
    }
}
