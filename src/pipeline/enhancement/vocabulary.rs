//! Static reference tables for term extraction and enhancement.
//!
//! All entries are lowercase. Lookups normalize their input before matching.

use super::types::{BodySystem, ClinicalSignificance};

/// Anatomical word roots. A word starting with one of these is an anatomy candidate.
pub const ANATOMICAL_ROOTS: &[&str] = &[
    "abdomin", "aort", "arteri", "bronch", "cardi", "cerebr", "cervic", "cholecyst",
    "colon", "coronar", "crani", "duoden", "esophag", "femor", "gastr", "hepat",
    "lumbar", "mediastin", "nephr", "neur", "oste", "pancrea", "pelv", "pericard",
    "pleur", "pulmon", "renal", "sinus", "spin", "splen", "thorac", "thyro",
    "trache", "ureter", "vascul", "ventric", "vertebr",
];

/// Suffixes marking disease or pathological state.
pub const PATHOLOGY_SUFFIXES: &[&str] = &[
    "itis", "osis", "oma", "emia", "megaly", "pathy", "algia", "ectasia",
    "plasia", "trophy", "monia", "rrhage", "sclerosis", "stenosis", "penia",
];

/// Suffixes marking a procedure or examination.
pub const PROCEDURE_SUFFIXES: &[&str] = &[
    "ectomy", "otomy", "ostomy", "plasty", "scopy", "graphy", "gram", "centesis",
];

/// Imaging-finding vocabulary.
pub const IMAGING_FINDINGS: &[&str] = &[
    "atelectasis", "calcification", "consolidation", "cyst", "edema", "effusion",
    "fracture", "infiltrate", "lesion", "lymphadenopathy", "mass", "nodule",
    "opacity", "pneumothorax", "stenosis", "thickening",
];

/// Units accepted after a number in a measurement.
pub const MEASUREMENT_UNITS: &[&str] = &[
    "mm", "cm", "ml", "mg", "kg", "mmhg", "bpm", "hu", "cc", "g",
];

/// Known misspellings per correct spelling. Looked up in reverse.
pub const COMMON_MISSPELLINGS: &[(&str, &[&str])] = &[
    ("pneumonia", &["pnemonia", "pneumona", "neumonia", "pnuemonia"]),
    ("cardiomegaly", &["cardiomegally", "cardiomeagly", "cardiomgaly"]),
    ("effusion", &["efusion", "effussion"]),
    ("atelectasis", &["atelectisis", "atalectasis", "atelectesis"]),
    ("pneumothorax", &["pnemothorax", "pneumothorx", "neumothorax"]),
    ("consolidation", &["consolodation", "consolidaton"]),
    ("hemorrhage", &["hemorage", "hemmorhage", "haemorage"]),
    ("diverticulitis", &["diverticulitus", "diverticulites"]),
    ("lymphadenopathy", &["lymphadenopaty", "lymphadenophathy"]),
    ("stenosis", &["stenossis", "stenoses"]),
    ("osteoporosis", &["osteoperosis", "osteoporisis"]),
    ("appendicitis", &["appendicitus", "apendicitis"]),
];

/// Common report abbreviations and their expansions.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ap", "anteroposterior"),
    ("bp", "blood pressure"),
    ("cabg", "coronary artery bypass graft"),
    ("chf", "congestive heart failure"),
    ("copd", "chronic obstructive pulmonary disease"),
    ("ct", "computed tomography"),
    ("cxr", "chest x-ray"),
    ("dvt", "deep vein thrombosis"),
    ("ecg", "electrocardiogram"),
    ("gi", "gastrointestinal"),
    ("mi", "myocardial infarction"),
    ("mri", "magnetic resonance imaging"),
    ("pa", "posteroanterior"),
    ("pe", "pulmonary embolism"),
    ("uti", "urinary tract infection"),
];

/// Body-system keyword tables, checked in order.
pub const BODY_SYSTEM_KEYWORDS: &[(BodySystem, &[&str])] = &[
    (
        BodySystem::Cardiovascular,
        &["heart", "cardi", "aort", "arter", "vein", "vascular", "coronary", "myocard"],
    ),
    (
        BodySystem::Respiratory,
        &["lung", "pulmon", "pneum", "bronch", "pleur", "trache", "respirat", "alveol"],
    ),
    (
        BodySystem::Nervous,
        &["brain", "neur", "cerebr", "spinal cord", "nerve", "crani"],
    ),
    (
        BodySystem::Musculoskeletal,
        &["bone", "oste", "joint", "arthr", "muscle", "fracture", "vertebr", "ligament"],
    ),
    (
        BodySystem::Gastrointestinal,
        &["stomach", "gastr", "bowel", "colon", "hepat", "liver", "intestin", "esophag", "pancrea"],
    ),
    (
        BodySystem::Urogenital,
        &["kidney", "renal", "nephr", "bladder", "ureter", "urethr", "prostat", "uter", "ovar"],
    ),
];

/// Severity keyword buckets, checked high to low.
pub const SIGNIFICANCE_KEYWORDS: &[(ClinicalSignificance, &[&str])] = &[
    (
        ClinicalSignificance::High,
        &["acute", "severe", "critical", "emergency", "malignant", "rupture", "life-threatening"],
    ),
    (
        ClinicalSignificance::Moderate,
        &["moderate", "chronic", "progressive", "significant", "persistent"],
    ),
    (
        ClinicalSignificance::Low,
        &["mild", "benign", "minimal", "stable", "incidental"],
    ),
];

/// Reverse misspelling lookup: the correct spelling for a known misspelling.
pub fn correct_spelling(term: &str) -> Option<&'static str> {
    let lower = term.to_lowercase();
    COMMON_MISSPELLINGS
        .iter()
        .find(|(_, misspellings)| misspellings.contains(&lower.as_str()))
        .map(|(correct, _)| *correct)
}

/// Every misspelled form listed in `COMMON_MISSPELLINGS`.
pub fn known_misspellings() -> impl Iterator<Item = &'static str> {
    COMMON_MISSPELLINGS
        .iter()
        .flat_map(|(_, misspellings)| misspellings.iter().copied())
}

/// Expansion for a known abbreviation.
pub fn expand_abbreviation(abbreviation: &str) -> Option<&'static str> {
    let lower = abbreviation.to_lowercase();
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == lower)
        .map(|(_, expansion)| *expansion)
}

/// First body system whose keywords occur in `text`.
pub fn classify_body_system(text: &str) -> BodySystem {
    let lower = text.to_lowercase();
    BODY_SYSTEM_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(system, _)| *system)
        .unwrap_or(BodySystem::General)
}

/// First significance bucket whose keywords occur in `text`.
pub fn classify_significance(text: &str) -> ClinicalSignificance {
    let lower = text.to_lowercase();
    SIGNIFICANCE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(level, _)| *level)
        .unwrap_or(ClinicalSignificance::Moderate)
}
