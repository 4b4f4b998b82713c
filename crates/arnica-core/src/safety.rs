//! # Safety Check
//!
//! Drug-interaction screening over the catalog's active ingredients.
//!
//! The interaction table is a compile-time `phf` map keyed by the
//! normalized ingredient pair (lowercase, sorted, joined with `|`), so a
//! screen is a handful of hash lookups with no allocation beyond the keys.
//! The table covers the classic community-pharmacy pairs; it is a warning
//! surface for the cart page and the pharmacist, not a clinical database.
//!
//! ```text
//! screen([warfarin tabs, ibuprofen gel caps, vitamin c])
//!   pairs: warfarin|ibuprofen ──► MAJOR  "bleeding risk..."
//!          warfarin|ascorbic acid ──► (no entry)
//!          ibuprofen|ascorbic acid ──► (no entry)
//! ```

use phf::phf_map;
use serde::Serialize;

use crate::types::Product;

// =============================================================================
// Severity & Table
// =============================================================================

/// How seriously an interaction should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    /// Combination should be flagged to a pharmacist before sale.
    Major,
    /// Worth a caution line on the cart page.
    Moderate,
}

impl InteractionSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionSeverity::Major => "major",
            InteractionSeverity::Moderate => "moderate",
        }
    }
}

/// One row of the static interaction table.
#[derive(Debug)]
pub struct InteractionEntry {
    pub severity: InteractionSeverity,
    pub note: &'static str,
}

/// Known pairwise interactions, keyed by normalized sorted pair.
static INTERACTIONS: phf::Map<&'static str, InteractionEntry> = phf_map! {
    "aspirin|warfarin" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "Combined anticoagulant and antiplatelet effect raises bleeding risk",
    },
    "ibuprofen|warfarin" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "NSAIDs increase bleeding risk and can raise INR on warfarin",
    },
    "fluconazole|warfarin" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "Fluconazole inhibits warfarin metabolism; INR can climb sharply",
    },
    "aspirin|ibuprofen" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "Ibuprofen can blunt the antiplatelet effect of low-dose aspirin",
    },
    "ibuprofen|lisinopril" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "NSAIDs reduce ACE-inhibitor effect and stress renal function",
    },
    "lisinopril|spironolactone" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "ACE inhibitor with potassium-sparing diuretic risks hyperkalemia",
    },
    "nitroglycerin|sildenafil" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "PDE5 inhibitors with nitrates cause severe hypotension",
    },
    "clarithromycin|simvastatin" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "CYP3A4 inhibition raises statin levels; rhabdomyolysis risk",
    },
    "ibuprofen|methotrexate" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "NSAIDs reduce methotrexate clearance; toxicity risk",
    },
    "fluoxetine|tramadol" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "SSRI with tramadol risks serotonin syndrome and lowers seizure threshold",
    },
    "sertraline|tramadol" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "SSRI with tramadol risks serotonin syndrome and lowers seizure threshold",
    },
    "clopidogrel|omeprazole" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "Omeprazole reduces activation of clopidogrel",
    },
    "ciprofloxacin|tizanidine" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "Ciprofloxacin raises tizanidine levels; severe hypotension and sedation",
    },
    "amiodarone|simvastatin" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "Amiodarone raises statin exposure; keep simvastatin dose low",
    },
    "amiodarone|digoxin" => InteractionEntry {
        severity: InteractionSeverity::Major,
        note: "Amiodarone raises digoxin levels; toxicity risk",
    },
    "calcium carbonate|levothyroxine" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "Calcium impairs levothyroxine absorption; separate doses by 4 hours",
    },
    "metoprolol|verapamil" => InteractionEntry {
        severity: InteractionSeverity::Moderate,
        note: "Beta blocker with verapamil can cause bradycardia and AV block",
    },
};

// =============================================================================
// Screening
// =============================================================================

/// A warning produced by the screen, shaped for the API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyWarning {
    pub kind: WarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<InteractionSeverity>,
    /// Product names, in the order they were screened.
    pub product_a: String,
    pub product_b: String,
    pub ingredients: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Two different ingredients with a known interaction.
    Interaction,
    /// Two products sharing one ingredient (accidental double-dosing).
    DuplicateIngredient,
}

/// Normalizes an ingredient name for table lookup.
pub fn normalize(ingredient: &str) -> String {
    ingredient.trim().to_lowercase()
}

/// Looks up the interaction between two ingredients, order-insensitive.
pub fn interaction_between(a: &str, b: &str) -> Option<&'static InteractionEntry> {
    let (a, b) = (normalize(a), normalize(b));
    let key = if a <= b {
        format!("{}|{}", a, b)
    } else {
        format!("{}|{}", b, a)
    };
    INTERACTIONS.get(key.as_str())
}

/// Screens a set of products pairwise.
///
/// Products without an active ingredient (bandages, vitamins sold without
/// one recorded) are skipped. Each unordered pair is reported once.
pub fn screen(products: &[Product]) -> Vec<SafetyWarning> {
    let mut warnings = Vec::new();

    for (i, left) in products.iter().enumerate() {
        let Some(ing_left) = left.active_ingredient.as_deref() else {
            continue;
        };
        for right in &products[i + 1..] {
            let Some(ing_right) = right.active_ingredient.as_deref() else {
                continue;
            };
            let (a, b) = (normalize(ing_left), normalize(ing_right));
            if a == b {
                warnings.push(SafetyWarning {
                    kind: WarningKind::DuplicateIngredient,
                    severity: None,
                    product_a: left.name.clone(),
                    product_b: right.name.clone(),
                    ingredients: vec![a],
                    note: format!(
                        "Both products contain {}; taking them together risks double-dosing",
                        ing_right.trim()
                    ),
                });
            } else if let Some(entry) = interaction_between(&a, &b) {
                warnings.push(SafetyWarning {
                    kind: WarningKind::Interaction,
                    severity: Some(entry.severity),
                    product_a: left.name.clone(),
                    product_b: right.name.clone(),
                    ingredients: vec![a, b],
                    note: entry.note.to_string(),
                });
            }
        }
    }

    warnings
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, ingredient: Option<&str>) -> Product {
        Product {
            id: format!("id-{}", name),
            sku: format!("SKU-{}", name),
            name: name.to_string(),
            description: None,
            category_id: None,
            supplier_id: None,
            price_cents: 500,
            requires_prescription: false,
            active_ingredient: ingredient.map(|i| i.to_string()),
            image_path: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_lookup_is_order_and_case_insensitive() {
        let a = interaction_between("Warfarin", "ibuprofen").unwrap();
        let b = interaction_between("IBUPROFEN", "warfarin").unwrap();
        assert_eq!(a.severity, InteractionSeverity::Major);
        assert_eq!(a.note, b.note);
    }

    #[test]
    fn test_unknown_pair_has_no_entry() {
        assert!(interaction_between("paracetamol", "cetirizine").is_none());
    }

    #[test]
    fn test_screen_flags_interaction() {
        let warnings = screen(&[
            product("Coumadin 5mg", Some("warfarin")),
            product("Nurofen", Some("ibuprofen")),
            product("Vitamin C", None),
        ]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Interaction);
        assert_eq!(warnings[0].severity, Some(InteractionSeverity::Major));
        assert_eq!(warnings[0].product_a, "Coumadin 5mg");
        assert_eq!(warnings[0].product_b, "Nurofen");
    }

    #[test]
    fn test_screen_flags_duplicate_ingredient() {
        let warnings = screen(&[
            product("Panadol", Some("Paracetamol")),
            product("Calpol Syrup", Some("paracetamol")),
        ]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DuplicateIngredient);
        assert_eq!(warnings[0].ingredients, vec!["paracetamol"]);
    }

    #[test]
    fn test_screen_reports_each_pair_once() {
        let warnings = screen(&[
            product("Coumadin", Some("warfarin")),
            product("Nurofen", Some("ibuprofen")),
            product("Aspro", Some("aspirin")),
        ]);
        // warfarin|ibuprofen, warfarin|aspirin, ibuprofen|aspirin
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_screen_skips_products_without_ingredient() {
        let warnings = screen(&[
            product("Bandage", None),
            product("Thermometer", None),
            product("Nurofen", Some("ibuprofen")),
        ]);
        assert!(warnings.is_empty());
    }
}
