//! Recommendation table and selector.
//!
//! The table is built once at startup, either from the built-in content or
//! from a TOML file named in the configuration, and is read-only afterwards.
//! Callers hold it and pass it by reference to [`select_recommendations`].

use crate::types::*;
use crate::{Error, RecommendationsConfig, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One bundle as written in a table file; the phase comes from the table key
#[derive(Debug, Deserialize)]
struct BundleEntry {
    diet_style: String,
    fasting_protocol: String,
    #[serde(default)]
    foods: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    activities: Vec<String>,
    #[serde(default)]
    supplements: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn foods(categories: Vec<(&str, Vec<&str>)>) -> BTreeMap<String, Vec<String>> {
    categories
        .into_iter()
        .map(|(category, items)| (category.to_string(), strings(&items)))
        .collect()
}

fn builtin_bundles() -> Vec<RecommendationBundle> {
    vec![
        RecommendationBundle {
            phase: FunctionalPhase::Power,
            diet_style: "Ketobiotic".into(),
            fasting_protocol: "13 to 72 hours as tolerated (16:8, 24h, OMAD)".into(),
            foods: foods(vec![
                ("healthy_fats", vec!["avocado", "olive oil", "coconut oil", "ghee"]),
                ("clean_proteins", vec!["fish", "eggs", "tofu", "organic chicken"]),
                ("cruciferous_vegetables", vec!["broccoli", "brussels sprouts", "kale"]),
                ("prebiotics", vec!["garlic", "onion", "leek", "dandelion root"]),
                ("seeds", vec!["flax", "chia", "pumpkin", "sunflower", "sesame"]),
                ("probiotics", vec!["kimchi", "sauerkraut", "yogurt", "kefir"]),
                ("estrogen_builders", vec!["spinach", "sprouts", "blueberries", "strawberries"]),
            ]),
            activities: strings(&[
                "Low intensity exercise",
                "Gentle yoga",
                "Walking",
                "Rest as needed",
                "Meditation and relaxation practices",
            ]),
            supplements: vec![],
        },
        RecommendationBundle {
            phase: FunctionalPhase::Manifestation,
            diet_style: "Transition from ketobiotic to hormone feasting".into(),
            fasting_protocol: "No more than 15 hours, avoid extended fasts".into(),
            foods: foods(vec![
                ("root_vegetables", vec!["beets", "carrots", "turnips", "fennel"]),
                ("fresh_fruits", vec!["grapefruit", "berries", "pineapple", "mango", "papaya"]),
                ("cruciferous_vegetables", vec!["cauliflower", "kale", "broccoli"]),
                ("detox", vec!["fermented pickles", "lemon", "parsley"]),
                ("polyphenols", vec!["olives", "red onion", "dark chocolate"]),
                ("nuts_and_seeds", vec!["almonds", "cashews", "brazil nuts"]),
            ]),
            activities: strings(&[
                "Moderate to high intensity exercise",
                "Social activities",
                "Creative projects",
                "Important decision making",
                "Networking and communication",
            ]),
            supplements: vec![],
        },
        RecommendationBundle {
            phase: FunctionalPhase::Nurture,
            diet_style: "Extended hormone feasting".into(),
            fasting_protocol: "Avoid fasting, frequent warm meals with complex carbs".into(),
            foods: foods(vec![
                (
                    "root_vegetables",
                    vec!["sweet potato", "yuca", "red potato", "butternut squash"],
                ),
                ("complex_carbs", vec!["oats", "brown rice", "quinoa"]),
                ("magnesium_and_b6", vec!["banana", "sunflower seeds", "dark chocolate"]),
                ("comfort_fruits", vec!["dates", "figs", "cooked apple"]),
                ("calming_teas", vec!["chamomile", "ginger root", "fennel"]),
                ("gentle_proteins", vec!["chicken broth", "turkey", "soups"]),
            ]),
            activities: strings(&[
                "Gentle restorative exercise",
                "Relaxing activities",
                "Self-care and rest",
                "Time in nature",
            ]),
            supplements: strings(&["Magnesium", "Vitamin B6", "Omega-3", "Probiotics"]),
        },
    ]
}

impl RecommendationTable {
    /// Build a table from bundles, rejecting a phase that appears twice
    pub fn from_bundles(bundles: Vec<RecommendationBundle>) -> Result<Self> {
        let mut map = HashMap::new();
        for bundle in bundles {
            let phase = bundle.phase;
            if map.insert(phase, bundle).is_some() {
                return Err(Error::Config(format!(
                    "recommendation table lists phase '{}' twice",
                    phase
                )));
            }
        }
        Ok(Self { bundles: map })
    }

    /// The built-in table covering all three functional phases
    pub fn builtin() -> Self {
        let bundles = builtin_bundles()
            .into_iter()
            .map(|b| (b.phase, b))
            .collect();
        Self { bundles }
    }

    /// Load a table from a TOML file keyed by functional phase name
    ///
    /// ```toml
    /// [power]
    /// diet_style = "Ketobiotic"
    /// fasting_protocol = "16:8"
    /// activities = ["Walking"]
    ///
    /// [power.foods]
    /// proteins = ["fish", "eggs"]
    /// ```
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, BundleEntry> = toml::from_str(&contents)?;

        let bundles = entries
            .into_iter()
            .map(|(key, entry)| {
                let phase: FunctionalPhase = key.parse()?;
                Ok(RecommendationBundle {
                    phase,
                    diet_style: entry.diet_style,
                    fasting_protocol: entry.fasting_protocol,
                    foods: entry.foods,
                    activities: entry.activities,
                    supplements: entry.supplements,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let table = Self::from_bundles(bundles)?;
        tracing::info!(
            "Loaded recommendation table with {} phases from {:?}",
            table.bundles.len(),
            path
        );
        Ok(table)
    }

    /// Build the table the configuration asks for and validate it
    pub fn from_config(config: &RecommendationsConfig) -> Result<Self> {
        let table = match &config.table_path {
            Some(path) => Self::load_from(path)?,
            None => Self::builtin(),
        };

        let errors = table.validate();
        if !errors.is_empty() {
            return Err(Error::Config(format!(
                "invalid recommendation table: {}",
                errors.join("; ")
            )));
        }
        Ok(table)
    }

    /// Validate the table for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for phase in FunctionalPhase::ALL {
            let Some(bundle) = self.bundles.get(&phase) else {
                errors.push(format!("No recommendations for phase '{}'", phase));
                continue;
            };

            if bundle.phase != phase {
                errors.push(format!(
                    "Bundle stored under '{}' is tagged '{}'",
                    phase, bundle.phase
                ));
            }
            if bundle.diet_style.trim().is_empty() {
                errors.push(format!("Phase '{}' has empty diet style", phase));
            }
            if bundle.fasting_protocol.trim().is_empty() {
                errors.push(format!("Phase '{}' has empty fasting protocol", phase));
            }
            if bundle.foods.is_empty() {
                errors.push(format!("Phase '{}' has no food lists", phase));
            }
            for (category, items) in &bundle.foods {
                if items.is_empty() {
                    errors.push(format!(
                        "Phase '{}': food category '{}' is empty",
                        phase, category
                    ));
                }
            }
        }

        errors
    }
}

/// Look up the bundle for a functional phase
pub fn select_recommendations(
    table: &RecommendationTable,
    functional_phase: FunctionalPhase,
) -> Result<&RecommendationBundle> {
    table
        .bundles
        .get(&functional_phase)
        .ok_or_else(|| Error::UnknownPhase(functional_phase.to_string()))
}

/// Look up a bundle by raw tag, as received from a front-end
pub fn select_recommendations_by_tag<'a>(
    table: &'a RecommendationTable,
    tag: &str,
) -> Result<&'a RecommendationBundle> {
    let phase: FunctionalPhase = tag.parse()?;
    select_recommendations(table, phase)
}
