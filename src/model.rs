use log::warn;
use serde::{Deserialize, Serialize};

/// Kind of a row in the ingredient table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuipKind {
    /// A regular amount/unit/ingredient/preparation row
    #[default]
    Ingredient,
    /// A sub-recipe or section title inside the ingredient table
    Heading,
    /// A row that could not be split into columns, kept verbatim
    Text,
}

/// One amount/unit/ingredient/preparation entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auip {
    #[serde(rename = "type")]
    pub kind: AuipKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
}

impl Auip {
    pub fn heading(text: impl Into<String>) -> Self {
        Auip {
            kind: AuipKind::Heading,
            ingredient: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Auip {
            kind: AuipKind::Text,
            ingredient: Some(text.into()),
            ..Default::default()
        }
    }
}

/// The category-like collections of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Cuisine,
    Occasion,
    Course,
    Diet,
    Appliance,
    Chapter,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Cuisine,
        Facet::Occasion,
        Facet::Course,
        Facet::Diet,
        Facet::Appliance,
        Facet::Chapter,
    ];

    /// Name used as a tag prefix and as the persisted facet name
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Cuisine => "Cuisine",
            Facet::Occasion => "Occasion",
            Facet::Course => "Course",
            Facet::Diet => "Diet",
            Facet::Appliance => "Appliance",
            Facet::Chapter => "Chapter",
        }
    }
}

/// Result of a two-token yield scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Yield {
    Serves(String),
    Makes { amount: String, unit: Option<String> },
}

/// Normalized recipe record shared by every decoder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: Option<String>,
    pub id: Option<String>,
    pub author: Option<String>,
    pub serves: Option<String>,
    pub makes: Option<String>,
    pub makes_unit: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub wait_time: Option<String>,
    pub rest_time: Option<String>,
    pub source: Option<String>,
    pub copyright: Option<String>,
    pub skill_level: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub cuisine: Vec<String>,
    #[serde(default)]
    pub occasion: Vec<String>,
    #[serde(default)]
    pub course: Vec<String>,
    #[serde(default)]
    pub diet: Vec<String>,
    #[serde(default)]
    pub appliance: Vec<String>,
    #[serde(default)]
    pub chapter: Vec<String>,

    #[serde(default)]
    pub ingredients: Vec<Auip>,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,

    /// Non-fatal problems met while decoding (duplicate tags and the like)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Recipe {
    pub fn facet(&self, facet: Facet) -> &Vec<String> {
        match facet {
            Facet::Cuisine => &self.cuisine,
            Facet::Occasion => &self.occasion,
            Facet::Course => &self.course,
            Facet::Diet => &self.diet,
            Facet::Appliance => &self.appliance,
            Facet::Chapter => &self.chapter,
        }
    }

    pub fn facet_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Cuisine => &mut self.cuisine,
            Facet::Occasion => &mut self.occasion,
            Facet::Course => &mut self.course,
            Facet::Diet => &mut self.diet,
            Facet::Appliance => &mut self.appliance,
            Facet::Chapter => &mut self.chapter,
        }
    }

    /// Record a non-fatal decode problem.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Store `value` into a scalar field unless the field already holds a value.
    ///
    /// Empty values are ignored. A second occurrence keeps the first value and
    /// records a warning naming `tag`.
    pub fn set_once(&mut self, field: ScalarField, value: &str, tag: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if let Some(existing) = self.scalar(field) {
            let message = format!(
                "duplicate '{}' ignored: keeping '{}', dropping '{}'",
                tag, existing, value
            );
            self.warn(message);
            return false;
        }
        *self.scalar_mut(field) = Some(value.to_string());
        true
    }

    /// Apply a yield scan result, first value wins.
    pub fn set_yield(&mut self, value: Yield, tag: &str) {
        match value {
            Yield::Serves(amount) => {
                self.set_once(ScalarField::Serves, &amount, tag);
            }
            Yield::Makes { amount, unit } => {
                if self.set_once(ScalarField::Makes, &amount, tag) {
                    if let Some(unit) = unit {
                        self.makes_unit = Some(unit);
                    }
                }
            }
        }
    }

    pub fn scalar(&self, field: ScalarField) -> Option<&str> {
        match field {
            ScalarField::Name => self.name.as_deref(),
            ScalarField::Id => self.id.as_deref(),
            ScalarField::Author => self.author.as_deref(),
            ScalarField::Serves => self.serves.as_deref(),
            ScalarField::Makes => self.makes.as_deref(),
            ScalarField::PrepTime => self.prep_time.as_deref(),
            ScalarField::CookTime => self.cook_time.as_deref(),
            ScalarField::WaitTime => self.wait_time.as_deref(),
            ScalarField::RestTime => self.rest_time.as_deref(),
            ScalarField::Source => self.source.as_deref(),
            ScalarField::Copyright => self.copyright.as_deref(),
            ScalarField::SkillLevel => self.skill_level.as_deref(),
            ScalarField::Rating => self.rating.as_deref(),
            ScalarField::Description => self.description.as_deref(),
        }
    }

    fn scalar_mut(&mut self, field: ScalarField) -> &mut Option<String> {
        match field {
            ScalarField::Name => &mut self.name,
            ScalarField::Id => &mut self.id,
            ScalarField::Author => &mut self.author,
            ScalarField::Serves => &mut self.serves,
            ScalarField::Makes => &mut self.makes,
            ScalarField::PrepTime => &mut self.prep_time,
            ScalarField::CookTime => &mut self.cook_time,
            ScalarField::WaitTime => &mut self.wait_time,
            ScalarField::RestTime => &mut self.rest_time,
            ScalarField::Source => &mut self.source,
            ScalarField::Copyright => &mut self.copyright,
            ScalarField::SkillLevel => &mut self.skill_level,
            ScalarField::Rating => &mut self.rating,
            ScalarField::Description => &mut self.description,
        }
    }

    /// Display name, falling back to a placeholder for untitled records
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled Recipe")
    }
}

/// Scalar fields addressable by tag handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Name,
    Id,
    Author,
    Serves,
    Makes,
    PrepTime,
    CookTime,
    WaitTime,
    RestTime,
    Source,
    Copyright,
    SkillLevel,
    Rating,
    Description,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_once_keeps_first_value() {
        let mut recipe = Recipe::default();
        assert!(recipe.set_once(ScalarField::Author, "  Jane Doe ", "Recipe By"));
        assert!(!recipe.set_once(ScalarField::Author, "John Roe", "Recipe By"));

        assert_eq!(recipe.author.as_deref(), Some("Jane Doe"));
        assert_eq!(recipe.warnings.len(), 1);
        assert!(recipe.warnings[0].contains("John Roe"));
    }

    #[test]
    fn test_set_once_ignores_empty_values() {
        let mut recipe = Recipe::default();
        assert!(!recipe.set_once(ScalarField::Rating, "   ", "Rating"));
        assert!(recipe.rating.is_none());
        assert!(recipe.warnings.is_empty());
    }

    #[test]
    fn test_set_yield_makes_with_unit() {
        let mut recipe = Recipe::default();
        recipe.set_yield(
            Yield::Makes {
                amount: "2".to_string(),
                unit: Some("loaves".to_string()),
            },
            "Yield",
        );
        assert_eq!(recipe.makes.as_deref(), Some("2"));
        assert_eq!(recipe.makes_unit.as_deref(), Some("loaves"));
        assert!(recipe.serves.is_none());
    }

    #[test]
    fn test_facet_mut_targets_one_list() {
        let mut recipe = Recipe::default();
        recipe.facet_mut(Facet::Diet).push("Vegan".to_string());
        for facet in Facet::ALL {
            let expected = usize::from(facet == Facet::Diet);
            assert_eq!(recipe.facet(facet).len(), expected, "{:?}", facet);
        }
    }

    #[test]
    fn test_auip_serializes_kind_as_type() {
        let entry = Auip::heading("** SAUCE **");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["ingredient"], "** SAUCE **");
        assert!(json.get("amount").is_none());
    }
}
