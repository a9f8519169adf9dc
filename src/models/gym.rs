// src/models/gym.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

static SLUG_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex is valid"));
static SLUG_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\s-]").expect("slug regex is valid"));
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("slug regex is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GymTier {
    #[default]
    Standard,
    Premium,
}

// Status de aprovação na plataforma; o dono nunca escolhe, nasce 'pending'
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GymStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

// ---
// Linha da tabela 'gyms'
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Gym {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Iron Pulse Fitness")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "iron-pulse-fitness")]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tier: GymTier,
    #[serde(default)]
    pub status: GymStatus,
    #[serde(default)]
    pub supports_bundles: bool,
    #[serde(default)]
    pub facilities: Option<Vec<String>>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub branding_color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_supports_bundles() -> bool {
    true
}

// ---
// Formulário de cadastro de academia
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGymPayload {
    #[validate(length(min = 1, message = "Gym name is required"))]
    #[schema(example = "Iron Pulse Fitness")]
    pub name: String,

    // Em branco: gerado a partir do nome
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tier: GymTier,
    #[serde(default = "default_supports_bundles")]
    pub supports_bundles: bool,
    #[serde(default)]
    pub facilities: Vec<String>,

    #[validate(email(message = "Please enter a valid contact email."))]
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub branding_color: Option<String>,
}

// O que de fato vai para o INSERT
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGymRow {
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tier: GymTier,
    pub status: GymStatus,
    pub supports_bundles: bool,
    pub facilities: Option<Vec<String>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub branding_color: String,
    pub rating: f64,
    pub reviews: i32,
}

impl CreateGymPayload {
    /// Normaliza o formulário na linha a inserir: campos aparados, vazios viram NULL,
    /// slug gerado quando ausente e status sempre 'pending'.
    pub fn into_row(self, owner_id: Uuid) -> Result<NewGymRow, ValidationErrors> {
        let name = self.name.trim().to_string();
        let slug = match non_blank(self.slug) {
            Some(slug) => slug,
            None => generate_slug(&name),
        };

        if !is_valid_slug(&slug) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "slug",
                ValidationError::new("slug_format").with_message(
                    "Slug must contain only lowercase letters, numbers, and hyphens".into(),
                ),
            );
            return Err(errors);
        }

        let mut facilities: Vec<String> = Vec::new();
        for facility in self.facilities {
            let facility = facility.trim();
            if !facility.is_empty() && !facilities.iter().any(|f| f == facility) {
                facilities.push(facility.to_string());
            }
        }

        Ok(NewGymRow {
            owner_id,
            name,
            slug,
            description: non_blank(self.description),
            address: non_blank(self.address),
            city: non_blank(self.city),
            latitude: self.latitude,
            longitude: self.longitude,
            tier: self.tier,
            status: GymStatus::Pending,
            supports_bundles: self.supports_bundles,
            facilities: (!facilities.is_empty()).then_some(facilities),
            contact_email: non_blank(self.contact_email),
            contact_phone: non_blank(self.contact_phone),
            branding_color: non_blank(self.branding_color).unwrap_or_else(|| "#005CFF".into()),
            rating: 0.0,
            reviews: 0,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// "Iron Pulse Fitness!" -> "iron-pulse-fitness"
pub fn generate_slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_FORMAT.is_match(slug)
}
