// src/models/profile.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Papel de um perfil na plataforma.
///
/// É o único lugar onde os literais de papel existem; guards e handlers
/// perguntam ao enum, nunca comparam strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    SuperAdmin,
    GymOwner,
    Member,
    // Qualquer valor que o backend venha a criar e que este painel não conhece
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
            Role::GymOwner => "gym_owner",
            Role::Member => "member",
            Role::Other(value) => value,
        }
    }

    /// Papéis com acesso ao painel.
    pub fn is_valid(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin | Role::GymOwner)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Só donos de academia precisam ter uma academia cadastrada.
    pub fn requires_gym(&self) -> bool {
        matches!(self, Role::GymOwner)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "super_admin" => Role::SuperAdmin,
            "gym_owner" => Role::GymOwner,
            "member" => Role::Member,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Linha da tabela 'profiles'
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[schema(value_type = String, example = "gym_owner")]
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
}
