use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    SalonOwner,
    Caissier,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::SalonOwner => "SALON_OWNER",
            Role::Caissier => "CAISSIER",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLIENT" => Some(Role::Client),
            "SALON_OWNER" => Some(Role::SalonOwner),
            "CAISSIER" => Some(Role::Caissier),
            "ADMIN" => Some(Role::Admin),
            "SUPER_ADMIN" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub salon_id: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_db_strings() {
        for role in [
            Role::Client,
            Role::SalonOwner,
            Role::Caissier,
            Role::Admin,
            Role::SuperAdmin,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("client"), None);
    }

    #[test]
    fn test_role_serializes_like_db_string() {
        let json = serde_json::to_string(&Role::SalonOwner).unwrap();
        assert_eq!(json, "\"SALON_OWNER\"");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            password_hash: "secret-hash".to_string(),
            full_name: "A".to_string(),
            phone: None,
            role: Role::Client,
            salon_id: None,
            is_active: true,
            created_at: "2030-01-01 00:00:00".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
