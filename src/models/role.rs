//! Modelo de Role y su tabla de permisos
//!
//! Los permisos se guardan como JSON anidado (`módulo -> permiso -> bool`).
//! Aquí se modelan como un struct de structs de forma fija: cualquier módulo
//! u hoja ausente o `null` en el JSON se deserializa como `false`, así que un
//! role leído de la base siempre tiene los ocho módulos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Nombre del role de sistema con acceso total
pub const ADMIN_ROLE_NAME: &str = "Admin";

/// `null` cuenta igual que una clave ausente
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

macro_rules! module_permissions {
    ($(#[$meta:meta])* $name:ident { $($leaf:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                #[serde(deserialize_with = "null_as_default")]
                pub $leaf: bool,
            )+
        }

        impl $name {
            /// Valor de una hoja por nombre; `None` si la hoja no existe
            pub fn get(&self, permission: &str) -> Option<bool> {
                match permission {
                    $(stringify!($leaf) => Some(self.$leaf),)+
                    _ => None,
                }
            }

            /// Todas las hojas en `true`
            pub fn full() -> Self {
                Self { $($leaf: true,)+ }
            }
        }
    };
}

module_permissions!(InventoryPermissions { view, create, edit, delete, import });
module_permissions!(SoldPermissions { view, edit });
module_permissions!(ArbPermissions { view, create, resolve });
module_permissions!(TitlePermissions { view, edit });
module_permissions!(TransportationPermissions { view, create, edit });
module_permissions!(AccountingPermissions { view, create, edit, delete });
module_permissions!(ReportsPermissions { view, export });
module_permissions!(UserManagementPermissions { view, create, edit, delete, impersonate });

/// Tabla completa de permisos de un role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    #[serde(deserialize_with = "null_as_default")]
    pub inventory: InventoryPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub sold: SoldPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub arb: ArbPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub title: TitlePermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub transportation: TransportationPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub accounting: AccountingPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub reports: ReportsPermissions,
    #[serde(deserialize_with = "null_as_default")]
    pub user_management: UserManagementPermissions,
}

impl Permissions {
    pub const MODULES: [&'static str; 8] = [
        "inventory",
        "sold",
        "arb",
        "title",
        "transportation",
        "accounting",
        "reports",
        "user_management",
    ];

    /// Plantilla estática con todo en `false`
    pub fn all_false() -> Self {
        Self::default()
    }

    pub fn all_true() -> Self {
        Self {
            inventory: InventoryPermissions::full(),
            sold: SoldPermissions::full(),
            arb: ArbPermissions::full(),
            title: TitlePermissions::full(),
            transportation: TransportationPermissions::full(),
            accounting: AccountingPermissions::full(),
            reports: ReportsPermissions::full(),
            user_management: UserManagementPermissions::full(),
        }
    }

    /// Buscar `módulo` + `permiso`; `None` si alguno no existe
    pub fn lookup(&self, module: &str, permission: &str) -> Option<bool> {
        match module {
            "inventory" => self.inventory.get(permission),
            "sold" => self.sold.get(permission),
            "arb" => self.arb.get(permission),
            "title" => self.title.get(permission),
            "transportation" => self.transportation.get(permission),
            "accounting" => self.accounting.get(permission),
            "reports" => self.reports.get(permission),
            "user_management" => self.user_management.get(permission),
            _ => None,
        }
    }
}

/// Fila de `roles`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    pub permissions: Json<Permissions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_admin_role(&self) -> bool {
        self.name == ADMIN_ROLE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_modules_default_to_false() {
        let perms: Permissions = serde_json::from_value(json!({
            "inventory": { "view": true },
            "reports": {}
        }))
        .unwrap();

        assert!(perms.inventory.view);
        assert!(!perms.inventory.edit);
        assert_eq!(perms.user_management, UserManagementPermissions::default());

        let normalized = serde_json::to_value(&perms).unwrap();
        for module in Permissions::MODULES {
            assert!(normalized.get(module).is_some(), "module {} missing", module);
        }
    }

    #[test]
    fn test_null_modules_and_leaves_default_to_false() {
        let perms: Permissions = serde_json::from_value(json!({
            "sold": null,
            "inventory": { "view": true, "edit": null }
        }))
        .unwrap();

        assert_eq!(perms.sold, SoldPermissions::default());
        assert_eq!(perms.lookup("inventory", "view"), Some(true));
        assert_eq!(perms.lookup("inventory", "edit"), Some(false));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let perms: Permissions = serde_json::from_value(json!({
            "inventory": { "view": true, "fly": true },
            "weather": { "view": true }
        }))
        .unwrap();
        assert_eq!(perms.lookup("inventory", "fly"), None);
        assert_eq!(perms.lookup("weather", "view"), None);
        assert_eq!(perms.lookup("inventory", "view"), Some(true));
    }

    #[test]
    fn test_all_true_covers_every_leaf() {
        let perms = Permissions::all_true();
        assert_eq!(perms.lookup("user_management", "impersonate"), Some(true));
        assert_eq!(perms.lookup("arb", "resolve"), Some(true));
        assert_eq!(Permissions::all_false().lookup("arb", "resolve"), Some(false));
    }
}
