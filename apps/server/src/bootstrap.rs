//! Startup bootstrap.
//!
//! The schema is ensured by the store on connect; this module ensures the
//! default administrator account exists with the administrator flag set.

use entities::User;
use parking_store::ParkingStore;

/// Username of the seeded administrator.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Email of the seeded administrator.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@parkhub.local";
/// Phone of the seeded administrator.
pub const DEFAULT_ADMIN_PHONE: &str = "9999999999";

/// Creates the default admin user if missing, and re-flags an existing
/// `admin` account found without the administrator flag. Idempotent; runs on
/// every startup.
pub async fn ensure_admin<S: ParkingStore>(store: &S, admin_password: &str) -> anyhow::Result<()> {
    match store.get_user_by_username(DEFAULT_ADMIN_USERNAME).await? {
        None => {
            let password_hash = auth::hash_password(admin_password)?;
            let admin = User::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_EMAIL, password_hash)
                .with_phone(DEFAULT_ADMIN_PHONE)
                .with_admin();
            store.create_user(admin).await?;
            tracing::info!(username = DEFAULT_ADMIN_USERNAME, "Default admin user created");
        }
        Some(user) if !user.is_admin => {
            store.set_admin(user.id).await?;
            tracing::info!(
                username = DEFAULT_ADMIN_USERNAME,
                "Existing admin user re-flagged as administrator"
            );
        }
        Some(_) => {}
    }

    Ok(())
}
