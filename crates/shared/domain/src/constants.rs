//! Domain-level constants.
//!
//! These constants define collection names, document field names and
//! business defaults shared by every layer.

// =============================================================================
// Collections
// =============================================================================

/// Collection holding user documents
pub const USERS_COLLECTION: &str = "users";

/// Collection holding contact documents
pub const CONTACTS_COLLECTION: &str = "contacts";

/// Collection holding group documents
pub const GROUPS_COLLECTION: &str = "groups";

/// Join collection recording group membership
pub const GROUP_CONTACTS_COLLECTION: &str = "groupcontacts";

// =============================================================================
// Field names
// =============================================================================

/// Public identifier field present on every returned document
pub const ID_FIELD: &str = "id";

/// Owning user reference on contacts and groups
pub const ID_USER_FIELD: &str = "idUser";

/// Group side of a membership row
pub const ID_GROUP_FIELD: &str = "idGroup";

/// Contact side of a membership row
pub const ID_CONTACT_FIELD: &str = "idContact";

/// Contact references held by a user
pub const CONTACTS_FIELD: &str = "contacts";

/// Username field on users
pub const USERNAME_FIELD: &str = "username";

// =============================================================================
// Defaults
// =============================================================================

/// Default group capacity
pub const DEFAULT_MAX_CONTACTS: u32 = 50;

/// Image assigned to contacts created without one
pub const DEFAULT_CONTACT_IMAGE: &str = "https://e7.pngegg.com/pngimages/889/832/png-clipart-google-contacts-mobile-app-contact-manager-app-store-android-application-package-email-miscellaneous-blue.png";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;
