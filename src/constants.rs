// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DATABASE_FILE: &str = "finance.db";

// Token configuration
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

// Validation limits
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Error messages
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ERR_NO_TOKEN: &str = "Not authorized, no token";
pub const ERR_TOKEN_FAILED: &str = "Not authorized, token failed";
pub const ERR_USER_GONE: &str = "Not authorized, user not found";
pub const ERR_EMAIL_EXISTS: &str = "User already exists";
pub const ERR_USERNAME_TAKEN: &str = "Username is already taken";
pub const ERR_EMAIL_IN_USE: &str = "Email is already in use";
