/// Data models for the identity core
pub mod account;
pub mod pillar;
pub mod secret_token;
pub mod verification_code;

pub use account::{
    Account, AccountPublic, AccountRole, AccountStatus, ChangePasswordRequest, CreateAdminRequest,
    LoginRequest, RegisterRequest,
};
pub use pillar::{sub_pillar_base, PillarTracker, PILLAR_CAPACITY};
pub use secret_token::{
    ConfirmEmailChangeRequest, RequestEmailChangeRequest, RequestPasswordResetRequest,
    ResetPasswordRequest, SecretToken, TokenPurpose,
};
pub use verification_code::{CodeAttempt, CodePurpose, VerificationCode, MAX_CODE_ATTEMPTS};
