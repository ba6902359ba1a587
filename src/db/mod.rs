/// Database repositories for the identity core
pub mod accounts;
pub mod pillar_trackers;
pub mod secret_tokens;
pub mod verification_codes;
