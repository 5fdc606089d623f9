pub(crate) mod auth_smoke;
pub(crate) mod comparison;
pub(crate) mod measurement;
