pub mod ids;
pub mod layout;
pub mod record;
