pub mod ids;
pub(crate) mod logging;
