pub(crate) mod data;
pub(crate) mod helpers;
pub(crate) mod lts;
pub(crate) mod prove;
